use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use market_types::id::V1_RANDOM_BOUND;
use market_types::ItemId;
use rand::Rng;

/// Longest sanitized original filename kept in the generated name.
pub const MAX_ORIGINAL_LEN: usize = 128;

/// A generated storage filename and the item id it encodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedName {
    pub id: ItemId,
    /// `{id}{sanitized original filename}`
    pub filename: String,
}

/// Mints collision-resistant filenames for uploads.
///
/// The time component advances strictly: two names minted within the same
/// millisecond get consecutive timestamps. The random and nonce components
/// are drawn fresh for every name. Uniqueness is not re-checked against the
/// store.
#[derive(Debug, Default)]
pub struct FilenameGenerator {
    last_ms: AtomicU64,
}

impl FilenameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a name for an upload whose client-side filename was `original`.
    pub fn generate(&self, original: &str) -> GeneratedName {
        let ms = self.next_ms();
        let mut rng = rand::thread_rng();
        let random = rng.gen_range(0..V1_RANDOM_BOUND);
        let nonce: u64 = rng.gen();
        let id = ItemId::v1(ms, random, nonce);
        let filename = format!("{id}{}", sanitize(original));
        GeneratedName { id, filename }
    }

    fn next_ms(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let mut last = self.last_ms.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last_ms
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Reduce a client-supplied filename to a safe storage suffix.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._-]`
/// become `_`, runs of dots collapse to one, leading dots are stripped, and
/// the tail is capped at [`MAX_ORIGINAL_LEN`] characters. An empty result
/// becomes `upload`.
pub fn sanitize(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut collapsed = cleaned;
    while collapsed.contains("..") {
        collapsed = collapsed.replace("..", ".");
    }
    let trimmed = collapsed.trim_start_matches('.');
    let capped: String = trimmed
        .chars()
        .rev()
        .take(MAX_ORIGINAL_LEN)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if capped.is_empty() {
        "upload".to_string()
    } else {
        capped
    }
}
