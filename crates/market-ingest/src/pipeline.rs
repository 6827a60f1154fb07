use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use market_blob::{BlobStore, FilenameGenerator, GeneratedName};
use market_crypto::HashOracle;
use market_store::ItemStore;
use market_types::{ContentHash, HashStatus, Item, ItemId};
use tokio::time::timeout;

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::upload::{CreateRequest, Upload};

// ---------------------------------------------------------------------------
// Stage bookkeeping
// ---------------------------------------------------------------------------

/// Steps of the creation workflow, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Derive,
    Persist,
    Canonicalize,
    Hash,
    Reconcile,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Derive => "derive",
            Self::Persist => "persist",
            Self::Canonicalize => "canonicalize",
            Self::Hash => "hash",
            Self::Reconcile => "reconcile",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock time spent in one completed stage.
#[derive(Clone, Debug)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

struct StageClock {
    timings: Vec<StageTiming>,
    started: Instant,
}

impl StageClock {
    fn new() -> Self {
        Self {
            timings: Vec::with_capacity(6),
            started: Instant::now(),
        }
    }

    fn finish(&mut self, stage: Stage) {
        let now = Instant::now();
        self.timings.push(StageTiming {
            stage,
            elapsed: now.duration_since(self.started),
        });
        self.started = now;
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A successfully created and hash-stamped item.
#[derive(Clone, Debug)]
pub struct CreateOutcome {
    pub id: ItemId,
    /// Generated storage filename; `id` is its prefix.
    pub filename: String,
    pub picture: String,
    pub hash: ContentHash,
    /// Per-stage timings in execution order.
    pub stages: Vec<StageTiming>,
}

/// Result of recomputing a stored record's hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub id: ItemId,
    pub status: HashStatus,
    pub stored: Option<ContentHash>,
    pub computed: ContentHash,
}

impl VerifyReport {
    /// `true` when the stored hash matches the current canonical fields.
    /// A hash-pending record is never consistent.
    pub fn is_consistent(&self) -> bool {
        self.stored == Some(self.computed)
    }
}

// ---------------------------------------------------------------------------
// IngestPipeline
// ---------------------------------------------------------------------------

/// Orchestrates item creation across the blob store, record store, and hash
/// oracle.
///
/// The pipeline holds no per-request state; one instance serves all requests
/// concurrently.
pub struct IngestPipeline {
    items: Arc<dyn ItemStore>,
    blobs: Arc<dyn BlobStore>,
    oracle: Arc<dyn HashOracle>,
    names: FilenameGenerator,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(
        items: Arc<dyn ItemStore>,
        blobs: Arc<dyn BlobStore>,
        oracle: Arc<dyn HashOracle>,
        config: IngestConfig,
    ) -> Self {
        Self {
            items,
            blobs,
            oracle,
            names: FilenameGenerator::new(),
            config,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn items(&self) -> &Arc<dyn ItemStore> {
        &self.items
    }

    pub fn oracle(&self) -> &Arc<dyn HashOracle> {
        &self.oracle
    }

    /// Run the full creation workflow for one request.
    ///
    /// Blank required fields and upload-policy violations are reported
    /// before anything is written.
    /// Failures after the insert leave the record in the store without a
    /// hash; the returned error names it via
    /// [`IngestError::pending_item`].
    #[tracing::instrument(
        name = "create_item",
        skip_all,
        fields(file = %request.file.original_filename, id = tracing::field::Empty)
    )]
    pub async fn create_item(&self, request: CreateRequest) -> IngestResult<CreateOutcome> {
        let CreateRequest { file, fields } = request;
        if let Some(field) = fields.missing_field() {
            return Err(IngestError::InvalidForm(format!("`{field}` is required")));
        }
        let mut clock = StageClock::new();

        let name = self.upload(&file).await?;
        clock.finish(Stage::Upload);
        tracing::Span::current().record("id", tracing::field::display(&name.id));

        let picture = self.config.picture_url(&name.filename);
        let id = ItemId::from_filename(&name.filename)
            .map_err(|e| IngestError::UploadFailure(format!("generated filename: {e}")))?;
        debug_assert_eq!(id, name.id);
        clock.finish(Stage::Derive);

        let item = Item::new(id.clone(), picture.clone(), fields, Utc::now());
        if let Err(e) = self.items.insert(&item).await {
            tracing::warn!(error = %e, filename = %name.filename, "insert rejected; stored picture is orphaned");
            return Err(IngestError::PersistenceFailure {
                id: None,
                detail: e.to_string(),
            });
        }
        clock.finish(Stage::Persist);
        tracing::debug!("record inserted, hash pending");

        let hash = self.hash_and_reconcile(&id, &mut clock).await?;
        tracing::info!(hash = %hash, "item created");

        Ok(CreateOutcome {
            id,
            filename: name.filename,
            picture,
            hash,
            stages: clock.timings,
        })
    }

    /// Compute and store the hash of an existing record.
    ///
    /// Idempotent: a record that is already `Hashed` returns its stored hash
    /// without consulting the oracle.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub async fn repair(&self, id: &ItemId) -> IngestResult<ContentHash> {
        let item = self
            .items
            .get(id)
            .await
            .map_err(|e| IngestError::PersistenceFailure {
                id: Some(id.clone()),
                detail: e.to_string(),
            })?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))?;

        if let (HashStatus::Hashed, Some(hash)) = (item.hash_status, item.raw_data_hash) {
            return Ok(hash);
        }

        let mut clock = StageClock::new();
        let hash = self.hash_and_reconcile(id, &mut clock).await?;
        tracing::info!(hash = %hash, previous = %item.hash_status, "item repaired");
        Ok(hash)
    }

    /// Recompute a record's hash from its current fields and compare it with
    /// the stored one. Nothing is written.
    pub async fn verify(&self, id: &ItemId) -> IngestResult<VerifyReport> {
        let item = self
            .items
            .get(id)
            .await
            .map_err(|e| IngestError::PersistenceFailure {
                id: Some(id.clone()),
                detail: e.to_string(),
            })?
            .ok_or_else(|| IngestError::NotFound(id.to_string()))?;
        let computed = self.compute_hash(id, &item.canonical()).await?;
        Ok(VerifyReport {
            id: id.clone(),
            status: item.hash_status,
            stored: item.raw_data_hash,
            computed,
        })
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    async fn upload(&self, file: &Upload) -> IngestResult<GeneratedName> {
        self.config.policy.check_media_type(&file.media_type)?;
        self.config.policy.check_size(file.size())?;

        let name = self.names.generate(&file.original_filename);
        let put = self
            .blobs
            .put(&name.filename, &file.media_type, file.data.clone());
        let written = timeout(self.config.blob_timeout, put).await;
        match written {
            Ok(Ok(stored)) => {
                tracing::debug!(filename = %stored.filename, size = stored.size, "picture stored");
                Ok(name)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(IngestError::UploadFailure(format!(
                "blob store timed out after {} ms",
                self.config.blob_timeout.as_millis()
            ))),
        }
    }

    /// Canonicalize, hash, and reconcile. On failure the record is marked
    /// `Failed` when possible.
    async fn hash_and_reconcile(
        &self,
        id: &ItemId,
        clock: &mut StageClock,
    ) -> IngestResult<ContentHash> {
        let canonical = match self.items.get_canonical(id).await {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                return Err(IngestError::PersistenceFailure {
                    id: Some(id.clone()),
                    detail: "record missing on re-read".into(),
                })
            }
            Err(e) => {
                self.mark_failed(id).await;
                return Err(IngestError::PersistenceFailure {
                    id: Some(id.clone()),
                    detail: e.to_string(),
                });
            }
        };
        clock.finish(Stage::Canonicalize);

        let hash = match self.compute_hash(id, &canonical).await {
            Ok(hash) => hash,
            Err(e) => {
                self.mark_failed(id).await;
                return Err(e);
            }
        };
        clock.finish(Stage::Hash);

        if let Err(e) = self.items.set_hash(id, &hash).await {
            tracing::warn!(error = %e, "hash reconciliation rejected");
            self.mark_failed(id).await;
            return Err(IngestError::PersistenceFailure {
                id: Some(id.clone()),
                detail: e.to_string(),
            });
        }
        clock.finish(Stage::Reconcile);
        Ok(hash)
    }

    async fn compute_hash(
        &self,
        id: &ItemId,
        fields: &market_types::CanonicalFields,
    ) -> IngestResult<ContentHash> {
        match timeout(self.config.oracle_timeout, self.oracle.hash(fields)).await {
            Ok(Ok(hash)) => Ok(hash),
            Ok(Err(e)) => {
                tracing::warn!(oracle = self.oracle.name(), error = %e, "hash oracle failed");
                Err(IngestError::HashComputationFailure {
                    id: id.clone(),
                    detail: e.to_string(),
                })
            }
            Err(_) => {
                tracing::warn!(oracle = self.oracle.name(), "hash oracle timed out");
                Err(IngestError::HashComputationFailure {
                    id: id.clone(),
                    detail: format!(
                        "oracle timed out after {} ms",
                        self.config.oracle_timeout.as_millis()
                    ),
                })
            }
        }
    }

    async fn mark_failed(&self, id: &ItemId) {
        if let Err(e) = self.items.mark_hash_failed(id).await {
            tracing::warn!(error = %e, "could not mark record hash-failed; left pending");
        }
    }
}

impl fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("oracle", &self.oracle.name())
            .field("config", &self.config)
            .finish()
    }
}
