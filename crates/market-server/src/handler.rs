use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use bytes::BytesMut;
use market_blob::UploadPolicy;
use market_ingest::{CreateRequest, IngestError, IngestPipeline, Upload};
use market_store::{ItemQuery, ItemStore};
use market_types::{CanonicalFields, ContentHash, HashStatus, Item, ItemId, ItemSummary, NewItem};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::TEXT_FIELDS_LIMIT;
use crate::error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestPipeline>) -> Self {
        Self { pipeline }
    }

    fn items(&self) -> &Arc<dyn ItemStore> {
        self.pipeline.items()
    }
}

/// `?_id=` parameter of the item and owner lookups.
#[derive(Debug, Deserialize)]
pub struct IdParam {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

impl IdParam {
    fn require(self) -> ApiResult<String> {
        self.id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::BadRequest("missing `_id` query parameter".into()))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParam {
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub id: ItemId,
    pub status: HashStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored: Option<ContentHash>,
    pub computed: ContentHash,
    pub consistent: bool,
}

/// Ids that cannot be parsed cannot exist either.
fn parse_id(raw: &str) -> ApiResult<ItemId> {
    ItemId::parse(raw).map_err(|_| ApiError::not_found(raw))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BodyTooLarge(e.body_text())
    } else {
        ApiError::invalid_form(e.body_text())
    }
}

fn text_fields_too_large() -> ApiError {
    ApiError::invalid_form(format!(
        "text fields exceed {} KiB",
        TEXT_FIELDS_LIMIT / 1024
    ))
}

/// Read a non-file field, charging its bytes to the form's text budget.
///
/// Running into the body limit here means the text itself overflowed; the
/// file part is bounded separately.
async fn drain(mut field: Field<'_>, budget: &mut usize) -> ApiResult<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| match multipart_error(e) {
        ApiError::BodyTooLarge(_) => text_fields_too_large(),
        other => other,
    })? {
        *budget = budget
            .checked_sub(chunk.len())
            .ok_or_else(text_fields_too_large)?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn text(field: Field<'_>, budget: &mut usize) -> ApiResult<String> {
    let raw = drain(field, budget).await?;
    String::from_utf8(raw).map_err(|_| ApiError::invalid_form("text field is not valid UTF-8"))
}

/// Read the picture part, enforcing the upload policy as it streams in.
async fn picture(mut field: Field<'_>, policy: &UploadPolicy) -> ApiResult<Upload> {
    let filename = field.file_name().unwrap_or_default().to_owned();
    let media_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_owned();
    policy.check_media_type(&media_type).map_err(IngestError::from)?;

    let mut data = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        data.extend_from_slice(&chunk);
        policy
            .check_size(data.len() as u64)
            .map_err(IngestError::from)?;
    }
    Ok(Upload::new(filename, media_type, data.freeze()))
}

/// Split a multipart form into the picture and the item fields.
///
/// Exactly one `file` part is accepted; text fields share a budget of
/// [`TEXT_FIELDS_LIMIT`] bytes.
async fn read_form(mut multipart: Multipart, policy: &UploadPolicy) -> ApiResult<CreateRequest> {
    let mut file = None;
    let mut fields = NewItem::default();
    let mut budget = TEXT_FIELDS_LIMIT;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(ApiError::invalid_form("more than one `file` part"));
                }
                file = Some(picture(field, policy).await?);
            }
            "name" => fields.name = text(field, &mut budget).await?,
            "description" => fields.description = text(field, &mut budget).await?,
            "specifications" => fields.specifications = text(field, &mut budget).await?,
            "externalLink" => fields.external_link = text(field, &mut budget).await?,
            "owner" => fields.owner = text(field, &mut budget).await?,
            "price" => {
                let raw = text(field, &mut budget).await?;
                fields.price = raw.trim().parse().map_err(|_| {
                    ApiError::invalid_form(format!("price must be a non-negative integer, got {raw:?}"))
                })?;
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown form field");
                drain(field, &mut budget).await?;
            }
        }
    }

    let file = file.ok_or_else(|| ApiError::invalid_form("missing `file` part"))?;
    Ok(CreateRequest { file, fields })
}

/// `POST /items`: create an item from a multipart form; responds with the
/// content hash.
pub async fn create_item(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<String>)> {
    let request = read_form(multipart, &state.pipeline.config().policy).await?;
    let outcome = state.pipeline.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(outcome.hash.to_string())))
}

/// `GET /items/raw/:id`
pub async fn get_raw_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CanonicalFields>> {
    let id = parse_id(&id)?;
    let fields = state
        .items()
        .get_canonical(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(id.as_str()))?;
    Ok(Json(fields))
}

/// `GET /items/item?_id=`
pub async fn get_item(
    State(state): State<AppState>,
    Query(param): Query<IdParam>,
) -> ApiResult<Json<Item>> {
    let raw = param.require()?;
    let id = parse_id(&raw)?;
    let item = state
        .items()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(raw))?;
    Ok(Json(item))
}

/// `GET /items`
pub async fn list_items(State(state): State<AppState>) -> ApiResult<Json<Vec<ItemSummary>>> {
    Ok(Json(state.items().find_summaries(&ItemQuery::listed()).await?))
}

/// `GET /items/mine?_id=`
pub async fn my_items(
    State(state): State<AppState>,
    Query(param): Query<IdParam>,
) -> ApiResult<Json<Vec<ItemSummary>>> {
    let owner = param.require()?;
    let query = ItemQuery::owned_by(owner);
    Ok(Json(state.items().find_summaries(&query).await?))
}

/// `GET /items/search?keywords=`
pub async fn search_items(
    State(state): State<AppState>,
    Query(param): Query<SearchParam>,
) -> ApiResult<Json<Vec<Item>>> {
    let query = ItemQuery::search(param.keywords.trim());
    Ok(Json(state.items().find(&query).await?))
}

/// `POST /items/repair/:id`
pub async fn repair_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<String>> {
    let id = parse_id(&id)?;
    let hash = state.pipeline.repair(&id).await?;
    Ok(Json(hash.to_string()))
}

/// `GET /items/verify/:id`
pub async fn verify_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VerifyResponse>> {
    let id = parse_id(&id)?;
    let report = state.pipeline.verify(&id).await?;
    let consistent = report.is_consistent();
    Ok(Json(VerifyResponse {
        id: report.id,
        status: report.status,
        stored: report.stored,
        computed: report.computed,
        consistent,
    }))
}

/// Health check handler.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "hashAlgorithm": state.pipeline.oracle().name(),
    }))
}
