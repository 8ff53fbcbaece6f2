use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use bytes::Bytes;
use frag_model::FragmentRecord;
use frag_types::FragmentId;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::Identity;
use crate::error::{ServerError, ServerResult};
use crate::response::success;
use crate::state::AppState;

/// Unauthenticated health check.
pub async fn health_handler() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "repository": env!("CARGO_PKG_REPOSITORY"),
        })),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub expand: Option<String>,
}

impl ListParams {
    fn expand(&self) -> bool {
        matches!(self.expand.as_deref(), Some("1") | Some("true"))
    }
}

pub async fn list_fragments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
) -> ServerResult<Json<Value>> {
    let fragments = state
        .service
        .list_by_owner(&identity.owner(), params.expand())
        .await?;
    Ok(success(json!({ "fragments": fragments })))
}

pub async fn create_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Response> {
    let content_type = content_type(&headers)?;
    if !FragmentRecord::is_supported_type(content_type) {
        return Err(ServerError::UnsupportedMediaType(format!(
            "unsupported fragment type: {content_type}"
        )));
    }
    if body.is_empty() {
        return Err(ServerError::BadRequest("fragment data must not be empty".into()));
    }

    let owner = identity.owner();
    let mut record = state.service.create(&owner, content_type).await?;
    state.service.set_data(&mut record, body).await?;
    info!(owner = %owner, id = %record.id, size = record.size, "fragment stored");

    let location = state.fragment_url(record.id.as_str());
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        success(json!({ "fragment": record })),
    )
        .into_response())
}

/// Raw data for `:id`, or converted data for `:id.ext`.
pub async fn get_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(raw): Path<String>,
) -> ServerResult<Response> {
    let (id, extension) = match raw.split_once('.') {
        Some((id, ext)) => (id, Some(ext)),
        None => (raw.as_str(), None),
    };
    let id = parse_id(id)?;
    let (_, converted) = state
        .service
        .get_converted(&identity.owner(), &id, extension)
        .await?;
    Ok((
        [(header::CONTENT_TYPE, converted.media_type)],
        converted.data,
    )
        .into_response())
}

pub async fn get_fragment_info(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let id = parse_id(&id)?;
    let record = state
        .service
        .get_by_id(&identity.owner(), &id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(success(json!({ "fragment": record })))
}

pub async fn update_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<Value>> {
    let id = parse_id(&id)?;
    let content_type = content_type(&headers)?;
    let record = state
        .service
        .replace_data(&identity.owner(), &id, content_type, body)
        .await?;
    Ok(success(json!({ "fragment": record })))
}

pub async fn delete_fragment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.service.delete(&identity.owner(), &id).await?;
    Ok(success(json!({})))
}

fn content_type(headers: &HeaderMap) -> ServerResult<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ServerError::UnsupportedMediaType("missing Content-Type".into()))
}

/// Ids that cannot have been issued are reported as unknown.
fn parse_id(raw: &str) -> ServerResult<FragmentId> {
    FragmentId::parse(raw).map_err(|_| ServerError::NotFound(format!("fragment not found: {raw}")))
}

fn not_found(id: &FragmentId) -> ServerError {
    ServerError::NotFound(format!("fragment not found: {id}"))
}
