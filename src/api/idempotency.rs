//! Replay protection for the mutating ledger endpoints.
//!
//! Clients send an `Idempotency-Key` UUID with every POST. The first 2xx
//! response is remembered together with a fingerprint of the request; a retry
//! with the same key and the same request gets the stored response back, while
//! reusing the key for a different request is a conflict.

use axum::{
    body::{Body, to_bytes},
    extract::{OriginalUri, Request, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::api::models::ApiError;
use crate::core::errors::LedgerError;
use crate::core::validation;
use crate::infrastructure::cache::{IdempotencyRecord, fingerprint};

pub const IDEMPOTENCY_KEY: HeaderName = HeaderName::from_static("idempotency-key");
pub const IDEMPOTENT_REPLAYED: HeaderName = HeaderName::from_static("idempotent-replayed");

const MAX_BODY_BYTES: usize = 1024 * 1024;

fn replay(record: IdempotencyRecord) -> Response {
    let status = StatusCode::from_u16(record.status).unwrap_or(StatusCode::OK);
    let mut response = (status, Body::from(record.body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(IDEMPOTENT_REPLAYED, HeaderValue::from_static("true"));
    response
}

pub async fn idempotency_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = request
        .headers()
        .get(&IDEMPOTENCY_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            LedgerError::invalid(
                "Idempotency-Key",
                "Missing Idempotency Key",
                "Idempotency-Key header is required",
            )
        })?;
    validation::validate_id("Idempotency-Key", &key)?;

    // expired records are only a memory concern, never a reason to fail the request
    if let Err(e) = state.idempotency.purge_expired().await {
        warn!("Failed to purge expired idempotency records: {}", e);
    }

    let (parts, body) = request.into_parts();
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| parts.uri.clone());
    let path = uri.path();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| LedgerError::invalid("body", "Invalid Body", format!("Could not read request body: {}", e)))?;
    let request_fingerprint = fingerprint(parts.method.as_str(), path, uri.query(), &bytes);

    if let Some(record) = state.idempotency.get(&key).await? {
        if record.fingerprint == request_fingerprint {
            info!("Replaying stored response for idempotency key {}", key);
            return Ok(replay(record));
        }
        warn!("Idempotency key {} reused for a different request to {}", key, path);
        return Err(LedgerError::IdempotencyKeyReused(key).into());
    }

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;
    if !response.status().is_success() {
        debug!("Not storing {} response for idempotency key {}", response.status(), key);
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let body = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| LedgerError::StorageError(format!("Could not buffer response body: {}", e)))?;
    let record = IdempotencyRecord {
        fingerprint: request_fingerprint,
        status: parts.status.as_u16(),
        body: body.to_vec(),
    };
    if let Err(e) = state.idempotency.save(&key, record, state.idempotency_ttl).await {
        warn!("Failed to store response for idempotency key {}: {}", key, e);
    }
    Ok(Response::from_parts(parts, Body::from(body)))
}
