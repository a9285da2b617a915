//! Record routes - the read/write/delete/count contract

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use memberd_core::RwService;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /memberships/{uuid}
pub async fn read_record<S: RwService>(
    State(state): State<AppState<S>>,
    Path(uuid): Path<String>,
) -> ApiResult<Json<S::Record>> {
    let record = state
        .service()
        .read(&uuid)
        .await?
        .ok_or(ApiError::NotFound { uuid })?;
    Ok(Json(record))
}

/// PUT /memberships/{uuid}
///
/// The body is decoded by the service itself so the host stays agnostic
/// about the record shape; the only host-side rule is that the payload
/// uuid must match the path.
pub async fn write_record<S: RwService>(
    State(state): State<AppState<S>>,
    Path(uuid): Path<String>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let (record, body_uuid) = state.service().decode(&body)?;
    if body_uuid != uuid {
        return Err(ApiError::UuidMismatch {
            path: uuid,
            body: body_uuid,
        });
    }
    state.service().write(record).await?;
    info!(%uuid, "record written");
    Ok(StatusCode::OK)
}

/// DELETE /memberships/{uuid}
pub async fn delete_record<S: RwService>(
    State(state): State<AppState<S>>,
    Path(uuid): Path<String>,
) -> ApiResult<StatusCode> {
    if state.service().delete(&uuid).await? {
        info!(%uuid, "record deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound { uuid })
    }
}

/// GET /memberships/__count
pub async fn count_records<S: RwService>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<u64>> {
    Ok(Json(state.service().count().await?))
}
