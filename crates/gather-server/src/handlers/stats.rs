//! Handler for `GET /api/stat`.

use axum::{Json, extract::State};
use gather_core::store::{GatherStore, Stats};

use crate::{AppState, error::ApiError, photos::PhotoStorage};

/// `GET /stat`
pub async fn handler<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<Stats>, ApiError> {
  let stats = state.store.stats().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}
