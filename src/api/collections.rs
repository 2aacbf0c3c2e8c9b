//! Collection endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use super::dto::{CollectionRequest, PaginationParams, parse_platform};
use crate::AppState;
use crate::data::{Account, CollectionSummary, Video};
use crate::error::AppError;
use crate::service::CollectionInput;

impl From<CollectionRequest> for CollectionInput {
    fn from(req: CollectionRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            color: req.color,
            icon: req.icon,
        }
    }
}

/// GET /api/collections
pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionSummary>>, AppError> {
    Ok(Json(state.collections.list().await?))
}

/// POST /api/collections
pub async fn create_collection(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Result<(StatusCode, Json<CollectionSummary>), AppError> {
    let collection = state.collections.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

/// GET /api/collections/:id
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CollectionSummary>, AppError> {
    Ok(Json(state.collections.get(&id).await?))
}

/// PUT /api/collections/:id
pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CollectionRequest>,
) -> Result<Json<CollectionSummary>, AppError> {
    Ok(Json(state.collections.update(&id, req.into()).await?))
}

/// DELETE /api/collections/:id
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.collections.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/collections/:id/videos
pub async fn collection_videos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<Video>>, AppError> {
    let (limit, offset) = params.resolve()?;
    Ok(Json(state.collections.videos(&id, limit, offset).await?))
}

/// POST /api/collections/:id/videos/:platform/:video_id
pub async fn add_video(
    State(state): State<AppState>,
    Path((id, platform, video_id)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let platform = parse_platform(&platform)?;
    state.collections.add_video(&id, &video_id, platform).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/collections/:id/videos/:platform/:video_id
pub async fn remove_video(
    State(state): State<AppState>,
    Path((id, platform, video_id)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let platform = parse_platform(&platform)?;
    state
        .collections
        .remove_video(&id, &video_id, platform)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/collections/:id/accounts
pub async fn collection_accounts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Account>>, AppError> {
    Ok(Json(state.collections.accounts(&id).await?))
}

/// POST /api/collections/:id/accounts/:account_id
pub async fn add_account(
    State(state): State<AppState>,
    Path((id, account_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state.collections.add_account(&id, &account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/collections/:id/accounts/:account_id
pub async fn remove_account(
    State(state): State<AppState>,
    Path((id, account_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state.collections.remove_account(&id, &account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
