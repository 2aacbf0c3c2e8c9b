//! Account endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use super::dto::{
    AccountListParams, CreateAccountRequest, CreatorParams, PaginationParams, parse_optional_platform,
    parse_platform,
};
use crate::AppState;
use crate::data::{Account, Creator, Video};
use crate::error::AppError;

/// GET /api/accounts
///
/// Active accounts only, highest total views first.
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(params): Query<AccountListParams>,
) -> Result<Json<Vec<Account>>, AppError> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve()?;
    let platform = parse_optional_platform(params.platform.as_deref())?;
    let collection_id = params
        .collection_id
        .as_deref()
        .filter(|id| !id.trim().is_empty());

    let accounts = state
        .accounts
        .list(platform, collection_id, limit, offset)
        .await?;
    Ok(Json(accounts))
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let platform = parse_platform(&req.platform)?;
    let account = state
        .accounts
        .create(&req.username, platform, req.nickname, req.profile_url)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /api/accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Account>, AppError> {
    Ok(Json(state.accounts.get(&id).await?))
}

/// DELETE /api/accounts/:id
///
/// Soft delete: the account stops being tracked, its videos stay.
pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.accounts.deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/accounts/:id/videos
pub async fn account_videos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<Video>>, AppError> {
    let (limit, offset) = params.resolve()?;
    Ok(Json(state.accounts.videos(&id, limit, offset).await?))
}

/// POST /api/accounts/:id/refresh
pub async fn refresh_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Account>, AppError> {
    Ok(Json(state.accounts.refresh(&id).await?))
}

/// GET /api/creators
pub async fn list_creators(
    State(state): State<AppState>,
    Query(params): Query<CreatorParams>,
) -> Result<Json<Vec<Creator>>, AppError> {
    let platform = parse_optional_platform(params.platform.as_deref())?;
    Ok(Json(state.accounts.creators(platform).await?))
}
