//! Video endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use super::dto::{Page, PaginationParams, SparkAdRequest, VideoListParams, parse_optional_platform, parse_platform};
use crate::AppState;
use crate::data::{Video, VideoListFilter, VideoSnapshot};
use crate::error::AppError;

/// GET /api/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<VideoListParams>,
) -> Result<Json<Page<Video>>, AppError> {
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve()?;

    if let (Some(from), Some(to)) = (params.date_from, params.date_to) {
        if from > to {
            return Err(AppError::Validation(
                "date_from must not be after date_to".to_string(),
            ));
        }
    }

    let filter = VideoListFilter {
        platform: parse_optional_platform(params.platform.as_deref())?,
        creator: params
            .creator
            .map(|c| c.trim().trim_start_matches('@').to_string())
            .filter(|c| !c.is_empty()),
        date_from: params.date_from,
        date_to: params.date_to,
        is_spark_ad: params.is_spark_ad,
    };

    let (videos, total) = state.db.list_videos(&filter, limit, offset).await?;
    Ok(Json(Page::new(videos, total, limit, offset)))
}

/// GET /api/videos/:platform/:id
pub async fn get_video(
    State(state): State<AppState>,
    Path((platform, id)): Path<(String, String)>,
) -> Result<Json<Video>, AppError> {
    let platform = parse_platform(&platform)?;
    let video = state
        .db
        .get_video(&id, platform)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(video))
}

/// PATCH /api/videos/:platform/:id/spark-ad
pub async fn set_spark_ad(
    State(state): State<AppState>,
    Path((platform, id)): Path<(String, String)>,
    Json(req): Json<SparkAdRequest>,
) -> Result<Json<Video>, AppError> {
    let platform = parse_platform(&platform)?;
    if !state
        .db
        .set_video_spark_ad(&id, platform, req.is_spark_ad)
        .await?
    {
        return Err(AppError::NotFound);
    }

    tracing::info!(video_id = %id, %platform, is_spark_ad = req.is_spark_ad, "Spark ad flag updated");
    let video = state
        .db
        .get_video(&id, platform)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(video))
}

/// GET /api/videos/:platform/:id/history
pub async fn video_history(
    State(state): State<AppState>,
    Path((platform, id)): Path<(String, String)>,
) -> Result<Json<Vec<VideoSnapshot>>, AppError> {
    let platform = parse_platform(&platform)?;
    let history = state.snapshots.history(&id, platform).await?;
    Ok(Json(history))
}
