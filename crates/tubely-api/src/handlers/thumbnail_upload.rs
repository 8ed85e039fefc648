use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use tubely_core::constants::THUMBNAIL_FORM_FIELD;
use tubely_core::{AppError, Video};
use tubely_storage::sign_video;

use super::parse_video_id;
use crate::auth::AuthUser;
use crate::error::{multipart_error, ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = uuid::Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = Video),
        (status = 400, description = "Invalid ID, body or file type", body = ErrorResponse),
        (status = 401, description = "Missing token or not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.user_id, video_id = %video_id))]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let video_id = parse_video_id(&video_id)?;
    state.uploads.authorize(user.user_id, video_id).await?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(THUMBNAIL_FORM_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = Box::pin(field.map_err(multipart_error));
        let url = state.thumbnails.save(&content_type, body).await?;

        let video = state.videos.set_thumbnail_url(video_id, &url).await?;

        let video = sign_video(state.storage.as_ref(), video, state.config.presign_expiry).await?;
        return Ok(Json(video));
    }

    Err(AppError::BadRequest(format!("Missing multipart field {:?}", THUMBNAIL_FORM_FIELD)).into())
}
