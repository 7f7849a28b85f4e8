use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::engagement::EngagementService;
use crate::app::feed::FeedService;
use crate::app::posts::PostService;
use crate::app::profiles::ProfileService;
use crate::app::ratings::RatingService;
use crate::domain::engagement::Comment;
use crate::domain::post::{FeedItem, Post, PostDetail, PostFilter, PostKind};
use crate::domain::rating::{Aggregate, Rating};
use crate::domain::user::Profile;
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.stores.health.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, "store health check failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

fn parse_kind(kind: Option<String>) -> Result<Option<PostKind>, AppError> {
    match kind.as_deref() {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => PostKind::from_db(value)
            .map(Some)
            .ok_or_else(|| AppError::bad_request("kind must be roast or vote")),
    }
}

#[derive(Deserialize)]
pub struct ListPostsQuery {
    pub kind: Option<String>,
    pub owner_id: Option<Uuid>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<ListResponse<FeedItem>>, AppError> {
    let filter = PostFilter {
        kind: parse_kind(query.kind)?,
        owner_id: query.owner_id,
    };

    let service = FeedService::new(state.stores.clone());
    let items = service.list_posts(&filter).await?;

    Ok(Json(ListResponse { items }))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("upload exceeds max size")
    } else {
        AppError::bad_request("invalid multipart body")
    }
}

/// Multipart fields: `image` (file), `kind` (`roast` | `vote`), `caption`.
pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Post>, AppError> {
    let mut image: Option<Bytes> = None;
    let mut caption: Option<String> = None;
    let mut kind: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => image = Some(field.bytes().await.map_err(multipart_error)?),
            "caption" => caption = Some(field.text().await.map_err(multipart_error)?),
            "kind" => kind = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::bad_request("image is required"))?;
    let kind = parse_kind(kind)?.ok_or_else(|| AppError::bad_request("kind is required"))?;

    let service = PostService::new(state.stores.clone(), state.upload_max_bytes);
    let post = service
        .create_post(&auth.session(), image, caption, kind)
        .await?;

    Ok(Json(post))
}

pub async fn get_post(
    Path(id): Path<Uuid>,
    auth: Option<AuthUser>,
    State(state): State<AppState>,
) -> Result<Json<PostDetail>, AppError> {
    let viewer_id = auth.map(|user| user.user_id);
    let service = PostService::new(state.stores.clone(), state.upload_max_bytes);
    let post = service.get_post(id, viewer_id).await?;

    Ok(Json(post))
}

#[derive(Deserialize)]
pub struct RatingRequest {
    /// Wider than the stored score so out-of-range integers reach validation.
    pub score: i64,
    /// Accepted for client compatibility; must match the token's user.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct RatingResponse {
    pub rating: Rating,
    pub aggregate: Aggregate,
}

pub async fn submit_rating(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Json<RatingResponse>, AppError> {
    let Json(payload) = payload?;
    let service = RatingService::new(state.stores.clone());
    let rating = service
        .submit_rating(&auth.session(), id, payload.score, payload.user_id)
        .await?;
    let aggregate = service.aggregate_for_post(id).await?;

    Ok(Json(RatingResponse { rating, aggregate }))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

pub async fn comment_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let Json(payload) = payload?;
    let service = EngagementService::new(state.stores.clone());
    let comment = service
        .comment_post(&auth.session(), id, payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_post_comments(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<Comment>>, AppError> {
    let service = EngagementService::new(state.stores.clone());
    let items = service.list_comments(id).await?;

    Ok(Json(ListResponse { items }))
}

#[derive(Deserialize)]
pub struct UpsertProfileRequest {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

pub async fn upsert_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<UpsertProfileRequest>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let Json(payload) = payload?;
    let service = ProfileService::new(state.stores.clone());
    let profile = service
        .upsert_profile(&auth.session(), payload.display_name, payload.avatar_url)
        .await?;

    Ok(Json(profile))
}

pub async fn get_user(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    let service = ProfileService::new(state.stores.clone());
    let profile = service.get_profile(id).await?;

    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct UserPostsQuery {
    pub kind: Option<String>,
}

pub async fn list_user_posts(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Query(query): Query<UserPostsQuery>,
) -> Result<Json<ListResponse<FeedItem>>, AppError> {
    let filter = PostFilter {
        kind: parse_kind(query.kind)?,
        owner_id: Some(id),
    };

    ProfileService::new(state.stores.clone())
        .get_profile(id)
        .await?;
    let items = FeedService::new(state.stores.clone())
        .list_posts(&filter)
        .await?;

    Ok(Json(ListResponse { items }))
}
