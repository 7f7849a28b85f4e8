//! Collaborator seams. Services receive these handles explicitly so the
//! PostgreSQL backend and the in-memory backend are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::app::error::ServiceResult;
use crate::domain::engagement::Comment;
use crate::domain::post::{NewPost, Post, PostFilter};
use crate::domain::rating::Rating;
use crate::domain::user::Profile;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Fails with `NotFound` when the owner has no profile.
    async fn insert_post(&self, post: NewPost) -> ServiceResult<Post>;

    async fn get_post(&self, post_id: Uuid) -> ServiceResult<Option<Post>>;

    /// Matching posts, newest first (`created_at DESC, id DESC`).
    async fn list_posts(&self, filter: &PostFilter) -> ServiceResult<Vec<Post>>;
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Insert or overwrite the rating for `(post_id, rater_id)` as one atomic
    /// write. Exactly one row exists for the pair afterwards.
    ///
    /// Fails with `Validation` for an out-of-range score or a non-vote post,
    /// and `NotFound` when the post or the rater's profile is missing.
    async fn put(&self, post_id: Uuid, rater_id: Uuid, score: i32) -> ServiceResult<Rating>;

    /// Ratings for one post in no particular order. Fails with `NotFound`
    /// when the post is missing; an existing post without ratings is empty.
    async fn list_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<Rating>>;

    /// Ratings for several posts at once, in no particular order. Unknown
    /// ids contribute nothing.
    async fn list_for_posts(&self, post_ids: &[Uuid]) -> ServiceResult<Vec<Rating>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Fails with `NotFound` when the post is missing.
    async fn insert_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> ServiceResult<Comment>;

    /// Comments for one post, oldest first.
    async fn list_comments(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert_profile(
        &self,
        user_id: Uuid,
        display_name: String,
        avatar_url: Option<String>,
    ) -> ServiceResult<Profile>;

    async fn get_profile(&self, user_id: Uuid) -> ServiceResult<Option<Profile>>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the blob under `key` and return its public URI.
    async fn put_image(&self, key: &str, content_type: &str, bytes: Bytes)
        -> ServiceResult<String>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> ServiceResult<()>;
}

/// Handles to every backing collaborator, cheap to clone.
#[derive(Clone)]
pub struct Stores {
    pub posts: Arc<dyn PostStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub comments: Arc<dyn CommentStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub images: Arc<dyn ImageStore>,
    pub health: Arc<dyn StoreHealth>,
}
