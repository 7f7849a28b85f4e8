use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::app::auth::AuthSession;
use crate::app::error::{ServiceError, ServiceResult};
use crate::app::store::{CommentStore, PostStore, Stores};
use crate::domain::engagement::Comment;

pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Clone)]
pub struct EngagementService {
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
}

impl EngagementService {
    pub fn new(stores: Stores) -> Self {
        Self {
            posts: stores.posts,
            comments: stores.comments,
        }
    }

    /// Append a comment. Comments are never edited afterwards.
    pub async fn comment_post(
        &self,
        session: &AuthSession,
        post_id: Uuid,
        body: String,
    ) -> ServiceResult<Comment> {
        let body = body.trim().to_string();
        if body.is_empty() {
            return Err(ServiceError::validation("comment body cannot be empty"));
        }
        if body.chars().count() > MAX_COMMENT_LEN {
            return Err(ServiceError::validation(format!(
                "comment body exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let comment = self
            .comments
            .insert_comment(post_id, session.user_id, body)
            .await?;
        debug!(comment_id = %comment.id, post_id = %post_id, "comment added");
        Ok(comment)
    }

    pub async fn list_comments(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        if self.posts.get_post(post_id).await?.is_none() {
            return Err(ServiceError::not_found("post not found"));
        }
        self.comments.list_comments(post_id).await
    }
}
