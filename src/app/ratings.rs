use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::app::aggregate::aggregate;
use crate::app::auth::AuthSession;
use crate::app::error::{ServiceError, ServiceResult};
use crate::app::store::{PostStore, RatingStore, Stores};
use crate::domain::rating::{Aggregate, Rating, MAX_SCORE, MIN_SCORE};

pub fn validate_score(score: i32) -> ServiceResult<()> {
    parse_score(i64::from(score)).map(|_| ())
}

/// Narrow a client-supplied score to the stored width, rejecting anything
/// outside `MIN_SCORE..=MAX_SCORE`.
pub fn parse_score(score: i64) -> ServiceResult<i32> {
    i32::try_from(score)
        .ok()
        .filter(|score| (MIN_SCORE..=MAX_SCORE).contains(score))
        .ok_or_else(|| {
            ServiceError::validation(format!(
                "score must be between {} and {}",
                MIN_SCORE, MAX_SCORE
            ))
        })
}

/// The only write path for ratings.
#[derive(Clone)]
pub struct RatingService {
    posts: Arc<dyn PostStore>,
    ratings: Arc<dyn RatingStore>,
}

impl RatingService {
    pub fn new(stores: Stores) -> Self {
        Self {
            posts: stores.posts,
            ratings: stores.ratings,
        }
    }

    /// Record the caller's score for a vote post, replacing any earlier one.
    ///
    /// The rater is always the session user. A rater id supplied by the
    /// client is only checked against the session, never used.
    pub async fn submit_rating(
        &self,
        session: &AuthSession,
        post_id: Uuid,
        score: i64,
        claimed_rater: Option<Uuid>,
    ) -> ServiceResult<Rating> {
        if let Some(claimed) = claimed_rater {
            if claimed != session.user_id {
                return Err(ServiceError::authorization(
                    "cannot rate on behalf of another user",
                ));
            }
        }
        let score = parse_score(score)?;

        let rating = self.ratings.put(post_id, session.user_id, score).await?;
        info!(post_id = %post_id, user_id = %session.user_id, score, "rating stored");

        Ok(rating)
    }

    /// Current aggregate for a vote post.
    pub async fn aggregate_for_post(&self, post_id: Uuid) -> ServiceResult<Aggregate> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("post not found"))?;
        if !post.kind.is_rated() {
            return Err(ServiceError::validation("post does not accept ratings"));
        }

        let ratings = self.ratings.list_for_post(post_id).await?;
        Ok(aggregate(&ratings))
    }
}
