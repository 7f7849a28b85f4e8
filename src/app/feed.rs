use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::app::aggregate::aggregate;
use crate::app::error::ServiceResult;
use crate::app::store::{PostStore, RatingStore, Stores};
use crate::domain::post::{FeedItem, Post, PostFilter};
use crate::domain::rating::Rating;

/// Joins posts with their rating aggregate at read time. Nothing is cached,
/// so the numbers always reflect the store.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostStore>,
    ratings: Arc<dyn RatingStore>,
}

impl FeedService {
    pub fn new(stores: Stores) -> Self {
        Self {
            posts: stores.posts,
            ratings: stores.ratings,
        }
    }

    pub async fn list_posts(&self, filter: &PostFilter) -> ServiceResult<Vec<FeedItem>> {
        let posts = self.posts.list_posts(filter).await?;

        let rated: Vec<Uuid> = posts
            .iter()
            .filter(|post| post.kind.is_rated())
            .map(|post| post.id)
            .collect();
        let ratings = if rated.is_empty() {
            Vec::new()
        } else {
            self.ratings.list_for_posts(&rated).await?
        };

        debug!(
            posts = posts.len(),
            ratings = ratings.len(),
            kind = ?filter.kind,
            owner_id = ?filter.owner_id,
            "assembled feed"
        );
        Ok(join_aggregates(posts, ratings))
    }
}

/// Attach an aggregate to every vote post, keeping the input order.
/// Roast posts never carry one.
pub fn join_aggregates(posts: Vec<Post>, ratings: Vec<Rating>) -> Vec<FeedItem> {
    let mut by_post: HashMap<Uuid, Vec<Rating>> = HashMap::new();
    for rating in ratings {
        by_post.entry(rating.post_id).or_default().push(rating);
    }

    posts
        .into_iter()
        .map(|post| {
            let aggregate = if post.kind.is_rated() {
                let ratings = by_post.remove(&post.id).unwrap_or_default();
                Some(aggregate(&ratings))
            } else {
                None
            };
            FeedItem { post, aggregate }
        })
        .collect()
}
