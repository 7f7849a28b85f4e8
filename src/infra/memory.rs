use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::app::ratings::validate_score;
use crate::app::store::{
    CommentStore, ImageStore, PostStore, ProfileStore, RatingStore, StoreHealth, Stores,
};
use crate::domain::engagement::Comment;
use crate::domain::post::{NewPost, Post, PostFilter};
use crate::domain::rating::Rating;
use crate::domain::user::Profile;

pub fn stores() -> Stores {
    stores_with_images().0
}

/// Like [`stores`], also returning the image handle so uploads can be read
/// back.
pub fn stores_with_images() -> (Stores, MemoryImages) {
    let store = Arc::new(MemoryStore::default());
    let images = MemoryImages::default();
    let stores = Stores {
        posts: store.clone(),
        ratings: store.clone(),
        comments: store.clone(),
        profiles: store.clone(),
        images: Arc::new(images.clone()),
        health: store,
    };
    (stores, images)
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    posts: HashMap<Uuid, Post>,
    ratings: HashMap<(Uuid, Uuid), Rating>,
    comments: Vec<Comment>,
    last_timestamp: Option<OffsetDateTime>,
}

impl Tables {
    /// Strictly increasing, so creation order is never ambiguous.
    fn next_timestamp(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

/// Process-local store for development and tests. Every write holds the one
/// lock for its whole check-and-write, which gives the same per-pair
/// atomicity as the database's upsert.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> ServiceResult<Post> {
        let mut tables = self.tables.write().await;
        if !tables.profiles.contains_key(&post.owner_id) {
            return Err(ServiceError::not_found("profile not found"));
        }

        let created_at = tables.next_timestamp();
        let post = Post {
            id: Uuid::new_v4(),
            owner_id: post.owner_id,
            image_url: post.image_url,
            caption: post.caption,
            kind: post.kind,
            created_at,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, post_id: Uuid) -> ServiceResult<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter) -> ServiceResult<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(posts)
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn put(&self, post_id: Uuid, rater_id: Uuid, score: i32) -> ServiceResult<Rating> {
        validate_score(score)?;

        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .get(&post_id)
            .ok_or_else(|| ServiceError::not_found("post not found"))?;
        if !post.kind.is_rated() {
            return Err(ServiceError::validation("post does not accept ratings"));
        }
        if !tables.profiles.contains_key(&rater_id) {
            return Err(ServiceError::not_found("profile not found"));
        }

        let now = tables.next_timestamp();
        let rating = tables
            .ratings
            .entry((post_id, rater_id))
            .and_modify(|rating| {
                rating.score = score;
                rating.updated_at = now;
            })
            .or_insert_with(|| Rating {
                id: Uuid::new_v4(),
                post_id,
                user_id: rater_id,
                score,
                created_at: now,
                updated_at: now,
            });
        Ok(rating.clone())
    }

    async fn list_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<Rating>> {
        let tables = self.tables.read().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(ServiceError::not_found("post not found"));
        }
        Ok(tables
            .ratings
            .values()
            .filter(|rating| rating.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn list_for_posts(&self, post_ids: &[Uuid]) -> ServiceResult<Vec<Rating>> {
        let tables = self.tables.read().await;
        Ok(tables
            .ratings
            .values()
            .filter(|rating| post_ids.contains(&rating.post_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> ServiceResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(ServiceError::not_found("post not found"));
        }
        if !tables.profiles.contains_key(&user_id) {
            return Err(ServiceError::not_found("profile not found"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            user_id,
            post_id,
            body,
            created_at: tables.next_timestamp(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        // Append order is creation order.
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn upsert_profile(
        &self,
        user_id: Uuid,
        display_name: String,
        avatar_url: Option<String>,
    ) -> ServiceResult<Profile> {
        let mut tables = self.tables.write().await;
        let created_at = tables.next_timestamp();
        let profile = match tables.profiles.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let profile = entry.get_mut();
                profile.display_name = display_name;
                profile.avatar_url = avatar_url;
                profile.clone()
            }
            Entry::Vacant(entry) => entry
                .insert(Profile {
                    id: user_id,
                    display_name,
                    avatar_url,
                    created_at,
                })
                .clone(),
        };
        Ok(profile)
    }

    async fn get_profile(&self, user_id: Uuid) -> ServiceResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }
}

/// Keeps uploaded images in memory and hands out `memory://` URIs.
#[derive(Clone, Default)]
pub struct MemoryImages {
    objects: Arc<RwLock<HashMap<String, (String, Bytes)>>>,
}

impl MemoryImages {
    /// Content type and bytes stored under `key`.
    pub async fn get(&self, key: &str) -> Option<(String, Bytes)> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl ImageStore for MemoryImages {
    async fn put_image(
        &self,
        key: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> ServiceResult<String> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(format!("memory://{}", key))
    }
}
