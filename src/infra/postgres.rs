use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::app::store::{
    CommentStore, PostStore, ProfileStore, RatingStore, StoreHealth, Stores,
};
use crate::domain::engagement::Comment;
use crate::domain::post::{NewPost, Post, PostFilter, PostKind};
use crate::domain::rating::Rating;
use crate::domain::user::Profile;
use crate::infra::db::Db;
use crate::infra::storage::ObjectStorage;

const FOREIGN_KEY_VIOLATION: &str = "23503";

pub fn stores(db: Db, storage: ObjectStorage) -> Stores {
    let store = Arc::new(PgStore::new(db));
    Stores {
        posts: store.clone(),
        ratings: store.clone(),
        comments: store.clone(),
        profiles: store.clone(),
        images: Arc::new(storage),
        health: store,
    }
}

#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: NewPost) -> ServiceResult<Post> {
        let row = sqlx::query(
            "INSERT INTO posts (owner_id, image_url, caption, kind) \
             VALUES ($1, $2, $3, $4::post_kind) \
             RETURNING id, owner_id, image_url, caption, kind::text AS kind, created_at",
        )
        .bind(post.owner_id)
        .bind(post.image_url)
        .bind(post.caption)
        .bind(post.kind.as_db())
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| missing_reference(err, "profile not found"))?;

        post_from_row(&row)
    }

    async fn get_post(&self, post_id: Uuid) -> ServiceResult<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, owner_id, image_url, caption, kind::text AS kind, created_at \
             FROM posts WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn list_posts(&self, filter: &PostFilter) -> ServiceResult<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, image_url, caption, kind::text AS kind, created_at \
             FROM posts \
             WHERE ($1::text IS NULL OR kind::text = $1) \
               AND ($2::uuid IS NULL OR owner_id = $2) \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(filter.kind.map(|kind| kind.as_db()))
        .bind(filter.owner_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }
}

#[async_trait]
impl RatingStore for PgStore {
    async fn put(&self, post_id: Uuid, rater_id: Uuid, score: i32) -> ServiceResult<Rating> {
        crate::app::ratings::validate_score(score)?;

        // Single statement: the post guard and the conflict target make the
        // write atomic, so concurrent submissions cannot create two rows.
        let row = sqlx::query(
            "INSERT INTO ratings (post_id, user_id, score) \
             SELECT id, $2, $3 FROM posts WHERE id = $1 AND kind = 'vote'::post_kind \
             ON CONFLICT (post_id, user_id) \
             DO UPDATE SET score = EXCLUDED.score, updated_at = now() \
             RETURNING id, post_id, user_id, score, created_at, updated_at",
        )
        .bind(post_id)
        .bind(rater_id)
        .bind(score)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|err| missing_reference(err, "profile not found"))?;

        if let Some(row) = row {
            return Ok(rating_from_row(&row));
        }

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;
        match exists {
            Some(_) => Err(ServiceError::validation("post does not accept ratings")),
            None => Err(ServiceError::not_found("post not found")),
        }
    }

    async fn list_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<Rating>> {
        let rows = sqlx::query(
            "SELECT id, post_id, user_id, score, created_at, updated_at \
             FROM ratings WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        // No rows is ambiguous: an unrated post or no post at all.
        if rows.is_empty() && self.get_post(post_id).await?.is_none() {
            return Err(ServiceError::not_found("post not found"));
        }
        Ok(rows.iter().map(rating_from_row).collect())
    }

    async fn list_for_posts(&self, post_ids: &[Uuid]) -> ServiceResult<Vec<Rating>> {
        let rows = sqlx::query(
            "SELECT id, post_id, user_id, score, created_at, updated_at \
             FROM ratings WHERE post_id = ANY($1)",
        )
        .bind(post_ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(rating_from_row).collect())
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        body: String,
    ) -> ServiceResult<Comment> {
        let row = sqlx::query(
            "INSERT INTO comments (post_id, user_id, body) \
             SELECT id, $2, $3 FROM posts WHERE id = $1 \
             RETURNING id, user_id, post_id, body, created_at",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(body)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|err| missing_reference(err, "profile not found"))?;

        let row = row.ok_or_else(|| ServiceError::not_found("post not found"))?;
        Ok(comment_from_row(&row))
    }

    async fn list_comments(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, user_id, post_id, body, created_at \
             FROM comments \
             WHERE post_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn upsert_profile(
        &self,
        user_id: Uuid,
        display_name: String,
        avatar_url: Option<String>,
    ) -> ServiceResult<Profile> {
        let row = sqlx::query(
            "INSERT INTO profiles (id, display_name, avatar_url) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE \
             SET display_name = EXCLUDED.display_name, avatar_url = EXCLUDED.avatar_url \
             RETURNING id, display_name, avatar_url, created_at",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(avatar_url)
        .fetch_one(self.db.pool())
        .await?;

        Ok(profile_from_row(&row))
    }

    async fn get_profile(&self, user_id: Uuid) -> ServiceResult<Option<Profile>> {
        let row = sqlx::query(
            "SELECT id, display_name, avatar_url, created_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(profile_from_row))
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> ServiceResult<()> {
        sqlx::query("SELECT 1").execute(self.db.pool()).await?;
        Ok(())
    }
}

/// A foreign-key failure on insert means the acting user has no profile.
fn missing_reference(err: sqlx::Error, message: &str) -> ServiceError {
    let is_fk = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .map_or(false, |code| code == FOREIGN_KEY_VIOLATION);
    if is_fk {
        ServiceError::not_found(message)
    } else {
        err.into()
    }
}

fn post_from_row(row: &PgRow) -> ServiceResult<Post> {
    let kind: String = row.get("kind");
    let kind = PostKind::from_db(&kind)
        .ok_or_else(|| anyhow::anyhow!("unknown post kind: {}", kind))?;

    Ok(Post {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        image_url: row.get("image_url"),
        caption: row.get("caption"),
        kind,
        created_at: row.get("created_at"),
    })
}

fn rating_from_row(row: &PgRow) -> Rating {
    Rating {
        id: row.get("id"),
        post_id: row.get("post_id"),
        user_id: row.get("user_id"),
        score: row.get("score"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        post_id: row.get("post_id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}

fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        display_name: row.get("display_name"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
    }
}
