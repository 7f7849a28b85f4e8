use std::sync::Arc;

use bytes::Bytes;
use image::ImageFormat;
use tracing::info;
use ulid::Ulid;
use uuid::Uuid;

use crate::app::auth::AuthSession;
use crate::app::error::{ServiceError, ServiceResult};
use crate::app::feed::join_aggregates;
use crate::app::store::{ImageStore, PostStore, ProfileStore, RatingStore, Stores};
use crate::domain::post::{NewPost, Post, PostDetail, PostKind};

pub const MAX_CAPTION_LEN: usize = 2200;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    ratings: Arc<dyn RatingStore>,
    profiles: Arc<dyn ProfileStore>,
    images: Arc<dyn ImageStore>,
    upload_max_bytes: usize,
}

impl PostService {
    pub fn new(stores: Stores, upload_max_bytes: usize) -> Self {
        Self {
            posts: stores.posts,
            ratings: stores.ratings,
            profiles: stores.profiles,
            images: stores.images,
            upload_max_bytes,
        }
    }

    /// Upload the image for the session user, then record the post with the
    /// returned URI.
    pub async fn create_post(
        &self,
        session: &AuthSession,
        image: Bytes,
        caption: Option<String>,
        kind: PostKind,
    ) -> ServiceResult<Post> {
        let caption = normalize_caption(caption)?;
        if image.is_empty() {
            return Err(ServiceError::validation("image cannot be empty"));
        }
        if image.len() > self.upload_max_bytes {
            return Err(ServiceError::validation("image exceeds max size"));
        }
        let (extension, content_type) = sniff_image(&image)?;

        // Check before uploading so a missing profile leaves no orphan blob.
        if self.profiles.get_profile(session.user_id).await?.is_none() {
            return Err(ServiceError::not_found("profile not found"));
        }

        let key = format!(
            "{}/{}.{}",
            session.user_id,
            Ulid::new().to_string().to_lowercase(),
            extension
        );
        let image_url = self.images.put_image(&key, content_type, image).await?;

        let post = self
            .posts
            .insert_post(NewPost {
                owner_id: session.user_id,
                image_url,
                caption,
                kind,
            })
            .await?;

        info!(post_id = %post.id, owner_id = %post.owner_id, kind = post.kind.as_db(), "post created");
        Ok(post)
    }

    pub async fn get_post(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> ServiceResult<PostDetail> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("post not found"))?;

        let ratings = if post.kind.is_rated() {
            self.ratings.list_for_post(post_id).await?
        } else {
            Vec::new()
        };
        let my_rating = viewer_id.and_then(|viewer| {
            ratings
                .iter()
                .find(|rating| rating.user_id == viewer)
                .map(|rating| rating.score)
        });

        let item = join_aggregates(vec![post], ratings)
            .pop()
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("feed join dropped post")))?;

        Ok(PostDetail { item, my_rating })
    }
}

fn normalize_caption(caption: Option<String>) -> ServiceResult<Option<String>> {
    let caption = match caption {
        Some(caption) => caption.trim().to_string(),
        None => return Ok(None),
    };
    if caption.is_empty() {
        return Ok(None);
    }
    if caption.chars().count() > MAX_CAPTION_LEN {
        return Err(ServiceError::validation(format!(
            "caption must be at most {} characters",
            MAX_CAPTION_LEN
        )));
    }
    Ok(Some(caption))
}

/// File extension and content type from the image's magic bytes.
pub fn sniff_image(bytes: &[u8]) -> ServiceResult<(&'static str, &'static str)> {
    let format = image::guess_format(bytes)
        .map_err(|_| ServiceError::validation("unsupported image format"))?;
    match format {
        ImageFormat::Jpeg => Ok(("jpg", "image/jpeg")),
        ImageFormat::Png => Ok(("png", "image/png")),
        ImageFormat::WebP => Ok(("webp", "image/webp")),
        _ => Err(ServiceError::validation("unsupported image format")),
    }
}
