use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use crate::app::auth::AuthService;
use crate::app::store::Stores;
use crate::domain::post::{NewPost, PostKind};

const DEMO_POSTS: &[(&str, &str, PostKind)] = &[
    (
        "https://images.unsplash.com/photo-1517849845537-4d257902454a?w=800&q=80",
        "Rate my new haircut!",
        PostKind::Vote,
    ),
    (
        "https://images.unsplash.com/photo-1535713875002-d1d0cf377fde?w=800&q=80",
        "Roast my setup... be gentle (or not)",
        PostKind::Roast,
    ),
    (
        "https://images.unsplash.com/photo-1527082395-ef52744cd62e?w=800&q=80",
        "Is this outfit cringe? 1-10",
        PostKind::Vote,
    ),
    (
        "https://images.unsplash.com/photo-1496345875659-11f7dd282d1d?w=800&q=80",
        "Trying to be aesthetic. Roast me.",
        PostKind::Roast,
    ),
    (
        "https://images.unsplash.com/photo-1513721032312-6a18a47c8c3e?w=800&q=80",
        "Homemade pizza. Thoughts?",
        PostKind::Vote,
    ),
    (
        "https://images.unsplash.com/photo-1483985988355-763728e1935b?w=800&q=80",
        "Fashion expert or fashion disaster?",
        PostKind::Roast,
    ),
];

#[derive(Debug)]
pub struct SeedReport {
    pub user_id: Uuid,
    pub access_token: String,
    pub posts_created: usize,
}

/// Create a demo profile with a handful of posts of both kinds.
pub async fn run(stores: &Stores, auth: &AuthService, user_id: Option<Uuid>) -> Result<SeedReport> {
    let user_id = user_id.unwrap_or_else(Uuid::new_v4);

    let profile = match stores.profiles.get_profile(user_id).await? {
        Some(profile) => profile,
        None => {
            stores
                .profiles
                .upsert_profile(user_id, "demo".to_string(), None)
                .await?
        }
    };

    for (image_url, caption, kind) in DEMO_POSTS {
        stores
            .posts
            .insert_post(NewPost {
                owner_id: profile.id,
                image_url: image_url.to_string(),
                caption: Some(caption.to_string()),
                kind: *kind,
            })
            .await?;
    }

    let access_token = auth.issue_access_token(profile.id)?;
    info!(user_id = %profile.id, posts = DEMO_POSTS.len(), "seeded demo data");

    Ok(SeedReport {
        user_id: profile.id,
        access_token,
        posts_created: DEMO_POSTS.len(),
    })
}
