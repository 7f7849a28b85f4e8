use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use crate::app::auth::AuthSession;
use crate::app::error::{ServiceError, ServiceResult};
use crate::app::store::{ProfileStore, Stores};
use crate::domain::user::Profile;

pub const MAX_DISPLAY_NAME_LEN: usize = 50;

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(stores: Stores) -> Self {
        Self {
            profiles: stores.profiles,
        }
    }

    /// Create or update the caller's own profile.
    pub async fn upsert_profile(
        &self,
        session: &AuthSession,
        display_name: String,
        avatar_url: Option<String>,
    ) -> ServiceResult<Profile> {
        let display_name = display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(ServiceError::validation("display_name cannot be empty"));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(ServiceError::validation(format!(
                "display_name must be at most {} characters",
                MAX_DISPLAY_NAME_LEN
            )));
        }
        let avatar_url = avatar_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &avatar_url {
            validate_avatar_url(url)?;
        }

        self.profiles
            .upsert_profile(session.user_id, display_name, avatar_url)
            .await
    }

    pub async fn get_profile(&self, user_id: Uuid) -> ServiceResult<Profile> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user not found"))
    }
}

fn validate_avatar_url(value: &str) -> ServiceResult<()> {
    let url = Url::parse(value).map_err(|_| ServiceError::validation("invalid avatar_url"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ServiceError::validation("invalid avatar_url")),
    }
}
