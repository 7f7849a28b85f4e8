use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::rating::Aggregate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub kind: PostKind,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Roast,
    Vote,
}

impl PostKind {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "roast" => Some(Self::Roast),
            "vote" => Some(Self::Vote),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Roast => "roast",
            Self::Vote => "vote",
        }
    }

    /// Only vote posts accept ratings and carry an aggregate.
    pub fn is_rated(&self) -> bool {
        matches!(self, Self::Vote)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub kind: PostKind,
}

/// Scope of a feed listing. Empty filter means every post.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub kind: Option<PostKind>,
    pub owner_id: Option<Uuid>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        self.kind.map_or(true, |kind| post.kind == kind)
            && self.owner_id.map_or(true, |owner| post.owner_id == owner)
    }
}

/// A post joined with its current rating aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub item: FeedItem,
    /// The viewer's own score, when authenticated and already rated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_rating: Option<i32>,
}
