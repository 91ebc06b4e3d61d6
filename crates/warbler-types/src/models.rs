use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type MessageId = i64;

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// A user as the rest of the application sees it. The password hash stays in
/// the store layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl User {
    pub fn avatar(&self) -> &str {
        self.image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)
    }

    pub fn header_image(&self) -> &str {
        self.header_image_url
            .as_deref()
            .unwrap_or(DEFAULT_HEADER_IMAGE_URL)
    }
}

/// A message joined with the display fields of its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub username: String,
    pub user_image_url: Option<String>,
}

impl Message {
    pub fn author_avatar(&self) -> &str {
        self.user_image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL)
    }
}

/// Counts shown in the profile sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub messages: usize,
    pub following: usize,
    pub followers: usize,
    pub likes: usize,
}
