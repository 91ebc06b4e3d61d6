//! Database row types. These map directly to SQLite rows.
//! Distinct from warbler-types models so the password hash never leaves this layer
//! except through the authenticator.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use warbler_types::models::{Message, MessageId, User, UserId};

pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            image_url: self.image_url,
            header_image_url: self.header_image_url,
            bio: self.bio,
            location: self.location,
        }
    }
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: MessageId,
    pub text: String,
    pub timestamp: String,
    pub user_id: UserId,
    pub username: String,
    pub user_image_url: Option<String>,
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        let timestamp = parse_timestamp(&self.timestamp).unwrap_or_else(|| {
            warn!("Corrupt timestamp '{}' on message {}", self.timestamp, self.id);
            DateTime::default()
        });
        Message {
            id: self.id,
            text: self.text,
            timestamp,
            user_id: self.user_id,
            username: self.username,
            user_image_url: self.user_image_url,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            // SQLite's datetime('now') has no zone; treat it as UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}
