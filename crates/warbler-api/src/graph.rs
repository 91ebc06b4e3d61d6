//! Follow and like edges, message creation, and the read side built on them.

use tracing::debug;

use warbler_db::Database;
use warbler_types::api::{NewMessage, validate_message_text};
use warbler_types::error::{Result, WarblerError};
use warbler_types::models::{Message, MessageId, ProfileStats, User, UserId};

/// Home timelines show at most this many messages.
pub const TIMELINE_LIMIT: u32 = 100;

pub struct SocialGraph<'a> {
    db: &'a Database,
}

impl<'a> SocialGraph<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // -- Follows --

    /// True iff `a` follows `b`.
    pub fn is_following(&self, a: UserId, b: UserId) -> Result<bool> {
        Ok(self.db.follow_exists(a, b)?)
    }

    /// True iff `b` follows `a`.
    pub fn is_followed_by(&self, a: UserId, b: UserId) -> Result<bool> {
        Ok(self.db.follow_exists(b, a)?)
    }

    pub fn follow(&self, follower: UserId, followed: UserId) -> Result<()> {
        if follower == followed {
            return Err(WarblerError::value("You cannot follow yourself."));
        }
        self.user(followed)?;
        if self.db.insert_follow(follower, followed)? {
            debug!("User {} now follows {}", follower, followed);
        }
        Ok(())
    }

    pub fn unfollow(&self, follower: UserId, followed: UserId) -> Result<()> {
        if self.db.delete_follow(follower, followed)? {
            debug!("User {} stopped following {}", follower, followed);
        }
        Ok(())
    }

    pub fn following(&self, user: UserId) -> Result<Vec<User>> {
        Ok(self.db.following(user)?.into_iter().map(|r| r.into_user()).collect())
    }

    pub fn followers(&self, user: UserId) -> Result<Vec<User>> {
        Ok(self.db.followers(user)?.into_iter().map(|r| r.into_user()).collect())
    }

    // -- Likes --

    pub fn like(&self, user: UserId, message: MessageId) -> Result<()> {
        self.message(message)?;
        if self.db.insert_like(user, message)? {
            debug!("User {} liked message {}", user, message);
        }
        Ok(())
    }

    pub fn unlike(&self, user: UserId, message: MessageId) -> Result<()> {
        if self.db.delete_like(user, message)? {
            debug!("User {} unliked message {}", user, message);
        }
        Ok(())
    }

    pub fn has_liked(&self, user: UserId, message: MessageId) -> Result<bool> {
        Ok(self.db.like_exists(user, message)?)
    }

    pub fn liked_messages(&self, user: UserId) -> Result<Vec<Message>> {
        Ok(self.db.liked_messages(user)?.into_iter().map(|r| r.into_message()).collect())
    }

    pub fn liked_ids(&self, user: UserId) -> Result<Vec<MessageId>> {
        Ok(self.db.liked_message_ids(user)?)
    }

    // -- Messages --

    /// Stores a new message. The author must exist and the text must be
    /// 1 to 140 characters.
    pub fn add_message(&self, new: &NewMessage) -> Result<Message> {
        if !self.db.user_exists(new.user_id)? {
            return Err(WarblerError::value(format!(
                "User {} does not exist.",
                new.user_id
            )));
        }
        validate_message_text(&new.text)?;

        let row = self.db.insert_message(&new.text, new.user_id)?;
        Ok(row.into_message())
    }

    pub fn message(&self, id: MessageId) -> Result<Message> {
        self.db
            .get_message(id)?
            .map(|r| r.into_message())
            .ok_or(WarblerError::NotFound("message"))
    }

    pub fn messages_by(&self, user: UserId) -> Result<Vec<Message>> {
        Ok(self
            .db
            .messages_by_user(user, TIMELINE_LIMIT)?
            .into_iter()
            .map(|r| r.into_message())
            .collect())
    }

    pub fn timeline(&self, user: UserId) -> Result<Vec<Message>> {
        Ok(self
            .db
            .timeline(user, TIMELINE_LIMIT)?
            .into_iter()
            .map(|r| r.into_message())
            .collect())
    }

    // -- People --

    pub fn user(&self, id: UserId) -> Result<User> {
        self.db
            .get_user(id)?
            .map(|r| r.into_user())
            .ok_or(WarblerError::NotFound("user"))
    }

    pub fn users(&self, search: Option<&str>) -> Result<Vec<User>> {
        Ok(self.db.list_users(search)?.into_iter().map(|r| r.into_user()).collect())
    }

    pub fn stats(&self, user: UserId) -> Result<ProfileStats> {
        Ok(self.db.profile_stats(user)?)
    }
}
