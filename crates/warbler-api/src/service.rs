//! Authorized state changes.
//!
//! Every operation takes the caller's [`Session`] and checks it before any
//! store access. Anonymous sessions fail with `Unauthorized`; owner-only
//! operations also compare the session user against the resource owner.

use tracing::{info, warn};

use warbler_db::Database;
use warbler_types::api::{NewMessage, ProfileUpdate};
use warbler_types::error::{Result, WarblerError};
use warbler_types::models::{Message, MessageId, User, UserId};

use crate::authenticator::Authenticator;
use crate::graph::SocialGraph;
use crate::session::Session;

pub struct MutationService<'a> {
    db: &'a Database,
}

impl<'a> MutationService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn graph(&self) -> SocialGraph<'a> {
        SocialGraph::new(self.db)
    }

    // -- Messages --

    pub fn post_message(&self, session: &Session, text: &str) -> Result<Message> {
        let user_id = session.require_user()?;
        let message = self.graph().add_message(&NewMessage::new(text, user_id))?;
        info!("User {} posted message {}", user_id, message.id);
        Ok(message)
    }

    /// Deletes a message owned by the session user and returns it.
    pub fn delete_message(&self, session: &Session, id: MessageId) -> Result<Message> {
        session.require_user()?;
        let message = self.graph().message(id)?;
        if let Err(e) = session.require_owner(message.user_id) {
            warn!(
                "User {:?} tried to delete message {} owned by {}",
                session.user_id(),
                id,
                message.user_id
            );
            return Err(e);
        }
        if !self.db.delete_message(id)? {
            return Err(WarblerError::NotFound("message"));
        }
        info!("Message {} deleted by its owner", id);
        Ok(message)
    }

    // -- Graph --

    pub fn follow(&self, session: &Session, target: UserId) -> Result<()> {
        let user_id = session.require_user()?;
        self.graph().follow(user_id, target)
    }

    pub fn unfollow(&self, session: &Session, target: UserId) -> Result<()> {
        let user_id = session.require_user()?;
        self.graph().unfollow(user_id, target)
    }

    pub fn like(&self, session: &Session, message: MessageId) -> Result<()> {
        let user_id = session.require_user()?;
        self.graph().like(user_id, message)
    }

    pub fn unlike(&self, session: &Session, message: MessageId) -> Result<()> {
        let user_id = session.require_user()?;
        self.graph().unlike(user_id, message)
    }

    /// Flips the like state. Returns true if the message is now liked.
    pub fn toggle_like(&self, session: &Session, message: MessageId) -> Result<bool> {
        let user_id = session.require_user()?;
        let graph = self.graph();
        if graph.has_liked(user_id, message)? {
            graph.unlike(user_id, message)?;
            Ok(false)
        } else {
            graph.like(user_id, message)?;
            Ok(true)
        }
    }

    // -- Gated reads --

    /// `user` and the accounts it follows.
    pub fn following_of(&self, session: &Session, user: UserId) -> Result<(User, Vec<User>)> {
        session.require_user()?;
        let graph = self.graph();
        Ok((graph.user(user)?, graph.following(user)?))
    }

    /// `user` and the accounts following it.
    pub fn followers_of(&self, session: &Session, user: UserId) -> Result<(User, Vec<User>)> {
        session.require_user()?;
        let graph = self.graph();
        Ok((graph.user(user)?, graph.followers(user)?))
    }

    pub fn likes_of(&self, session: &Session, user: UserId) -> Result<(User, Vec<Message>)> {
        session.require_user()?;
        let graph = self.graph();
        Ok((graph.user(user)?, graph.liked_messages(user)?))
    }

    /// Current values for the profile edit form.
    pub fn own_profile(&self, session: &Session) -> Result<User> {
        let user_id = session.require_user()?;
        self.graph().user(user_id)
    }

    // -- Account --

    /// Applies profile changes after re-checking the current password.
    pub fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
        password: &str,
    ) -> Result<User> {
        let user_id = session.require_user()?;
        Authenticator::new(self.db).verify_user_password(user_id, password)?;
        update.validate()?;

        if !self.db.update_user(user_id, update)? {
            return Err(WarblerError::NotFound("user"));
        }
        info!("User {} updated their profile", user_id);
        self.graph().user(user_id)
    }

    /// Removes the session user and everything they own. The caller is
    /// responsible for tearing down the user's sessions.
    pub fn delete_account(&self, session: &Session) -> Result<UserId> {
        let user_id = session.require_user()?;
        match self.db.delete_user(user_id)? {
            Some(messages) => {
                info!("Deleted user {} and {} messages", user_id, messages);
                Ok(user_id)
            }
            None => Err(WarblerError::NotFound("user")),
        }
    }
}
