//! Who is making a request, and what they may do.
//!
//! Users are plain rows; being logged in is a property of the request, carried
//! by [`Identity`] and resolved by the [`session::SessionManager`].

pub mod password;
pub mod session;

use crate::entities::{post, user};
use crate::error::ForumError;

#[derive(Clone, Debug, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    User(user::Model),
}

impl Identity {
    pub fn user(&self) -> Option<&user::Model> {
        match self {
            Self::User(user) => Some(user),
            Self::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// The logged in user, or an `Unauthenticated` error that sends the
    /// caller to the login page and back to `next`.
    pub fn require(self, next: impl Into<String>) -> Result<user::Model, ForumError> {
        match self {
            Self::User(user) => Ok(user),
            Self::Anonymous => Err(ForumError::Unauthenticated { next: Some(next.into()) }),
        }
    }
}

/// Posts can be changed by their author and by admins.
pub fn ensure_can_modify_post(actor: &user::Model, post: &post::Model) -> Result<(), ForumError> {
    if post.user_id == actor.id || actor.is_admin {
        Ok(())
    } else {
        Err(ForumError::Forbidden)
    }
}

pub fn ensure_admin(actor: &user::Model) -> Result<(), ForumError> {
    if actor.is_admin { Ok(()) } else { Err(ForumError::Forbidden) }
}
