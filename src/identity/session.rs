//! Login sessions: a signed token naming a server side session row.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::Identity;
use crate::entities::{session, user};
use crate::error::ForumError;

pub const SESSION_COOKIE: &str = "forum_session";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    /// Session row id.
    sid: Uuid,
    iat: i64,
    exp: i64,
}

#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    remember_ttl: Duration,
}

impl SessionManager {
    pub fn new(secret: &[u8], ttl: Duration, remember_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            remember_ttl,
        }
    }

    /// Opens a session for `user_id`. `remember` picks the long lifetime.
    pub async fn issue<C>(&self, db: &C, user_id: i32, remember: bool) -> Result<IssuedSession, ForumError>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        let expires_at = now + if remember { self.remember_ttl } else { self.ttl };
        let row = session::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(now),
            expires_at: Set(expires_at),
        }
        .insert(db)
        .await?;

        let claims = Claims {
            sub: user_id.to_string(),
            sid: row.id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ForumError::Internal(format!("failed to sign session token: {e}")))?;
        debug!(user_id, session_id = %row.id, remember, "session issued");
        Ok(IssuedSession { token, expires_at })
    }

    fn claims(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| debug!(error = %e, "rejected session token"))
            .ok()
    }

    /// Resolves a token to the user behind it. Anything short of a live session
    /// for an active user is anonymous. Refreshes the user's last-seen time.
    pub async fn resolve<C>(&self, db: &C, token: Option<&str>) -> Result<Identity, ForumError>
    where
        C: ConnectionTrait,
    {
        let Some(claims) = token.and_then(|t| self.claims(t)) else {
            return Ok(Identity::Anonymous);
        };
        let Some(row) = session::Entity::find_by_id(claims.sid).one(db).await? else {
            return Ok(Identity::Anonymous);
        };
        if row.expires_at <= Utc::now() || claims.sub != row.user_id.to_string() {
            return Ok(Identity::Anonymous);
        }
        let Some(user) = user::Entity::find_by_id(row.user_id).one(db).await? else {
            return Ok(Identity::Anonymous);
        };
        if !user.is_active {
            return Ok(Identity::Anonymous);
        }
        touch_last_seen(db, user.id).await;
        Ok(Identity::User(user))
    }

    /// Deletes the session a token names. Unknown or invalid tokens are ignored.
    pub async fn revoke<C>(&self, db: &C, token: &str) -> Result<(), ForumError>
    where
        C: ConnectionTrait,
    {
        if let Some(claims) = self.claims(token) {
            session::Entity::delete_by_id(claims.sid).exec(db).await?;
            debug!(session_id = %claims.sid, "session revoked");
        }
        Ok(())
    }

    pub async fn revoke_all<C>(&self, db: &C, user_id: i32) -> Result<u64, ForumError>
    where
        C: ConnectionTrait,
    {
        let res = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }
}

async fn touch_last_seen<C>(db: &C, user_id: i32)
where
    C: ConnectionTrait,
{
    let res = user::Entity::update_many()
        .col_expr(user::Column::LastSeen, Expr::value(Utc::now()))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await;
    if let Err(e) = res {
        warn!(user_id, error = %e, "failed to update last_seen");
    }
}
