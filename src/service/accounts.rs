//! Registration, login, logout and profile changes.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait};
use tracing::{info, warn};
use validator::Validate;

use crate::avatar::{AvatarUpload, discard_avatar, process_avatar};
use crate::context::ForumContext;
use crate::entities::user;
use crate::error::{FieldErrors, ForumError};
use crate::forms::{LoginForm, ProfileForm, RegisterForm};
use crate::identity::password::{hash_password, verify_password};
use crate::identity::session::IssuedSession;

const USERNAME_TAKEN: &str = "This username is already taken. Please choose another one.";
const EMAIL_TAKEN: &str = "This email is already registered. Please use another one.";

async fn username_taken<C: ConnectionTrait>(db: &C, username: &str) -> Result<bool, ForumError> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some())
}

async fn email_taken<C: ConnectionTrait>(db: &C, email: &str) -> Result<bool, ForumError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
        .is_some())
}

pub async fn register(ctx: &ForumContext, form: RegisterForm) -> Result<user::Model, ForumError> {
    form.validate()?;
    let username = form.username.trim().to_owned();
    let email = form.email.trim().to_owned();

    let txn = ctx.db.begin().await?;
    let mut errors = FieldErrors::default();
    if username_taken(&txn, &username).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if email_taken(&txn, &email).await? {
        errors.add("email", EMAIL_TAKEN);
    }
    errors.into_result()?;

    let user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&form.password)?),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks the credentials and opens a session.
pub async fn authenticate(ctx: &ForumContext, form: LoginForm) -> Result<(user::Model, IssuedSession), ForumError> {
    form.validate()?;
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(form.email.trim()))
        .one(&ctx.db)
        .await?;
    let user = match user {
        Some(user) if user.is_active && verify_password(&form.password, &user.password_hash) => user,
        _ => {
            warn!(email = %form.email, "failed login");
            return Err(ForumError::InvalidCredentials);
        }
    };
    let session = ctx.sessions.issue(&ctx.db, user.id, form.remember).await?;
    info!(user_id = user.id, remember = form.remember, "user logged in");
    Ok((user, session))
}

pub async fn logout(ctx: &ForumContext, token: &str) -> Result<(), ForumError> {
    ctx.sessions.revoke(&ctx.db, token).await
}

/// Updates the current user's profile. Uniqueness is only re-checked for the
/// fields that actually changed. A new avatar replaces the stored file name.
pub async fn update_profile(
    ctx: &ForumContext,
    user: user::Model,
    form: ProfileForm,
    avatar: Option<AvatarUpload>,
) -> Result<user::Model, ForumError> {
    form.validate()?;
    let username = form.username.trim().to_owned();
    let email = form.email.trim().to_owned();

    let mut errors = FieldErrors::default();
    if username != user.username && username_taken(&ctx.db, &username).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if email != user.email && email_taken(&ctx.db, &email).await? {
        errors.add("email", EMAIL_TAKEN);
    }
    errors.into_result()?;

    let avatar = match avatar {
        Some(upload) => Some(process_avatar(&ctx.config.avatar_dir, upload).await?),
        None => None,
    };

    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();
    active.username = Set(username);
    active.email = Set(email);
    active.bio = Set(form.bio.filter(|b| !b.trim().is_empty()));
    if let Some(file_name) = &avatar {
        active.avatar = Set(file_name.clone());
    }
    let user = match active.update(&ctx.db).await {
        Ok(user) => user,
        Err(err) => {
            if let Some(file_name) = &avatar {
                discard_avatar(&ctx.config.avatar_dir, file_name).await;
            }
            return Err(err.into());
        }
    };

    info!(user_id, "profile updated");
    Ok(user)
}

/// Removes the account. Posts, comments, likes and sessions go with it.
pub async fn delete_account(ctx: &ForumContext, user: user::Model) -> Result<(), ForumError> {
    let user_id = user.id;
    let txn = ctx.db.begin().await?;
    let revoked = ctx.sessions.revoke_all(&txn, user_id).await?;
    user.delete(&txn).await?;
    txn.commit().await?;
    info!(user_id, revoked, "account deleted");
    Ok(())
}
