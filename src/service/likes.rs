//! Like / unlike as a single toggle.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};
use tracing::debug;

use super::views::LikeToggle;
use crate::context::ForumContext;
use crate::entities::{comment, like, post, user};
use crate::error::ForumError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeTarget {
    Post(i32),
    Comment(i32),
}

impl LikeTarget {
    fn column(self) -> (like::Column, i32) {
        match self {
            Self::Post(id) => (like::Column::PostId, id),
            Self::Comment(id) => (like::Column::CommentId, id),
        }
    }
}

pub async fn count_likes<C>(db: &C, target: LikeTarget) -> Result<u64, ForumError>
where
    C: ConnectionTrait,
{
    let (column, id) = target.column();
    Ok(like::Entity::find().filter(column.eq(id)).count(db).await?)
}

async fn ensure_target_exists<C>(db: &C, target: LikeTarget) -> Result<(), ForumError>
where
    C: ConnectionTrait,
{
    let found = match target {
        LikeTarget::Post(id) => post::Entity::find_by_id(id).one(db).await?.is_some(),
        LikeTarget::Comment(id) => comment::Entity::find_by_id(id).one(db).await?.is_some(),
    };
    match (found, target) {
        (true, _) => Ok(()),
        (false, LikeTarget::Post(_)) => Err(ForumError::NotFound("post")),
        (false, LikeTarget::Comment(_)) => Err(ForumError::NotFound("comment")),
    }
}

/// Stores a like. `false` when the user already likes `target`.
async fn insert_like<C>(db: &C, user_id: i32, target: LikeTarget) -> Result<bool, ForumError>
where
    C: ConnectionTrait,
{
    let (post_id, comment_id) = match target {
        LikeTarget::Post(id) => (Some(id), None),
        LikeTarget::Comment(id) => (None, Some(id)),
    };
    let row = like::ActiveModel {
        user_id: Set(user_id),
        post_id: Set(post_id),
        comment_id: Set(comment_id),
        ..Default::default()
    };
    match row.insert(db).await {
        Ok(_) => Ok(true),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Removes `user`'s like on `target` if there is one, adds it otherwise.
/// The reported count is read back after the change.
pub async fn toggle_like(ctx: &ForumContext, user: &user::Model, target: LikeTarget) -> Result<LikeToggle, ForumError> {
    let txn = ctx.db.begin().await?;
    ensure_target_exists(&txn, target).await?;

    let (column, id) = target.column();
    let existing = like::Entity::find()
        .filter(like::Column::UserId.eq(user.id))
        .filter(column.eq(id))
        .one(&txn)
        .await?;

    let liked = match existing {
        Some(row) => {
            like::Entity::delete_by_id(row.id).exec(&txn).await?;
            false
        }
        None => {
            if !insert_like(&txn, user.id, target).await? {
                // A concurrent toggle got there first; the like exists.
                txn.rollback().await?;
                let likes = count_likes(&ctx.db, target).await?;
                return Ok(LikeToggle { likes, liked: true });
            }
            true
        }
    };

    let likes = count_likes(&txn, target).await?;
    txn.commit().await?;
    debug!(user_id = user.id, ?target, liked, likes, "like toggled");
    Ok(LikeToggle { likes, liked })
}
