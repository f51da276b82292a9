// entities/user.rs
use sea_orm::Set;
use sea_orm::entity::prelude::*;

use crate::avatar::DEFAULT_AVATAR;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique, indexed)]
    pub username: String,
    #[sea_orm(unique, indexed)]
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// File name under the avatar directory.
    pub avatar: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub date_joined: DateTimeUtc,
    pub last_seen: DateTimeUtc,
    pub is_active: bool,
    pub is_admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::like::Entity")]
    Like,
    #[sea_orm(has_many = "super::session::Entity")]
    Session,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            avatar: Set(DEFAULT_AVATAR.to_owned()),
            date_joined: Set(now),
            last_seen: Set(now),
            is_active: Set(true),
            is_admin: Set(false),
            ..ActiveModelTrait::default()
        }
    }
}
