//! Read models returned by the services and serialized by the API.

use chrono::{DateTime, Utc};
use poem_openapi::Object;

use crate::entities::{category, tag, user};

#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: Option<String>,
    pub date_joined: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_admin: bool,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            bio: user.bio,
            date_joined: user.date_joined,
            last_seen: user.last_seen,
            is_admin: user.is_admin,
        }
    }
}

/// Public face of a user, as shown next to their content.
#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct AuthorView {
    pub id: i32,
    pub username: String,
    pub avatar: String,
}

impl From<user::Model> for AuthorView {
    fn from(user: user::Model) -> Self {
        Self { id: user.id, username: user.username, avatar: user.avatar }
    }
}

#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl From<category::Model> for CategoryView {
    fn from(category: category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
        }
    }
}

#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct TagView {
    pub name: String,
    pub slug: String,
}

impl From<tag::Model> for TagView {
    fn from(tag: tag::Model) -> Self {
        Self { name: tag.name, slug: tag.slug }
    }
}

#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct PostSummary {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub views: i32,
    pub is_pinned: bool,
    pub author: AuthorView,
    pub category: CategoryView,
    pub tags: Vec<TagView>,
    pub likes: u64,
}

#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct PostPage {
    pub items: Vec<PostSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// One comment in a thread. Threads are listed depth first; `depth` is the
/// nesting level (0 for top level comments).
#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct CommentView {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub depth: u32,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub is_edited: bool,
    pub author: AuthorView,
    pub likes: u64,
}

#[derive(Clone, Debug, Object)]
#[oai(rename_all = "snake_case")]
pub struct PostDetail {
    pub post: PostSummary,
    pub comments: Vec<CommentView>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Object)]
pub struct LikeToggle {
    pub likes: u64,
    pub liked: bool,
}
