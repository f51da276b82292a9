//! Shared fixtures: a migrated in-memory forum with its own avatar directory.
#![allow(dead_code)]

use rstest::fixture;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tempfile::TempDir;

use forum::config::ForumConfig;
use forum::context::ForumContext;
use forum::entities::{category, post, user};
use forum::forms::{PostForm, RegisterForm};
use forum::seed;
use forum::service::{accounts, posts};

pub const PASSWORD: &str = "correct horse battery";
pub const PAGE_SIZE: u64 = 3;

pub struct TestForum {
    pub ctx: ForumContext,
    pub general: category::Model,
    pub avatars: TempDir,
}

#[fixture]
pub async fn fresh_forum() -> TestForum {
    let avatars = tempfile::tempdir().expect("Failed to create avatar dir");
    let mut config = ForumConfig::for_database("sqlite::memory:");
    config.avatar_dir = avatars.path().to_path_buf();
    config.page_size = PAGE_SIZE;

    let ctx = ForumContext::connect(config).await.expect("Failed to open test database");
    seed::ensure_default_category(&ctx).await.expect("Failed to seed category");
    let general = category::Entity::find()
        .one(&ctx.db)
        .await
        .expect("Failed to load category")
        .expect("Default category missing");
    TestForum { ctx, general, avatars }
}

impl TestForum {
    pub async fn user(&self, username: &str) -> user::Model {
        let form = RegisterForm {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password: PASSWORD.to_owned(),
            confirm_password: PASSWORD.to_owned(),
        };
        accounts::register(&self.ctx, form).await.expect("Failed to register user")
    }

    pub async fn admin(&self, username: &str) -> user::Model {
        let user = self.user(username).await;
        let mut active: user::ActiveModel = user.into();
        active.is_admin = Set(true);
        active.update(&self.ctx.db).await.expect("Failed to promote admin")
    }

    pub async fn post(&self, author: &user::Model, title: &str, content: &str, tags: Option<&str>) -> post::Model {
        let form = PostForm {
            title: title.to_owned(),
            content: content.to_owned(),
            category_id: self.general.id,
            tags: tags.map(str::to_owned),
        };
        posts::create_post(&self.ctx, author, form).await.expect("Failed to create post")
    }
}
