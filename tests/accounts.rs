//! Registration, login sessions, profiles and account removal.

mod common;

use chrono::Utc;
use common::{PASSWORD, TestForum, fresh_forum};
use forum::avatar::{AvatarUpload, DEFAULT_AVATAR};
use forum::entities::{comment, like, post, session, user};
use forum::error::ForumError;
use forum::forms::{CommentForm, LoginForm, ProfileForm, RegisterForm};
use forum::service::likes::{self, LikeTarget};
use forum::service::{accounts, comments};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use rstest::rstest;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::io::Cursor;

fn login_form(email: &str, password: &str, remember: bool) -> LoginForm {
    LoginForm { email: email.to_owned(), password: password.to_owned(), remember }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([10, 120, 200])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[rstest]
#[tokio::test]
async fn test_register_hashes_password_and_sets_defaults(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;

    // Act
    let alice = board.user("alice").await;

    // Assert
    assert_ne!(alice.password_hash, PASSWORD);
    assert!(alice.password_hash.starts_with("$argon2"));
    assert_eq!(alice.avatar, DEFAULT_AVATAR);
    assert!(alice.is_active);
    assert!(!alice.is_admin);
}

#[rstest]
#[tokio::test]
async fn test_duplicate_email_is_rejected_without_new_row(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    board.user("alice").await;
    let form = RegisterForm {
        username: "alice2".into(),
        email: "alice@example.com".into(),
        password: PASSWORD.into(),
        confirm_password: PASSWORD.into(),
    };

    // Act
    let err = accounts::register(&board.ctx, form).await.unwrap_err();

    // Assert
    let errors = err.field_errors().expect("expected field errors");
    assert!(errors.get("email").is_some());
    assert!(errors.get("username").is_none());
    assert_eq!(user::Entity::find().count(&board.ctx.db).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_login_session_resolves_until_logout(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;

    // Act
    let (user, session) = accounts::authenticate(&board.ctx, login_form("alice@example.com", PASSWORD, false))
        .await
        .unwrap();
    let identity = board.ctx.identify(Some(&session.token)).await.unwrap();
    accounts::logout(&board.ctx, &session.token).await.unwrap();
    let after_logout = board.ctx.identify(Some(&session.token)).await.unwrap();

    // Assert
    assert_eq!(user.id, alice.id);
    assert_eq!(identity.user().map(|u| u.id), Some(alice.id));
    assert!(!after_logout.is_authenticated());
    assert_eq!(session::Entity::find().count(&board.ctx.db).await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn test_remember_me_picks_the_long_lifetime(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    board.user("alice").await;

    // Act
    let (_, short) = accounts::authenticate(&board.ctx, login_form("alice@example.com", PASSWORD, false))
        .await
        .unwrap();
    let (_, long) = accounts::authenticate(&board.ctx, login_form("alice@example.com", PASSWORD, true))
        .await
        .unwrap();

    // Assert
    let now = Utc::now();
    assert!(short.expires_at - now <= board.ctx.config.session_ttl);
    assert!(long.expires_at - now > board.ctx.config.session_ttl);
    assert!(long.expires_at - now <= board.ctx.config.remember_ttl);
}

#[rstest]
#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    board.user("alice").await;

    // Act
    let wrong_password = accounts::authenticate(&board.ctx, login_form("alice@example.com", "nope", false)).await;
    let unknown_email = accounts::authenticate(&board.ctx, login_form("bob@example.com", PASSWORD, false)).await;

    // Assert
    assert!(matches!(wrong_password, Err(ForumError::InvalidCredentials)));
    assert!(matches!(unknown_email, Err(ForumError::InvalidCredentials)));
}

#[rstest]
#[tokio::test]
async fn test_garbage_token_is_anonymous(#[future] fresh_forum: TestForum) {
    let board = fresh_forum.await;
    let identity = board.ctx.identify(Some("not-a-token")).await.unwrap();
    assert!(!identity.is_authenticated());
    assert!(!board.ctx.identify(None).await.unwrap().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn test_profile_update_stores_thumbnail(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let form = ProfileForm { username: "alicia".into(), email: "alicia@example.com".into(), bio: Some("hi".into()) };
    let upload = AvatarUpload { file_name: "me.png".into(), bytes: png_bytes(600, 300) };

    // Act
    let updated = accounts::update_profile(&board.ctx, alice, form, Some(upload)).await.unwrap();

    // Assert
    assert_eq!(updated.username, "alicia");
    assert_eq!(updated.bio.as_deref(), Some("hi"));
    assert_ne!(updated.avatar, DEFAULT_AVATAR);
    assert!(updated.avatar.ends_with(".png"));
    let stored = board.avatars.path().join(&updated.avatar);
    assert_eq!(image::image_dimensions(stored).unwrap(), (150, 75));
}

#[rstest]
#[tokio::test]
async fn test_profile_update_rejects_taken_username(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    board.user("bob").await;
    let form = ProfileForm { username: "bob".into(), email: "alice@example.com".into(), bio: None };

    // Act
    let err = accounts::update_profile(&board.ctx, alice, form, None).await.unwrap_err();

    // Assert
    let errors = err.field_errors().expect("expected field errors");
    assert!(errors.get("username").is_some());
    assert!(errors.get("email").is_none());
}

#[rstest]
#[tokio::test]
async fn test_bad_avatar_leaves_profile_untouched(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let form = ProfileForm { username: "alice".into(), email: "alice@example.com".into(), bio: None };
    let upload = AvatarUpload { file_name: "me.gif".into(), bytes: b"GIF89a".to_vec() };

    // Act
    let err = accounts::update_profile(&board.ctx, alice.clone(), form, Some(upload)).await.unwrap_err();

    // Assert
    assert!(matches!(err, ForumError::Avatar(_)));
    let stored = user::Entity::find_by_id(alice.id).one(&board.ctx.db).await.unwrap().unwrap();
    assert_eq!(stored.avatar, DEFAULT_AVATAR);
}

#[rstest]
#[tokio::test]
async fn test_deleting_account_removes_everything_it_owns(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let bob = board.user("bob").await;
    let post = board.post(&alice, "Alice's post", "body", None).await;
    let bobs_post = board.post(&bob, "Bob's post", "body", None).await;
    let form = CommentForm { content: "nice".into(), parent_id: None };
    comments::create_comment(&board.ctx, &bobs_post, &alice, form).await.unwrap();
    likes::toggle_like(&board.ctx, &alice, LikeTarget::Post(bobs_post.id)).await.unwrap();
    let (_, session) = accounts::authenticate(&board.ctx, login_form("alice@example.com", PASSWORD, false))
        .await
        .unwrap();

    // Act
    accounts::delete_account(&board.ctx, alice).await.unwrap();

    // Assert
    assert!(post::Entity::find_by_id(post.id).one(&board.ctx.db).await.unwrap().is_none());
    assert!(post::Entity::find_by_id(bobs_post.id).one(&board.ctx.db).await.unwrap().is_some());
    assert_eq!(comment::Entity::find().count(&board.ctx.db).await.unwrap(), 0);
    assert_eq!(like::Entity::find().count(&board.ctx.db).await.unwrap(), 0);
    assert!(!board.ctx.identify(Some(&session.token)).await.unwrap().is_authenticated());
}

#[rstest]
#[tokio::test]
async fn test_blank_username_is_rejected(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let form = RegisterForm {
        username: "   ".into(),
        email: "blank@example.com".into(),
        password: PASSWORD.into(),
        confirm_password: PASSWORD.into(),
    };

    // Act
    let err = accounts::register(&board.ctx, form).await.unwrap_err();

    // Assert
    assert!(err.field_errors().and_then(|e| e.get("username")).is_some());
    assert_eq!(user::Entity::find().count(&board.ctx.db).await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn test_profile_username_is_checked_after_trimming(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let form = ProfileForm { username: "  a  ".into(), email: "alice@example.com".into(), bio: None };

    // Act
    let err = accounts::update_profile(&board.ctx, alice.clone(), form, None).await.unwrap_err();

    // Assert
    assert!(err.field_errors().and_then(|e| e.get("username")).is_some());
    let stored = user::Entity::find_by_id(alice.id).one(&board.ctx.db).await.unwrap().unwrap();
    assert_eq!(stored.username, "alice");
}

#[rstest]
#[tokio::test]
async fn test_failed_profile_save_removes_the_new_avatar(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    user::Entity::delete_by_id(alice.id).exec(&board.ctx.db).await.unwrap();
    let form = ProfileForm { username: "alice".into(), email: "alice@example.com".into(), bio: None };
    let upload = AvatarUpload { file_name: "me.png".into(), bytes: png_bytes(40, 40) };

    // Act
    let result = accounts::update_profile(&board.ctx, alice, form, Some(upload)).await;

    // Assert
    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(board.avatars.path()).unwrap().count(), 0);
}
