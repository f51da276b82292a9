//! Likes, comment threads and category administration.

mod common;

use common::{TestForum, fresh_forum};
use forum::entities::{category, like};
use forum::error::ForumError;
use forum::forms::{CategoryForm, CommentForm};
use forum::service::likes::{self, LikeTarget};
use forum::service::views::LikeToggle;
use forum::service::{categories, comments, posts};
use rstest::rstest;
use sea_orm::{EntityTrait, PaginatorTrait};

fn reply(content: &str, parent_id: Option<i32>) -> CommentForm {
    CommentForm { content: content.to_owned(), parent_id }
}

#[rstest]
#[tokio::test]
async fn test_toggling_twice_restores_the_count(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let bob = board.user("bob").await;
    let post = board.post(&alice, "Likeable", "body", None).await;
    let target = LikeTarget::Post(post.id);

    // Act
    let first = likes::toggle_like(&board.ctx, &bob, target).await.unwrap();
    let by_author = likes::toggle_like(&board.ctx, &alice, target).await.unwrap();
    let undone = likes::toggle_like(&board.ctx, &bob, target).await.unwrap();

    // Assert
    assert_eq!(first, LikeToggle { likes: 1, liked: true });
    assert_eq!(by_author, LikeToggle { likes: 2, liked: true });
    assert_eq!(undone, LikeToggle { likes: 1, liked: false });
    assert_eq!(likes::count_likes(&board.ctx.db, target).await.unwrap(), 1);
}

#[rstest]
#[tokio::test]
async fn test_liking_a_missing_target_is_not_found(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;

    // Act
    let post = likes::toggle_like(&board.ctx, &alice, LikeTarget::Post(404)).await;
    let comment = likes::toggle_like(&board.ctx, &alice, LikeTarget::Comment(404)).await;

    // Assert
    assert!(matches!(post, Err(ForumError::NotFound(_))));
    assert!(matches!(comment, Err(ForumError::NotFound(_))));
    assert_eq!(like::Entity::find().count(&board.ctx.db).await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn test_comment_likes_are_separate_from_post_likes(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let post = board.post(&alice, "Thread", "body", None).await;
    let comment = comments::create_comment(&board.ctx, &post, &alice, reply("hello", None)).await.unwrap();

    // Act
    likes::toggle_like(&board.ctx, &alice, LikeTarget::Comment(comment.id)).await.unwrap();
    let detail = posts::post_detail(&board.ctx, &post.slug).await.unwrap();

    // Assert
    assert_eq!(detail.post.likes, 0);
    assert_eq!(detail.comments[0].likes, 1);
}

#[rstest]
#[tokio::test]
async fn test_replies_are_threaded_under_their_parent(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let bob = board.user("bob").await;
    let post = board.post(&alice, "Discuss", "body", None).await;

    // Act
    let top = comments::create_comment(&board.ctx, &post, &bob, reply("top", None)).await.unwrap();
    let other = comments::create_comment(&board.ctx, &post, &alice, reply("other", None)).await.unwrap();
    let answer = comments::create_comment(&board.ctx, &post, &alice, reply("answer", Some(top.id))).await.unwrap();
    let threads = comments::comment_threads(&board.ctx.db, post.id).await.unwrap();

    // Assert
    let shape: Vec<(i32, u32)> = threads.iter().map(|c| (c.id, c.depth)).collect();
    assert_eq!(shape, vec![(top.id, 0), (answer.id, 1), (other.id, 0)]);
    assert_eq!(threads[1].author.username, "alice");
}

#[rstest]
#[tokio::test]
async fn test_reply_to_comment_on_another_post_is_rejected(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let first = board.post(&alice, "First", "body", None).await;
    let second = board.post(&alice, "Second", "body", None).await;
    let elsewhere = comments::create_comment(&board.ctx, &first, &alice, reply("here", None)).await.unwrap();

    // Act
    let err = comments::create_comment(&board.ctx, &second, &alice, reply("there", Some(elsewhere.id)))
        .await
        .unwrap_err();

    // Assert
    assert!(err.field_errors().and_then(|e| e.get("parent_id")).is_some());
}

#[rstest]
#[tokio::test]
async fn test_blank_comment_is_a_field_error(#[future] fresh_forum: TestForum) {
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let post = board.post(&alice, "Quiet", "body", None).await;
    let err = comments::create_comment(&board.ctx, &post, &alice, reply("  ", None)).await.unwrap_err();
    assert!(err.field_errors().and_then(|e| e.get("content")).is_some());
}

#[rstest]
#[tokio::test]
async fn test_only_admins_create_categories(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let alice = board.user("alice").await;
    let admin = board.admin("root").await;
    let form = CategoryForm { name: "Rust Talk".into(), description: Some("All things Rust".into()) };

    // Act
    let denied = categories::create_category(&board.ctx, &alice, form.clone()).await;
    let created = categories::create_category(&board.ctx, &admin, form.clone()).await.unwrap();
    let duplicate = categories::create_category(&board.ctx, &admin, form).await;

    // Assert
    assert!(matches!(denied, Err(ForumError::Forbidden)));
    assert_eq!(created.slug, "rust-talk");
    assert!(duplicate.unwrap_err().field_errors().and_then(|e| e.get("name")).is_some());
    assert_eq!(category::Entity::find().count(&board.ctx.db).await.unwrap(), 2);
}

#[rstest]
#[tokio::test]
async fn test_categories_are_listed_by_name(#[future] fresh_forum: TestForum) {
    // Arrange
    let board = fresh_forum.await;
    let admin = board.admin("root").await;
    for name in ["Zebra", "Apples"] {
        let form = CategoryForm { name: name.into(), description: None };
        categories::create_category(&board.ctx, &admin, form).await.unwrap();
    }

    // Act
    let listed = categories::list_categories(&board.ctx.db).await.unwrap();

    // Assert
    let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Apples", "General", "Zebra"]);
}
