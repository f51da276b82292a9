//! Comments and their reply threads.
//!
//! Replies point at their parent by id; threads are rebuilt from the flat rows
//! on read.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, LoaderTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;
use validator::Validate;

use super::listing::like_counts;
use super::views::{AuthorView, CommentView};
use crate::context::ForumContext;
use crate::entities::{comment, like, post, user};
use crate::error::ForumError;
use crate::forms::CommentForm;
use crate::text::sanitize;

pub async fn create_comment(
    ctx: &ForumContext,
    post: &post::Model,
    author: &user::Model,
    form: CommentForm,
) -> Result<comment::Model, ForumError> {
    form.validate()?;
    let txn = ctx.db.begin().await?;

    if let Some(parent_id) = form.parent_id {
        let parent = comment::Entity::find_by_id(parent_id).one(&txn).await?;
        if parent.is_none_or(|p| p.post_id != post.id) {
            return Err(ForumError::field("parent_id", "The comment you are replying to is not on this post."));
        }
    }

    let comment = comment::ActiveModel {
        content: Set(sanitize(&form.content)),
        user_id: Set(author.id),
        post_id: Set(post.id),
        parent_id: Set(form.parent_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(comment_id = comment.id, post_id = post.id, author_id = author.id, "comment added");
    Ok(comment)
}

/// Depth first order of a post's comments as `(index, depth)` pairs. Input is
/// expected oldest first; siblings keep that order. A reply whose parent is
/// not among `comments` is shown at the top level.
pub(crate) fn thread_order(comments: &[comment::Model]) -> Vec<(usize, u32)> {
    let index: HashMap<i32, usize> = comments.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
    let mut children: HashMap<i32, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (i, c) in comments.iter().enumerate() {
        match c.parent_id.filter(|p| index.contains_key(p) && *p != c.id) {
            Some(parent) => children.entry(parent).or_default().push(i),
            None => roots.push(i),
        }
    }

    let mut order = Vec::with_capacity(comments.len());
    let mut visited = HashSet::new();
    let mut stack: Vec<(usize, u32)> = roots.into_iter().rev().map(|i| (i, 0)).collect();
    while let Some((i, depth)) = stack.pop() {
        if !visited.insert(i) {
            continue;
        }
        order.push((i, depth));
        if let Some(kids) = children.get(&comments[i].id) {
            stack.extend(kids.iter().rev().map(|&k| (k, depth + 1)));
        }
    }
    order
}

pub async fn comment_threads<C>(db: &C, post_id: i32) -> Result<Vec<CommentView>, ForumError>
where
    C: ConnectionTrait,
{
    let comments = comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .order_by_asc(comment::Column::DatePosted)
        .order_by_asc(comment::Column::Id)
        .all(db)
        .await?;
    let authors = comments.load_one(user::Entity, db).await?;
    let ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
    let likes = like_counts(db, like::Column::CommentId, &ids).await?;

    thread_order(&comments)
        .into_iter()
        .map(|(i, depth)| {
            let comment = &comments[i];
            let author = authors[i].clone().ok_or(ForumError::NotFound("author"))?;
            Ok(CommentView {
                id: comment.id,
                parent_id: comment.parent_id,
                depth,
                content: comment.content.clone(),
                date_posted: comment.date_posted,
                is_edited: comment.is_edited,
                author: AuthorView::from(author),
                likes: likes.get(&comment.id).copied().unwrap_or(0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(id: i32, parent_id: Option<i32>) -> comment::Model {
        comment::Model {
            id,
            content: format!("c{id}"),
            date_posted: Utc::now(),
            user_id: 1,
            post_id: 1,
            parent_id,
            is_edited: false,
        }
    }

    fn ids(comments: &[comment::Model]) -> Vec<(i32, u32)> {
        thread_order(comments).into_iter().map(|(i, d)| (comments[i].id, d)).collect()
    }

    #[test]
    fn replies_follow_their_parent() {
        let comments = vec![comment(1, None), comment(2, None), comment(3, Some(1)), comment(4, Some(3))];
        assert_eq!(ids(&comments), vec![(1, 0), (3, 1), (4, 2), (2, 0)]);
    }

    #[test]
    fn orphaned_replies_surface_at_top_level() {
        let comments = vec![comment(5, Some(99)), comment(6, Some(5))];
        assert_eq!(ids(&comments), vec![(5, 0), (6, 1)]);
    }

    #[test]
    fn every_comment_appears_once() {
        let comments = vec![comment(1, Some(1)), comment(2, Some(1)), comment(3, None)];
        let order = ids(&comments);
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], (1, 0));
    }
}
