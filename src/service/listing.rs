//! Home page, category pages and search.

use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ItemsAndPagesNumber, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};
use tracing::debug;

use super::categories::find_category_by_slug;
use super::views::{AuthorView, CategoryView, PostPage, PostSummary};
use crate::context::ForumContext;
use crate::entities::{category, like, post, post_tag, tag, user};
use crate::error::ForumError;

/// Live like counts per target id for the given like column
/// (`PostId` or `CommentId`).
pub(crate) async fn like_counts<C>(db: &C, target: like::Column, ids: &[i32]) -> Result<HashMap<i32, u64>, DbErr>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Option<i32>, i64)> = like::Entity::find()
        .select_only()
        .column(target)
        .column_as(Expr::col(like::Column::Id).count(), "likes")
        .filter(target.is_in(ids.iter().copied()))
        .group_by(target)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(id, count)| id.map(|id| (id, count.max(0) as u64)))
        .collect())
}

/// Attaches author, category, tags and like count to each post, keeping order.
pub(crate) async fn summarize<C>(db: &C, posts: Vec<post::Model>) -> Result<Vec<PostSummary>, ForumError>
where
    C: ConnectionTrait,
{
    let authors = posts.load_one(user::Entity, db).await?;
    let categories = posts.load_one(category::Entity, db).await?;
    let tags = posts.load_many_to_many(tag::Entity, post_tag::Entity, db).await?;
    let ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let likes = like_counts(db, like::Column::PostId, &ids).await?;

    posts
        .into_iter()
        .zip(authors)
        .zip(categories)
        .zip(tags)
        .map(|(((post, author), category), mut tags)| {
            let author = author.ok_or(ForumError::NotFound("author"))?;
            let category = category.ok_or(ForumError::NotFound("category"))?;
            tags.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(PostSummary {
                id: post.id,
                likes: likes.get(&post.id).copied().unwrap_or(0),
                slug: post.slug,
                title: post.title,
                content: post.content,
                date_posted: post.date_posted,
                last_modified: post.last_modified,
                views: post.views,
                is_pinned: post.is_pinned,
                author: AuthorView::from(author),
                category: CategoryView::from(category),
                tags: tags.into_iter().map(Into::into).collect(),
            })
        })
        .collect()
}

async fn paginate(ctx: &ForumContext, query: Select<post::Entity>, page: Option<u64>) -> Result<PostPage, ForumError> {
    let page = page.unwrap_or(1).max(1);
    let per_page = ctx.config.page_size;
    let paginator = query.paginate(&ctx.db, per_page);
    let ItemsAndPagesNumber { number_of_items, number_of_pages } = paginator.num_items_and_pages().await?;
    // Past the last page there is nothing to fetch, and the offset could overflow.
    let posts = if page > number_of_pages { Vec::new() } else { paginator.fetch_page(page - 1).await? };
    Ok(PostPage {
        items: summarize(&ctx.db, posts).await?,
        page,
        per_page,
        total_items: number_of_items,
        total_pages: number_of_pages,
    })
}

/// Pinned posts first, newest first within each group.
pub async fn home(ctx: &ForumContext, page: Option<u64>) -> Result<PostPage, ForumError> {
    let query = post::Entity::find()
        .order_by_desc(post::Column::IsPinned)
        .order_by_desc(post::Column::DatePosted)
        .order_by_desc(post::Column::Id);
    paginate(ctx, query, page).await
}

/// Posts of one category, newest first.
pub async fn by_category(
    ctx: &ForumContext,
    slug: &str,
    page: Option<u64>,
) -> Result<(CategoryView, PostPage), ForumError> {
    let category = find_category_by_slug(&ctx.db, slug).await?;
    let query = post::Entity::find()
        .filter(post::Column::CategoryId.eq(category.id))
        .order_by_desc(post::Column::DatePosted)
        .order_by_desc(post::Column::Id);
    let posts = paginate(ctx, query, page).await?;
    Ok((category.into(), posts))
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive substring search over titles and contents. An empty query
/// finds nothing. SQLite's LOWER folds ASCII only, so there non-ASCII text
/// matches in its own case.
pub async fn search(ctx: &ForumContext, query: &str) -> Result<Vec<PostSummary>, ForumError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    // Column and pattern are folded by the same LOWER.
    let pattern = format!("%{}%", escape_like(query));
    let matches_column = |column: post::Column| {
        Expr::cust_with_exprs(
            "LOWER($1) LIKE LOWER($2) ESCAPE '\\'",
            [Expr::col((post::Entity, column)).into(), Expr::val(pattern.clone()).into()],
        )
    };
    let posts = post::Entity::find()
        .filter(
            Condition::any()
                .add(matches_column(post::Column::Title))
                .add(matches_column(post::Column::Content)),
        )
        .order_by_desc(post::Column::DatePosted)
        .order_by_desc(post::Column::Id)
        .all(&ctx.db)
        .await?;
    debug!(query, hits = posts.len(), "search");
    summarize(&ctx.db, posts).await
}
