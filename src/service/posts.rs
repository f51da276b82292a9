//! Writing, editing, deleting and reading posts.

use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;
use validator::Validate;

use super::comments::comment_threads;
use super::listing::summarize;
use super::views::{PostDetail, PostSummary};
use crate::context::ForumContext;
use crate::entities::{category, post, post_tag, tag, user};
use crate::error::ForumError;
use crate::forms::PostForm;
use crate::identity::ensure_can_modify_post;
use crate::text::{sanitize, slugify, split_tag_names};

pub async fn find_post_by_slug<C>(db: &C, slug: &str) -> Result<post::Model, ForumError>
where
    C: ConnectionTrait,
{
    post::Entity::find()
        .filter(post::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or(ForumError::NotFound("post"))
}

async fn ensure_category<C>(db: &C, category_id: i32) -> Result<(), ForumError>
where
    C: ConnectionTrait,
{
    match category::Entity::find_by_id(category_id).one(db).await? {
        Some(_) => Ok(()),
        None => Err(ForumError::field("category_id", "Not a valid choice.")),
    }
}

/// Width of the tag name and slug columns.
const TAG_MAX_LEN: usize = 50;

/// Existing tag with this exact name, else one whose slug matches, else a new one.
async fn resolve_tag<C>(db: &C, name: &str) -> Result<tag::Model, ForumError>
where
    C: ConnectionTrait,
{
    if name.chars().count() > TAG_MAX_LEN {
        return Err(ForumError::field(
            "tags",
            format!("Tag names can be at most {TAG_MAX_LEN} characters long."),
        ));
    }
    if let Some(tag) = tag::Entity::find().filter(tag::Column::Name.eq(name)).one(db).await? {
        return Ok(tag);
    }
    let slug = slugify(name);
    if slug.is_empty() || slug.len() > TAG_MAX_LEN {
        return Err(ForumError::field("tags", format!("\"{name}\" is not a usable tag name.")));
    }
    if let Some(tag) = tag::Entity::find().filter(tag::Column::Slug.eq(slug.as_str())).one(db).await? {
        return Ok(tag);
    }
    let tag = tag::ActiveModel {
        name: Set(name.to_owned()),
        slug: Set(slug),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(tag)
}

/// Links the tags named in `csv` to the post, creating missing tags.
async fn attach_tags<C>(db: &C, post_id: i32, csv: Option<&str>) -> Result<(), ForumError>
where
    C: ConnectionTrait,
{
    let mut tag_ids = Vec::new();
    let mut seen = HashSet::new();
    for name in split_tag_names(csv.unwrap_or_default()) {
        let tag = resolve_tag(db, &name).await?;
        if seen.insert(tag.id) {
            tag_ids.push(tag.id);
        }
    }
    if tag_ids.is_empty() {
        return Ok(());
    }
    let links = tag_ids.into_iter().map(|tag_id| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(tag_id),
    });
    post_tag::Entity::insert_many(links).exec_without_returning(db).await?;
    Ok(())
}

pub async fn create_post(ctx: &ForumContext, author: &user::Model, form: PostForm) -> Result<post::Model, ForumError> {
    form.validate()?;
    let txn = ctx.db.begin().await?;
    ensure_category(&txn, form.category_id).await?;

    let post = post::ActiveModel {
        title: Set(form.title.trim().to_owned()),
        content: Set(sanitize(&form.content)),
        user_id: Set(author.id),
        category_id: Set(form.category_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    attach_tags(&txn, post.id, form.tags.as_deref()).await?;
    txn.commit().await?;

    info!(post_id = post.id, slug = %post.slug, author_id = author.id, "post created");
    Ok(post)
}

/// Replaces title, content, category and the whole tag set. The slug stays.
pub async fn update_post(
    ctx: &ForumContext,
    slug: &str,
    editor: &user::Model,
    form: PostForm,
) -> Result<post::Model, ForumError> {
    let post = find_post_by_slug(&ctx.db, slug).await?;
    ensure_can_modify_post(editor, &post)?;
    form.validate()?;

    let txn = ctx.db.begin().await?;
    ensure_category(&txn, form.category_id).await?;

    let mut active: post::ActiveModel = post.into();
    active.title = Set(form.title.trim().to_owned());
    active.content = Set(sanitize(&form.content));
    active.category_id = Set(form.category_id);
    let post = active.update(&txn).await?;

    post_tag::Entity::delete_many()
        .filter(post_tag::Column::PostId.eq(post.id))
        .exec(&txn)
        .await?;
    attach_tags(&txn, post.id, form.tags.as_deref()).await?;
    txn.commit().await?;

    info!(post_id = post.id, editor_id = editor.id, "post updated");
    Ok(post)
}

/// Comments, likes and tag links go with the post; the category stays.
pub async fn delete_post(ctx: &ForumContext, slug: &str, actor: &user::Model) -> Result<(), ForumError> {
    let post = find_post_by_slug(&ctx.db, slug).await?;
    ensure_can_modify_post(actor, &post)?;
    let post_id = post.id;
    post.delete(&ctx.db).await?;
    info!(post_id, actor_id = actor.id, "post deleted");
    Ok(())
}

/// The current values of a post in form shape, for the edit screen.
pub async fn edit_form(ctx: &ForumContext, slug: &str, editor: &user::Model) -> Result<PostForm, ForumError> {
    let post = find_post_by_slug(&ctx.db, slug).await?;
    ensure_can_modify_post(editor, &post)?;
    let tags = post
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Name)
        .all(&ctx.db)
        .await?;
    Ok(PostForm {
        title: post.title,
        content: post.content,
        category_id: post.category_id,
        tags: Some(tags.into_iter().map(|t| t.name).collect::<Vec<_>>().join(", ")),
    })
}

pub async fn summary(ctx: &ForumContext, post: post::Model) -> Result<PostSummary, ForumError> {
    summarize(&ctx.db, vec![post]).await?.pop().ok_or(ForumError::NotFound("post"))
}

/// Full post with its threaded comments. Counts as a view.
pub async fn post_detail(ctx: &ForumContext, slug: &str) -> Result<PostDetail, ForumError> {
    let mut post = find_post_by_slug(&ctx.db, slug).await?;
    post::Entity::update_many()
        .col_expr(post::Column::Views, Expr::col(post::Column::Views).add(1))
        .filter(post::Column::Id.eq(post.id))
        .exec(&ctx.db)
        .await?;
    post.views += 1;

    let comments = comment_threads(&ctx.db, post.id).await?;
    Ok(PostDetail { post: summary(ctx, post).await?, comments })
}
