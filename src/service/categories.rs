use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use tracing::info;
use validator::Validate;

use super::views::CategoryView;
use crate::context::ForumContext;
use crate::entities::{category, user};
use crate::error::{FieldErrors, ForumError};
use crate::forms::CategoryForm;
use crate::identity::ensure_admin;
use crate::text::slugify;

const SLUG_MAX_LEN: usize = 50;

pub async fn find_category_by_slug<C>(db: &C, slug: &str) -> Result<category::Model, ForumError>
where
    C: ConnectionTrait,
{
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or(ForumError::NotFound("category"))
}

/// All categories by name; the choices offered when writing a post.
pub async fn list_categories<C>(db: &C) -> Result<Vec<CategoryView>, ForumError>
where
    C: ConnectionTrait,
{
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    Ok(categories.into_iter().map(Into::into).collect())
}

/// Admin only. Name and derived slug must both be unused.
pub async fn create_category(
    ctx: &ForumContext,
    actor: &user::Model,
    form: CategoryForm,
) -> Result<category::Model, ForumError> {
    ensure_admin(actor)?;
    form.validate()?;

    let name = form.name.trim().to_owned();
    let slug = slugify(&name);
    let txn = ctx.db.begin().await?;

    let mut errors = FieldErrors::default();
    if slug.is_empty() {
        errors.add("name", "Name must contain letters or digits.");
    } else if slug.len() > SLUG_MAX_LEN {
        errors.add("name", "Name is too long.");
    } else {
        let clash = category::Entity::find()
            .filter(category::Column::Name.eq(name.as_str()).or(category::Column::Slug.eq(slug.as_str())))
            .one(&txn)
            .await?;
        if clash.is_some() {
            errors.add("name", "A category with this name already exists.");
        }
    }
    errors.into_result()?;

    let category = category::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        description: Set(form.description.filter(|d| !d.trim().is_empty())),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(category_id = category.id, slug = %category.slug, "category created");
    Ok(category)
}
