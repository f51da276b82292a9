use poem::Request;
use poem_openapi::OpenApi;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;

use super::payload::CategoryPage;
use super::{ApiTags, require_user};
use crate::context::ForumContext;
use crate::forms::CategoryForm;
use crate::identity::ensure_admin;
use crate::service::views::CategoryView;
use crate::service::{categories, listing};

pub struct CategoryApi {
    ctx: ForumContext,
}

impl CategoryApi {
    pub fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }
}

#[OpenApi(tag = "ApiTags::Categories")]
impl CategoryApi {
    /// Existing categories (admin only)
    #[oai(path = "/category/new", method = "get")]
    async fn new_category_form(&self, req: &Request) -> poem::Result<Json<Vec<CategoryView>>> {
        let actor = require_user(&self.ctx, req).await?;
        ensure_admin(&actor)?;
        Ok(Json(categories::list_categories(&self.ctx.db).await?))
    }

    /// Create a category (admin only)
    #[oai(path = "/category/new", method = "post")]
    async fn create_category(&self, req: &Request, Json(form): Json<CategoryForm>) -> poem::Result<Json<CategoryView>> {
        let actor = require_user(&self.ctx, req).await?;
        let category = categories::create_category(&self.ctx, &actor, form).await?;
        Ok(Json(category.into()))
    }

    /// Posts in a category, newest first
    #[oai(path = "/category/:slug", method = "get")]
    async fn category_posts(
        &self,
        Path(slug): Path<String>,
        Query(page): Query<Option<u64>>,
    ) -> poem::Result<Json<CategoryPage>> {
        let (category, posts) = listing::by_category(&self.ctx, &slug, page).await?;
        Ok(Json(CategoryPage { category, posts }))
    }
}
