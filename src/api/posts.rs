use poem::Request;
use poem_openapi::OpenApi;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::Json;

use super::payload::{HomePage, RedirectResponse, SearchResults};
use super::{ApiTags, require_user};
use crate::context::ForumContext;
use crate::forms::{CommentForm, PostForm};
use crate::service::views::{CategoryView, CommentView, PostDetail, PostSummary};
use crate::service::{categories, comments, listing, posts};

pub struct PostApi {
    ctx: ForumContext,
}

impl PostApi {
    pub fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    async fn home_page(&self, page: Option<u64>) -> poem::Result<Json<HomePage>> {
        let posts = listing::home(&self.ctx, page).await?;
        let categories = categories::list_categories(&self.ctx.db).await?;
        Ok(Json(HomePage { posts, categories }))
    }
}

#[OpenApi(tag = "ApiTags::Posts")]
impl PostApi {
    /// Front page: pinned posts first, then newest
    #[oai(path = "/", method = "get")]
    async fn index(&self, Query(page): Query<Option<u64>>) -> poem::Result<Json<HomePage>> {
        self.home_page(page).await
    }

    #[oai(path = "/home", method = "get")]
    async fn home(&self, Query(page): Query<Option<u64>>) -> poem::Result<Json<HomePage>> {
        self.home_page(page).await
    }

    /// Categories a new post can be filed under
    #[oai(path = "/post/new", method = "get")]
    async fn new_post_form(&self, req: &Request) -> poem::Result<Json<Vec<CategoryView>>> {
        require_user(&self.ctx, req).await?;
        Ok(Json(categories::list_categories(&self.ctx.db).await?))
    }

    /// Publish a post
    #[oai(path = "/post/new", method = "post")]
    async fn create_post(&self, req: &Request, Json(form): Json<PostForm>) -> poem::Result<Json<PostSummary>> {
        let author = require_user(&self.ctx, req).await?;
        let post = posts::create_post(&self.ctx, &author, form).await?;
        Ok(Json(posts::summary(&self.ctx, post).await?))
    }

    /// A post with its comment threads. Counts as a view.
    #[oai(path = "/post/:slug", method = "get")]
    async fn post_detail(&self, Path(slug): Path<String>) -> poem::Result<Json<PostDetail>> {
        Ok(Json(posts::post_detail(&self.ctx, &slug).await?))
    }

    /// Comment on a post, or reply to one of its comments
    ///
    /// Returns the post's updated comment threads.
    #[oai(path = "/post/:slug", method = "post")]
    async fn add_comment(
        &self,
        req: &Request,
        Path(slug): Path<String>,
        Json(form): Json<CommentForm>,
    ) -> poem::Result<Json<Vec<CommentView>>> {
        let author = require_user(&self.ctx, req).await?;
        let post = posts::find_post_by_slug(&self.ctx.db, &slug).await?;
        comments::create_comment(&self.ctx, &post, &author, form).await?;
        Ok(Json(comments::comment_threads(&self.ctx.db, post.id).await?))
    }

    /// Current values of a post, for editing
    #[oai(path = "/post/:slug/update", method = "get")]
    async fn edit_post_form(&self, req: &Request, Path(slug): Path<String>) -> poem::Result<Json<PostForm>> {
        let editor = require_user(&self.ctx, req).await?;
        Ok(Json(posts::edit_form(&self.ctx, &slug, &editor).await?))
    }

    /// Edit a post (author or admin)
    #[oai(path = "/post/:slug/update", method = "post")]
    async fn update_post(
        &self,
        req: &Request,
        Path(slug): Path<String>,
        Json(form): Json<PostForm>,
    ) -> poem::Result<Json<PostSummary>> {
        let editor = require_user(&self.ctx, req).await?;
        let post = posts::update_post(&self.ctx, &slug, &editor, form).await?;
        Ok(Json(posts::summary(&self.ctx, post).await?))
    }

    /// Delete a post (author or admin)
    #[oai(path = "/post/:slug/delete", method = "post")]
    async fn delete_post(&self, req: &Request, Path(slug): Path<String>) -> poem::Result<RedirectResponse> {
        let actor = require_user(&self.ctx, req).await?;
        posts::delete_post(&self.ctx, &slug, &actor).await?;
        Ok(RedirectResponse::SeeOther("/".to_owned()))
    }

    /// Case-insensitive search over titles and contents
    #[oai(path = "/search", method = "get")]
    async fn search(&self, Query(q): Query<Option<String>>) -> poem::Result<Json<SearchResults>> {
        let query = q.unwrap_or_default();
        let posts = listing::search(&self.ctx, &query).await?;
        Ok(Json(SearchResults { query, posts }))
    }
}
