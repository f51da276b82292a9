//! A discussion forum served over HTTP: accounts, categorised and tagged posts,
//! threaded comments and likes.

pub mod api;
pub mod avatar;
pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod forms;
pub mod identity;
pub mod migration;
pub mod seed;
pub mod service;
pub mod text;

use poem::middleware::{CookieJarManager, Cors, SizeLimit, Tracing};
use poem::{Endpoint, EndpointExt, Route};
use poem_openapi::OpenApiService;

use crate::api::{AccountApi, CategoryApi, PostApi, ReactionApi};
use crate::context::ForumContext;

/// The whole application: the API at `/` and its Swagger UI at `/docs`.
pub fn build_app(ctx: ForumContext) -> impl Endpoint {
    let max_upload_bytes = ctx.config.max_upload_bytes;
    let apis = (
        AccountApi::new(ctx.clone()),
        PostApi::new(ctx.clone()),
        CategoryApi::new(ctx.clone()),
        ReactionApi::new(ctx),
    );
    let service = OpenApiService::new(apis, "Forum API", env!("CARGO_PKG_VERSION"));
    let ui = service.swagger_ui();

    Route::new()
        .nest("/docs", ui)
        .nest("/", service)
        .with(SizeLimit::new(max_upload_bytes))
        .with(CookieJarManager::new())
        .with(Cors::new())
        .with(Tracing)
}
