//! HTTP surface. Each group of operations is its own `OpenApi` impl holding a
//! clone of the [`ForumContext`]; errors travel as [`ForumError`] and render
//! through its `ResponseError` impl.

mod accounts;
mod categories;
mod payload;
mod posts;
mod reactions;

use poem::Request;
use poem::http::header;
use poem_openapi::Tags;

pub use accounts::AccountApi;
pub use categories::CategoryApi;
pub use posts::PostApi;
pub use reactions::ReactionApi;

use crate::context::ForumContext;
use crate::entities::user;
use crate::error::ForumError;
use crate::identity::Identity;
use crate::identity::session::SESSION_COOKIE;

#[derive(Tags)]
enum ApiTags {
    /// Registration, login and profiles
    Accounts,
    /// Posts and their comments
    Posts,
    /// Categories
    Categories,
    /// Likes on posts and comments
    Reactions,
}

/// Session token from the cookie, or from an `Authorization: Bearer` header.
fn session_token(req: &Request) -> Option<String> {
    if let Some(cookie) = req.cookie().get(SESSION_COOKIE) {
        return Some(cookie.value_str().to_owned());
    }
    req.header(header::AUTHORIZATION)
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
}

fn requested_path(req: &Request) -> String {
    let uri = req.original_uri();
    uri.path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned())
}

async fn identify(ctx: &ForumContext, req: &Request) -> Result<Identity, ForumError> {
    ctx.identify(session_token(req).as_deref()).await
}

/// The logged in user, or a redirect to the login page that comes back here.
async fn require_user(ctx: &ForumContext, req: &Request) -> Result<user::Model, ForumError> {
    identify(ctx, req).await?.require(requested_path(req))
}

/// Only same-site paths are followed after login.
fn local_redirect(next: Option<String>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => path,
        _ => "/".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_stay_on_site() {
        assert_eq!(local_redirect(Some("/post/new".into())), "/post/new");
        assert_eq!(local_redirect(Some("https://evil.example".into())), "/");
        assert_eq!(local_redirect(Some("//evil.example".into())), "/");
        assert_eq!(local_redirect(None), "/");
    }
}
