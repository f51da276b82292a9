use chrono::{DateTime, Utc};
use poem_openapi::types::multipart::Upload;
use poem_openapi::{ApiResponse, Multipart, Object, payload::Json};

use crate::service::views::{CategoryView, PostPage, PostSummary, UserProfile};

#[derive(Debug, Object)]
pub struct LoginResult {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Where the client should go next.
    pub redirect_to: String,
    pub user: UserProfile,
}

#[derive(ApiResponse)]
pub enum LoginResponse {
    #[oai(status = 200)]
    Ok(Json<LoginResult>),
    /// Already logged in.
    #[oai(status = 303)]
    Redirect(#[oai(header = "Location")] String),
}

#[derive(ApiResponse)]
pub enum RegisterResponse {
    #[oai(status = 201)]
    Created(Json<UserProfile>),
    /// Already logged in.
    #[oai(status = 303)]
    Redirect(#[oai(header = "Location")] String),
}

#[derive(ApiResponse)]
pub enum RedirectResponse {
    #[oai(status = 303)]
    SeeOther(#[oai(header = "Location")] String),
}

#[derive(Debug, Multipart)]
pub struct ProfileUpload {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    /// jpg, jpeg or png.
    pub avatar: Option<Upload>,
}

#[derive(Debug, Object)]
pub struct HomePage {
    pub posts: PostPage,
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Object)]
pub struct CategoryPage {
    pub category: CategoryView,
    pub posts: PostPage,
}

#[derive(Debug, Object)]
pub struct SearchResults {
    pub query: String,
    pub posts: Vec<PostSummary>,
}
