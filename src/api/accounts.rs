use poem::Request;
use poem::web::cookie::{Cookie, SameSite};
use poem_openapi::param::Query;
use poem_openapi::payload::Json;
use poem_openapi::OpenApi;

use super::payload::{LoginResponse, LoginResult, ProfileUpload, RedirectResponse, RegisterResponse};
use super::{ApiTags, identify, local_redirect, require_user, session_token};
use crate::avatar::AvatarUpload;
use crate::context::ForumContext;
use crate::error::ForumError;
use crate::forms::{LoginForm, ProfileForm, RegisterForm};
use crate::identity::session::SESSION_COOKIE;
use crate::service::accounts;
use crate::service::views::UserProfile;

pub struct AccountApi {
    ctx: ForumContext,
}

impl AccountApi {
    pub fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }
}

#[OpenApi(tag = "ApiTags::Accounts")]
impl AccountApi {
    /// Create an account
    #[oai(path = "/register", method = "post")]
    async fn register(&self, req: &Request, Json(form): Json<RegisterForm>) -> poem::Result<RegisterResponse> {
        if identify(&self.ctx, req).await?.is_authenticated() {
            return Ok(RegisterResponse::Redirect("/".to_owned()));
        }
        let user = accounts::register(&self.ctx, form).await?;
        Ok(RegisterResponse::Created(Json(user.into())))
    }

    /// Log in
    ///
    /// Sets the session cookie and also returns the token for bearer use.
    #[oai(path = "/login", method = "post")]
    async fn login(
        &self,
        req: &Request,
        Query(next): Query<Option<String>>,
        Json(form): Json<LoginForm>,
    ) -> poem::Result<LoginResponse> {
        if identify(&self.ctx, req).await?.is_authenticated() {
            return Ok(LoginResponse::Redirect("/".to_owned()));
        }
        let remember = form.remember;
        let (user, session) = accounts::authenticate(&self.ctx, form).await?;

        let mut cookie = Cookie::new_with_str(SESSION_COOKIE, &session.token);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        if remember {
            let lifetime = (session.expires_at - chrono::Utc::now()).to_std().unwrap_or_default();
            cookie.set_max_age(lifetime);
        }
        req.cookie().add(cookie);

        Ok(LoginResponse::Ok(Json(LoginResult {
            token: session.token,
            expires_at: session.expires_at,
            redirect_to: local_redirect(next),
            user: user.into(),
        })))
    }

    /// Log out
    #[oai(path = "/logout", method = "get")]
    async fn logout(&self, req: &Request) -> poem::Result<RedirectResponse> {
        if let Some(token) = session_token(req) {
            accounts::logout(&self.ctx, &token).await?;
        }
        req.cookie().remove(SESSION_COOKIE);
        Ok(RedirectResponse::SeeOther("/".to_owned()))
    }

    /// Current user's profile
    #[oai(path = "/profile", method = "get")]
    async fn profile(&self, req: &Request) -> poem::Result<Json<UserProfile>> {
        let user = require_user(&self.ctx, req).await?;
        Ok(Json(user.into()))
    }

    /// Update the profile, optionally with a new avatar
    #[oai(path = "/profile", method = "post")]
    async fn update_profile(&self, req: &Request, upload: ProfileUpload) -> poem::Result<Json<UserProfile>> {
        let user = require_user(&self.ctx, req).await?;
        let form = ProfileForm { username: upload.username, email: upload.email, bio: upload.bio };
        let avatar = match upload.avatar {
            // Browsers send an empty part when no file was picked.
            Some(file) if file.file_name().is_some_and(|name| !name.is_empty()) => {
                let file_name = file.file_name().unwrap_or_default().to_owned();
                let bytes = file
                    .into_vec()
                    .await
                    .map_err(|e| ForumError::Internal(format!("failed to read upload: {e}")))?;
                Some(AvatarUpload { file_name, bytes })
            }
            _ => None,
        };
        let user = accounts::update_profile(&self.ctx, user, form, avatar).await?;
        Ok(Json(user.into()))
    }

    /// Delete the current account and everything it posted
    #[oai(path = "/profile/delete", method = "post")]
    async fn delete_account(&self, req: &Request) -> poem::Result<RedirectResponse> {
        let user = require_user(&self.ctx, req).await?;
        accounts::delete_account(&self.ctx, user).await?;
        req.cookie().remove(SESSION_COOKIE);
        Ok(RedirectResponse::SeeOther("/".to_owned()))
    }
}
