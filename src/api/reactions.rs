use poem::Request;
use poem_openapi::OpenApi;
use poem_openapi::param::Path;
use poem_openapi::payload::Json;

use super::{ApiTags, require_user};
use crate::context::ForumContext;
use crate::service::likes::{self, LikeTarget};
use crate::service::views::LikeToggle;

pub struct ReactionApi {
    ctx: ForumContext,
}

impl ReactionApi {
    pub fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }
}

#[OpenApi(tag = "ApiTags::Reactions")]
impl ReactionApi {
    /// Like a post, or take the like back
    ///
    /// The post is addressed by id here; the segment shares its name with the
    /// other `/post/:slug` routes.
    #[oai(path = "/post/:slug/like", method = "post")]
    async fn like_post(&self, req: &Request, #[oai(name = "slug")] Path(post_id): Path<i32>) -> poem::Result<Json<LikeToggle>> {
        let user = require_user(&self.ctx, req).await?;
        Ok(Json(likes::toggle_like(&self.ctx, &user, LikeTarget::Post(post_id)).await?))
    }

    /// Like a comment, or take the like back
    #[oai(path = "/comment/:comment_id/like", method = "post")]
    async fn like_comment(&self, req: &Request, Path(comment_id): Path<i32>) -> poem::Result<Json<LikeToggle>> {
        let user = require_user(&self.ctx, req).await?;
        Ok(Json(likes::toggle_like(&self.ctx, &user, LikeTarget::Comment(comment_id)).await?))
    }
}
