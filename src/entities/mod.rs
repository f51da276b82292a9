//! SeaORM entities for the forum schema.

pub mod category;
pub mod comment;
pub mod like;
pub mod post;
pub mod post_tag;
pub mod session;
pub mod tag;
pub mod user;
