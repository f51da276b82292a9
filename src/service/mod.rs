//! Forum use cases. Each mutating operation runs in one transaction and
//! checks the caller's rights before touching anything.

pub mod accounts;
pub mod categories;
pub mod comments;
pub mod likes;
pub mod listing;
pub mod posts;
pub mod views;
