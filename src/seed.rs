//! Startup data: the default category, and the demo data `init-db` loads.

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait};
use tracing::info;

use crate::context::ForumContext;
use crate::entities::{category, post, post_tag, tag, user};
use crate::error::ForumError;
use crate::identity::password::hash_password;

const DEFAULT_CATEGORY: (&str, &str) = ("General", "General discussion");

const STARTER_CATEGORIES: [(&str, &str); 5] = [
    ("General", "General discussion"),
    ("News", "Latest news and updates"),
    ("Help", "Questions and answers"),
    ("Ideas", "Suggestions for improvement"),
    ("Technology", "Talk about technology"),
];

const STARTER_TAGS: [&str; 5] = ["news", "help", "discussion", "ideas", "technology"];

/// Creates the default category when there are none at all.
pub async fn ensure_default_category(ctx: &ForumContext) -> Result<(), ForumError> {
    if category::Entity::find().count(&ctx.db).await? > 0 {
        return Ok(());
    }
    let (name, description) = DEFAULT_CATEGORY;
    category::ActiveModel {
        name: Set(name.to_owned()),
        description: Set(Some(description.to_owned())),
        ..Default::default()
    }
    .insert(&ctx.db)
    .await?;
    info!(name, "created default category");
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub categories_created: usize,
    pub tags_created: usize,
    pub welcome_post_created: bool,
}

/// Admin account, starter categories and tags, and a pinned welcome post.
/// Rows that already exist are left alone, so running it twice is harmless.
pub async fn init_demo_data(ctx: &ForumContext, admin_password: &str) -> Result<SeedReport, ForumError> {
    let mut report = SeedReport::default();
    let txn = ctx.db.begin().await?;

    let admin = match user::Entity::find()
        .filter(user::Column::Username.eq("admin"))
        .one(&txn)
        .await?
    {
        Some(admin) => admin,
        None => {
            report.admin_created = true;
            user::ActiveModel {
                username: Set("admin".to_owned()),
                email: Set("admin@example.com".to_owned()),
                password_hash: Set(hash_password(admin_password)?),
                is_admin: Set(true),
                bio: Set(Some("Forum administrator".to_owned())),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    let mut categories = Vec::new();
    for (name, description) in STARTER_CATEGORIES {
        let existing = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(&txn)
            .await?;
        let category = match existing {
            Some(category) => category,
            None => {
                report.categories_created += 1;
                category::ActiveModel {
                    name: Set(name.to_owned()),
                    description: Set(Some(description.to_owned())),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };
        categories.push(category);
    }

    let mut tags = Vec::new();
    for name in STARTER_TAGS {
        let existing = tag::Entity::find().filter(tag::Column::Name.eq(name)).one(&txn).await?;
        let tag = match existing {
            Some(tag) => tag,
            None => {
                report.tags_created += 1;
                tag::ActiveModel { name: Set(name.to_owned()), ..Default::default() }
                    .insert(&txn)
                    .await?
            }
        };
        tags.push(tag);
    }

    let has_welcome = post::Entity::find()
        .filter(post::Column::UserId.eq(admin.id))
        .filter(post::Column::IsPinned.eq(true))
        .count(&txn)
        .await?
        > 0;
    if !has_welcome {
        let welcome = post::ActiveModel {
            title: Set("Welcome to the forum!".to_owned()),
            content: Set(
                "This is the first post on our forum. Talk, share ideas and help each other out.".to_owned(),
            ),
            user_id: Set(admin.id),
            category_id: Set(categories[0].id),
            is_pinned: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        let links = [&tags[2], &tags[3]].map(|tag| post_tag::ActiveModel {
            post_id: Set(welcome.id),
            tag_id: Set(tag.id),
        });
        post_tag::Entity::insert_many(links).exec_without_returning(&txn).await?;
        report.welcome_post_created = true;
    }

    txn.commit().await?;
    info!(?report, "demo data loaded");
    Ok(report)
}
