//! Data access for users, links and votes
//!
//! Resolvers only see the `Store` trait. `PgStore` is the production
//! implementation over PostgreSQL; `MemoryStore` keeps everything in
//! process with the same observable semantics.

pub mod links;
pub mod memory;
pub mod users;
pub mod votes;

use crate::error::Result;
use crate::models::{FeedQuery, Link, LinkChanges, NewLink, NewUser, User};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

pub use memory::MemoryStore;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `DuplicateEmail` when the email is taken
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_users_by_ids(&self, user_ids: &[i32]) -> Result<Vec<User>>;

    async fn create_link(&self, link: NewLink) -> Result<Link>;

    async fn find_link(&self, link_id: i32) -> Result<Option<Link>>;

    /// The page of links selected by `query`
    async fn find_links(&self, query: &FeedQuery) -> Result<Vec<Link>>;

    /// Number of links matching `query.filter`; pagination is ignored
    async fn count_links(&self, query: &FeedQuery) -> Result<i64>;

    /// `None` when no link has this id
    async fn update_link(&self, link_id: i32, changes: LinkChanges) -> Result<Option<Link>>;

    /// `false` when no link has this id
    async fn delete_link(&self, link_id: i32) -> Result<bool>;

    async fn find_links_by_posters(&self, user_ids: &[i32]) -> Result<Vec<Link>>;

    /// `(link_id, voter)` pairs for every link in `link_ids`
    async fn find_voters(&self, link_ids: &[i32]) -> Result<Vec<(i32, User)>>;

    /// Idempotent; `false` when no link has this id
    async fn add_vote(&self, link_id: i32, user_id: i32) -> Result<bool>;
}

/// PostgreSQL-backed store
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        users::create_user(&self.pool, &user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        users::find_by_email(&self.pool, email).await
    }

    async fn find_users_by_ids(&self, user_ids: &[i32]) -> Result<Vec<User>> {
        users::find_by_ids(&self.pool, user_ids).await
    }

    async fn create_link(&self, link: NewLink) -> Result<Link> {
        links::create_link(&self.pool, &link).await
    }

    async fn find_link(&self, link_id: i32) -> Result<Option<Link>> {
        links::find_by_id(&self.pool, link_id).await
    }

    async fn find_links(&self, query: &FeedQuery) -> Result<Vec<Link>> {
        links::find_feed(&self.pool, query).await
    }

    async fn count_links(&self, query: &FeedQuery) -> Result<i64> {
        links::count_feed(&self.pool, query).await
    }

    async fn update_link(&self, link_id: i32, changes: LinkChanges) -> Result<Option<Link>> {
        links::update_link(&self.pool, link_id, &changes).await
    }

    async fn delete_link(&self, link_id: i32) -> Result<bool> {
        links::delete_link(&self.pool, link_id).await
    }

    async fn find_links_by_posters(&self, user_ids: &[i32]) -> Result<Vec<Link>> {
        links::find_by_posters(&self.pool, user_ids).await
    }

    async fn find_voters(&self, link_ids: &[i32]) -> Result<Vec<(i32, User)>> {
        votes::find_voters(&self.pool, link_ids).await
    }

    async fn add_vote(&self, link_id: i32, user_id: i32) -> Result<bool> {
        votes::add_vote(&self.pool, link_id, user_id).await
    }
}
