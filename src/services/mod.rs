pub mod cascade;
pub mod memory;
pub mod posts;
pub mod reconcile;
pub mod tags;
pub mod users;

#[cfg(test)]
pub(crate) mod conformance;

use std::time::Duration;

use anyhow::anyhow;
use diesel::prelude::*;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::deadpool::Hook;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{info, trace, trace_span};

use crate::error::StoreError;
use crate::models::user::User;
use crate::schema;

pub use posts::PostService;
pub use tags::TagService;
pub use users::UserService;

pub type Pool = diesel_async::pooled_connection::deadpool::Pool<AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Marker for store handles shared across request handlers.
pub trait Svc: Clone + Send + Sync + 'static {}

/// Everything the presentation layer needs from a store.
pub trait BlogStore: UserService + PostService + TagService {}

impl<T> BlogStore for T where T: UserService + PostService + TagService {}

/// Postgres-backed store. Each multi-step mutation runs in one transaction.
#[derive(Clone)]
pub struct BlogDb {
    db: Pool,
}

impl Svc for BlogDb {}

impl BlogDb {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }

    pub fn connect(
        database_url: &str,
        max_size: usize,
        wait_timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mgr = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

        info!(max_size, "Starting DB pool");
        let pool = Pool::builder(mgr)
            .max_size(max_size)
            .wait_timeout(wait_timeout)
            .post_create(trace_hook("post_create"))
            .pre_recycle(trace_hook("pre_recycle"))
            .runtime(deadpool::Runtime::Tokio1)
            .build()?;

        Ok(Self::new(pool))
    }
}

fn trace_hook(stage: &'static str) -> Hook<AsyncPgConnection> {
    Hook::sync_fn(move |_conn, metrics| {
        trace_span!("dbpool", stage).in_scope(|| trace!(?metrics, "pool hook"));
        Ok(())
    })
}

/// Applies pending embedded migrations over a dedicated connection.
pub async fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn: AsyncConnectionWrapper<AsyncPgConnection> =
            AsyncConnectionWrapper::establish(&url)?;
        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
        info!(count = applied.len(), "migrations applied");
        Ok::<_, anyhow::Error>(())
    })
    .await?
}

pub(crate) async fn find_user(conn: &mut AsyncPgConnection, user_id: i32) -> Result<User, StoreError> {
    use schema::users::dsl::*;

    users
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("user", user_id))
}
