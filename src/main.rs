mod config;
mod error;
mod middleware;
mod models;
mod routes;
mod schema;
mod services;

use axum::Router;
use tera::Tera;
use tracing::{info, warn};

use config::AppCfg;
use routes::AppState;
use services::memory::MemoryStore;
use services::BlogDb;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppCfg::load()?;

    // initialize tracing
    config::tracing::init(cfg.log_filter.as_deref());

    let tera = Tera::new(&cfg.templates)?;

    let app: Router = match cfg.database_url.as_deref() {
        Some(url) => {
            if cfg.run_migrations {
                services::run_migrations(url).await?;
            }
            let store = BlogDb::connect(url, cfg.db_pool_size, cfg.db_wait_timeout())?;
            routes::router(AppState::new(store, tera))
        }
        None => {
            warn!("no database_url configured, data lives in memory only");
            routes::router(AppState::new(MemoryStore::new(), tera))
        }
    };

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!("starting listening at {}", cfg.bind_addr);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
