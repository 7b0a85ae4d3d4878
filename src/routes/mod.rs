pub mod posts;
pub mod tags;
pub mod users;

use std::sync::Arc;

use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::Router;
use tera::Tera;

use crate::error::AppError;
use crate::middleware::logging::HttpLoggingExt;
use crate::services::BlogStore;

/// Shared by every handler: the injected store and the loaded templates.
#[derive(Clone)]
pub struct AppState<S> {
    pub store: S,
    pub tera: Arc<Tera>,
}

impl<S> AppState<S> {
    pub fn new(store: S, tera: Tera) -> Self {
        Self {
            store,
            tera: Arc::new(tera),
        }
    }

    fn render(&self, template: &str, ctx: &tera::Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(template, ctx)?))
    }
}

pub fn router<S: BlogStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/users") }))
        .merge(users::router::<S>())
        .merge(posts::router::<S>())
        .merge(tags::router::<S>())
        .with_state(state)
        .with_http_logging()
}
