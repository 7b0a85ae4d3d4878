use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};

use super::AppState;
use crate::error::AppError;
use crate::models::tag::TagInput;
use crate::services::{BlogStore, TagService};

async fn list_tags<S: BlogStore>(State(st): State<AppState<S>>) -> Result<Html<String>, AppError> {
    let tags = st.store.list_tags().await?;

    let mut ctx = tera::Context::new();
    ctx.insert("tags", &tags);
    st.render("tags/list.html", &ctx)
}

async fn new_tag_form<S: BlogStore>(State(st): State<AppState<S>>) -> Result<Html<String>, AppError> {
    st.render("tags/new.html", &tera::Context::new())
}

#[tracing::instrument(skip_all)]
async fn create_tag<S: BlogStore>(
    State(st): State<AppState<S>>,
    Form(payload): Form<TagInput>,
) -> Result<Redirect, AppError> {
    st.store.create_tag(&payload).await?;
    Ok(Redirect::to("/tags"))
}

async fn show_tag<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let detail = st.store.tag_with_posts(id).await?;

    let mut ctx = tera::Context::new();
    ctx.insert("tag", &detail.tag);
    ctx.insert("posts", &detail.posts);
    st.render("tags/detail.html", &ctx)
}

async fn edit_tag_form<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let tag = st.store.get_tag(id).await?;

    let mut ctx = tera::Context::new();
    ctx.insert("tag", &tag);
    st.render("tags/edit.html", &ctx)
}

#[tracing::instrument(skip_all)]
async fn update_tag<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
    Form(payload): Form<TagInput>,
) -> Result<Redirect, AppError> {
    st.store.update_tag(id, &payload).await?;
    Ok(Redirect::to("/tags"))
}

#[tracing::instrument(skip_all)]
async fn delete_tag<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    st.store.delete_tag(id).await?;
    Ok(Redirect::to("/tags"))
}

pub fn router<S: BlogStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/tags", get(list_tags::<S>))
        .route("/tags/new", get(new_tag_form::<S>).post(create_tag::<S>))
        .route("/tags/:id", get(show_tag::<S>))
        .route("/tags/:id/edit", get(edit_tag_form::<S>).post(update_tag::<S>))
        .route("/tags/:id/delete", post(delete_tag::<S>))
}
