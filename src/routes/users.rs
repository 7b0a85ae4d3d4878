use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};

use super::AppState;
use crate::error::AppError;
use crate::models::user::UserInput;
use crate::services::{BlogStore, UserService};

async fn list_users<S: BlogStore>(State(st): State<AppState<S>>) -> Result<Html<String>, AppError> {
    let users = st.store.list_users().await?;

    let mut ctx = tera::Context::new();
    ctx.insert("users", &users);
    st.render("users/list.html", &ctx)
}

async fn new_user_form<S: BlogStore>(State(st): State<AppState<S>>) -> Result<Html<String>, AppError> {
    st.render("users/new.html", &tera::Context::new())
}

#[tracing::instrument(skip_all)]
async fn create_user<S: BlogStore>(
    State(st): State<AppState<S>>,
    Form(payload): Form<UserInput>,
) -> Result<Redirect, AppError> {
    st.store.create_user(&payload).await?;
    Ok(Redirect::to("/users"))
}

async fn show_user<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let detail = st.store.user_with_posts(id).await?;

    let mut ctx = tera::Context::new();
    ctx.insert("user", &detail.user);
    ctx.insert("posts", &detail.posts);
    st.render("users/detail.html", &ctx)
}

async fn edit_user_form<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let user = st.store.get_user(id).await?;

    let mut ctx = tera::Context::new();
    ctx.insert("user", &user);
    st.render("users/edit.html", &ctx)
}

#[tracing::instrument(skip_all)]
async fn update_user<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
    Form(payload): Form<UserInput>,
) -> Result<Redirect, AppError> {
    st.store.update_user(id, &payload).await?;
    Ok(Redirect::to("/users"))
}

#[tracing::instrument(skip_all)]
async fn delete_user<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    st.store.delete_user(id).await?;
    Ok(Redirect::to("/users"))
}

pub fn router<S: BlogStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/users", get(list_users::<S>))
        .route("/users/new", get(new_user_form::<S>).post(create_user::<S>))
        .route("/users/:id", get(show_user::<S>))
        .route("/users/:id/edit", get(edit_user_form::<S>).post(update_user::<S>))
        .route("/users/:id/delete", post(delete_user::<S>))
}
