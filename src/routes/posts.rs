use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use super::AppState;
use crate::error::AppError;
use crate::models::post::PostInput;
use crate::services::{BlogStore, PostService, TagService, UserService};

/// The edit form: title, content and one repeated `tags` entry per checked box.
#[derive(Deserialize, Debug)]
struct EditPostForm {
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl EditPostForm {
    fn into_parts(self) -> (PostInput, BTreeSet<String>) {
        (
            PostInput {
                title: self.title,
                content: self.content,
            },
            self.tags.into_iter().collect(),
        )
    }
}

async fn new_post_form<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(user_id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let user = st.store.get_user(user_id).await?;

    let mut ctx = tera::Context::new();
    ctx.insert("user", &user);
    st.render("posts/new.html", &ctx)
}

#[tracing::instrument(skip_all)]
async fn create_post<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(user_id): Path<i32>,
    Form(payload): Form<PostInput>,
) -> Result<Redirect, AppError> {
    st.store.create_post(user_id, &payload).await?;
    Ok(Redirect::to(&format!("/users/{user_id}")))
}

async fn show_post<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let detail = st.store.post_with_tags(id).await?;

    let mut ctx = tera::Context::new();
    ctx.insert("post", &detail.post);
    ctx.insert("author", &detail.author);
    ctx.insert("tags", &detail.tags);
    st.render("posts/detail.html", &ctx)
}

async fn edit_post_form<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let detail = st.store.post_with_tags(id).await?;
    let all_tags = st.store.list_tags().await?;

    let mut ctx = tera::Context::new();
    ctx.insert("post", &detail.post);
    ctx.insert("selected", &detail.tag_names());
    ctx.insert("all_tags", &all_tags);
    st.render("posts/edit.html", &ctx)
}

#[tracing::instrument(skip_all)]
async fn update_post<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
    axum_extra::extract::Form(payload): axum_extra::extract::Form<EditPostForm>,
) -> Result<Redirect, AppError> {
    let (input, tag_names) = payload.into_parts();
    st.store.update_post(id, &input, &tag_names).await?;
    Ok(Redirect::to(&format!("/posts/{id}")))
}

#[tracing::instrument(skip_all)]
async fn delete_post<S: BlogStore>(
    State(st): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let post = st.store.get_post(id).await?;
    st.store.delete_post(id).await?;
    Ok(Redirect::to(&format!("/users/{}", post.user_id)))
}

pub fn router<S: BlogStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/users/:id/posts/new",
            get(new_post_form::<S>).post(create_post::<S>),
        )
        .route("/posts/:id", get(show_post::<S>))
        .route("/posts/:id/edit", get(edit_post_form::<S>).post(update_post::<S>))
        .route("/posts/:id/delete", post(delete_post::<S>))
}
