use std::collections::BTreeSet;

use axum::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::models::post::*;
use crate::models::tag::Tag;
use crate::schema;

use super::{cascade, find_user, reconcile, BlogDb, Svc};

#[async_trait]
pub trait PostService<E = StoreError>: Svc {
    /// Fails with `NotFound` for the user when `user_id` does not exist.
    async fn create_post(&self, user_id: i32, input: &PostInput) -> Result<Post, E>;
    async fn get_post(&self, id: i32) -> Result<Post, E>;
    async fn post_with_tags(&self, id: i32) -> Result<PostDetail, E>;
    /// Replaces title and content and reconciles the tag set to exactly
    /// `tag_names`. Nothing is written unless every name resolves.
    async fn update_post(
        &self,
        id: i32,
        input: &PostInput,
        tag_names: &BTreeSet<String>,
    ) -> Result<Post, E>;
    async fn delete_post(&self, id: i32) -> Result<(), E>;
}

async fn find_post(conn: &mut AsyncPgConnection, post_id: i32) -> Result<Post, StoreError> {
    use schema::posts::dsl::*;

    posts
        .find(post_id)
        .select(Post::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("post", post_id))
}

#[async_trait]
impl PostService for BlogDb {
    #[instrument(skip(self))]
    async fn create_post(&self, user_id: i32, input: &PostInput) -> Result<Post, StoreError> {
        let PostChanges { title, content } = input.validate()?;
        let mut conn = self.db.get().await?;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let author = find_user(conn, user_id).await?;
                let post = diesel::insert_into(schema::posts::table)
                    .values(NewPost {
                        user_id: author.id,
                        title,
                        content,
                    })
                    .returning(Post::as_returning())
                    .get_result(conn)
                    .await?;

                debug!(post_id = post.id, user_id, "post created");
                Ok(post)
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_post(&self, id: i32) -> Result<Post, StoreError> {
        let mut conn = self.db.get().await?;
        find_post(&mut conn, id).await
    }

    #[instrument(skip(self))]
    async fn post_with_tags(&self, id: i32) -> Result<PostDetail, StoreError> {
        use schema::{posts_tags, tags};

        let mut conn = self.db.get().await?;

        let post = find_post(&mut conn, id).await?;
        let author = find_user(&mut conn, post.user_id).await?;
        let tags = posts_tags::table
            .inner_join(tags::table)
            .filter(posts_tags::post_id.eq(post.id))
            .order(tags::name.asc())
            .select(Tag::as_select())
            .load(&mut conn)
            .await?;

        Ok(PostDetail { post, author, tags })
    }

    #[instrument(skip(self))]
    async fn update_post(
        &self,
        post_id: i32,
        input: &PostInput,
        tag_names: &BTreeSet<String>,
    ) -> Result<Post, StoreError> {
        let changes = input.validate()?;
        let mut conn = self.db.get().await?;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let post = diesel::update(schema::posts::table.find(post_id))
                    .set(&changes)
                    .returning(Post::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| StoreError::not_found("post", post_id))?;

                reconcile::replace_post_tags(conn, post.id, tag_names).await?;
                Ok(post)
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, post_id: i32) -> Result<(), StoreError> {
        let mut conn = self.db.get().await?;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let post = find_post(conn, post_id).await?;
                cascade::delete_posts(conn, &[post.id]).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }
}
