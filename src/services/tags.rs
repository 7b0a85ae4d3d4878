use axum::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::models::post::Post;
use crate::models::tag::*;
use crate::schema;

use super::{cascade, BlogDb, Svc};

#[async_trait]
pub trait TagService<E = StoreError>: Svc {
    /// Fails with `DuplicateName` when another tag already uses the name.
    async fn create_tag(&self, input: &TagInput) -> Result<Tag, E>;
    async fn get_tag(&self, id: i32) -> Result<Tag, E>;
    /// All tags in name order.
    async fn list_tags(&self) -> Result<Vec<Tag>, E>;
    async fn tag_with_posts(&self, id: i32) -> Result<TagDetail, E>;
    async fn update_tag(&self, id: i32, input: &TagInput) -> Result<Tag, E>;
    async fn delete_tag(&self, id: i32) -> Result<(), E>;
}

fn name_conflict(name: &str) -> impl FnOnce(DieselError) -> StoreError + '_ {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::DuplicateName(name.to_owned())
        }
        other => other.into(),
    }
}

async fn find_tag(conn: &mut AsyncPgConnection, tag_id: i32) -> Result<Tag, StoreError> {
    use schema::tags::dsl::*;

    tags.find(tag_id)
        .select(Tag::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| StoreError::not_found("tag", tag_id))
}

#[async_trait]
impl TagService for BlogDb {
    #[instrument(skip(self))]
    async fn create_tag(&self, input: &TagInput) -> Result<Tag, StoreError> {
        let new = input.validate()?;
        let mut conn = self.db.get().await?;

        let tag = diesel::insert_into(schema::tags::table)
            .values(&new)
            .returning(Tag::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(name_conflict(&new.name))?;

        debug!(tag_id = tag.id, "tag created");
        Ok(tag)
    }

    #[instrument(skip(self))]
    async fn get_tag(&self, id: i32) -> Result<Tag, StoreError> {
        let mut conn = self.db.get().await?;
        find_tag(&mut conn, id).await
    }

    #[instrument(skip(self))]
    async fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        use schema::tags::dsl::*;

        let mut conn = self.db.get().await?;
        let ts: Vec<Tag> = tags
            .order(name.asc())
            .select(Tag::as_select())
            .load(&mut conn)
            .await?;
        Ok(ts)
    }

    #[instrument(skip(self))]
    async fn tag_with_posts(&self, id: i32) -> Result<TagDetail, StoreError> {
        use schema::{posts, posts_tags};

        let mut conn = self.db.get().await?;

        let tag = find_tag(&mut conn, id).await?;
        let posts = posts_tags::table
            .inner_join(posts::table)
            .filter(posts_tags::tag_id.eq(tag.id))
            .order(posts::id.asc())
            .select(Post::as_select())
            .load(&mut conn)
            .await?;

        Ok(TagDetail { tag, posts })
    }

    #[instrument(skip(self))]
    async fn update_tag(&self, tag_id: i32, input: &TagInput) -> Result<Tag, StoreError> {
        let changes = input.validate()?;
        let mut conn = self.db.get().await?;

        diesel::update(schema::tags::table.find(tag_id))
            .set(&changes)
            .returning(Tag::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(name_conflict(&changes.name))?
            .ok_or_else(|| StoreError::not_found("tag", tag_id))
    }

    #[instrument(skip(self))]
    async fn delete_tag(&self, tag_id: i32) -> Result<(), StoreError> {
        let mut conn = self.db.get().await?;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let tag = find_tag(conn, tag_id).await?;
                cascade::delete_tag(conn, tag.id).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }
}
