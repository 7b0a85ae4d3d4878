use axum::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::models::post::Post;
use crate::models::user::*;
use crate::schema;

use super::{cascade, find_user, BlogDb, Svc};

#[async_trait]
pub trait UserService<E = StoreError>: Svc {
    async fn create_user(&self, input: &UserInput) -> Result<User, E>;
    async fn get_user(&self, id: i32) -> Result<User, E>;
    /// All users in id order.
    async fn list_users(&self) -> Result<Vec<User>, E>;
    async fn user_with_posts(&self, id: i32) -> Result<UserDetail, E>;
    async fn update_user(&self, id: i32, input: &UserInput) -> Result<User, E>;
    /// Deletes the user along with their posts and those posts' tag links.
    async fn delete_user(&self, id: i32) -> Result<(), E>;
}

#[async_trait]
impl UserService for BlogDb {
    #[instrument(skip(self))]
    async fn create_user(&self, input: &UserInput) -> Result<User, StoreError> {
        use schema::users::dsl::*;

        let new = input.validate()?;
        let mut conn = self.db.get().await?;

        let user = diesel::insert_into(users)
            .values(&new)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await?;

        debug!(user_id = user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        let mut conn = self.db.get().await?;
        find_user(&mut conn, id).await
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        use schema::users::dsl::*;

        let mut conn = self.db.get().await?;
        let us: Vec<User> = users
            .order(id.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await?;
        Ok(us)
    }

    #[instrument(skip(self))]
    async fn user_with_posts(&self, id: i32) -> Result<UserDetail, StoreError> {
        let mut conn = self.db.get().await?;

        let user = find_user(&mut conn, id).await?;
        let posts = Post::belonging_to(&user)
            .order(schema::posts::id.asc())
            .select(Post::as_select())
            .load(&mut conn)
            .await?;

        Ok(UserDetail { user, posts })
    }

    #[instrument(skip(self))]
    async fn update_user(&self, user_id: i32, input: &UserInput) -> Result<User, StoreError> {
        use schema::users::dsl::*;

        let changes = input.validate()?;
        let mut conn = self.db.get().await?;

        diesel::update(users.find(user_id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| StoreError::not_found("user", user_id))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: i32) -> Result<(), StoreError> {
        let mut conn = self.db.get().await?;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let user = find_user(conn, user_id).await?;
                let post_ids: Vec<i32> = Post::belonging_to(&user)
                    .select(schema::posts::id)
                    .load(conn)
                    .await?;

                let posts = cascade::delete_posts(conn, &post_ids).await?;
                diesel::delete(schema::users::table.find(user.id))
                    .execute(conn)
                    .await?;

                debug!(user_id, posts, "user deleted");
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }
}
