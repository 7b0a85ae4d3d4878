//! Explicit delete cascades.
//!
//! The schema's foreign keys have no `ON DELETE` action, so every dependent
//! row is removed here first. Callers run these inside the transaction that
//! also removes the parent row.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::error::StoreError;
use crate::schema::{posts, posts_tags, tags};

/// Removes the given posts and all of their tag associations.
/// Returns the number of posts deleted.
pub async fn delete_posts(conn: &mut AsyncPgConnection, post_ids: &[i32]) -> Result<usize, StoreError> {
    if post_ids.is_empty() {
        return Ok(0);
    }

    let links = diesel::delete(posts_tags::table.filter(posts_tags::post_id.eq_any(post_ids.to_vec())))
        .execute(conn)
        .await?;
    let removed = diesel::delete(posts::table.filter(posts::id.eq_any(post_ids.to_vec())))
        .execute(conn)
        .await?;

    debug!(links, posts = removed, "post cascade");
    Ok(removed)
}

/// Removes a tag and every association referencing it.
pub async fn delete_tag(conn: &mut AsyncPgConnection, tag_id: i32) -> Result<usize, StoreError> {
    let links = diesel::delete(posts_tags::table.filter(posts_tags::tag_id.eq(tag_id)))
        .execute(conn)
        .await?;
    let removed = diesel::delete(tags::table.find(tag_id)).execute(conn).await?;

    debug!(links, tag_id, "tag cascade");
    Ok(removed)
}
