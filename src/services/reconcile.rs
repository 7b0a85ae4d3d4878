//! Tag reconciliation: make a post's association rows match a submitted set
//! of tag names.
//!
//! The replacement is full delete-then-insert rather than a diff. It must run
//! inside the caller's transaction so a failure leaves the previous set.

use std::collections::BTreeSet;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::error::StoreError;
use crate::models::post::PostTag;
use crate::models::tag::Tag;
use crate::schema::{posts_tags, tags};

/// Fails with `UnknownTag` naming the first (in sorted order) submitted name
/// that `resolved` does not contain.
pub fn ensure_resolved(names: &BTreeSet<String>, resolved: &[Tag]) -> Result<(), StoreError> {
    match names
        .iter()
        .find(|name| !resolved.iter().any(|t| &t.name == *name))
    {
        Some(missing) => Err(StoreError::UnknownTag(missing.clone())),
        None => Ok(()),
    }
}

/// Replaces the tag set of `post_id` with `names`, returning the resolved
/// tags in name order.
pub async fn replace_post_tags(
    conn: &mut AsyncPgConnection,
    post_id: i32,
    names: &BTreeSet<String>,
) -> Result<Vec<Tag>, StoreError> {
    let resolved: Vec<Tag> = if names.is_empty() {
        Vec::new()
    } else {
        tags::table
            .filter(tags::name.eq_any(names.iter().cloned().collect::<Vec<_>>()))
            .order(tags::name.asc())
            .select(Tag::as_select())
            .load(conn)
            .await?
    };
    ensure_resolved(names, &resolved)?;

    let cleared = diesel::delete(posts_tags::table.filter(posts_tags::post_id.eq(post_id)))
        .execute(conn)
        .await?;

    let links: Vec<PostTag> = resolved
        .iter()
        .map(|t| PostTag {
            post_id,
            tag_id: t.id,
        })
        .collect();
    if !links.is_empty() {
        diesel::insert_into(posts_tags::table)
            .values(&links)
            .execute(conn)
            .await?;
    }

    debug!(post_id, cleared, inserted = links.len(), "post tags replaced");
    Ok(resolved)
}
