//! In-process store with the same semantics as [`BlogDb`](super::BlogDb).
//!
//! Every mutation runs against a staged copy of the tables and is published
//! only if it succeeds, so a failed cascade or reconciliation leaves no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::models::post::*;
use crate::models::tag::*;
use crate::models::user::*;

use super::reconcile::ensure_resolved;
use super::{PostService, Svc, TagService, UserService};

#[derive(Clone, Default, Debug)]
struct Tables {
    users: BTreeMap<i32, User>,
    posts: BTreeMap<i32, Post>,
    tags: BTreeMap<i32, Tag>,
    posts_tags: BTreeSet<PostTag>,
    last_user_id: i32,
    last_post_id: i32,
    last_tag_id: i32,
}

impl Tables {
    fn user(&self, id: i32) -> Result<&User, StoreError> {
        self.users.get(&id).ok_or_else(|| StoreError::not_found("user", id))
    }

    fn post(&self, id: i32) -> Result<&Post, StoreError> {
        self.posts.get(&id).ok_or_else(|| StoreError::not_found("post", id))
    }

    fn tag(&self, id: i32) -> Result<&Tag, StoreError> {
        self.tags.get(&id).ok_or_else(|| StoreError::not_found("tag", id))
    }

    fn ensure_unique_name(&self, name: &str, except: Option<i32>) -> Result<(), StoreError> {
        let taken = self
            .tags
            .values()
            .any(|t| t.name == name && Some(t.id) != except);
        if taken {
            return Err(StoreError::DuplicateName(name.to_owned()));
        }
        Ok(())
    }

    fn tags_of(&self, post_id: i32) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .posts_tags
            .range(PostTag { post_id, tag_id: i32::MIN }..=PostTag { post_id, tag_id: i32::MAX })
            .filter_map(|link| self.tags.get(&link.tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    fn delete_posts(&mut self, post_ids: &[i32]) -> usize {
        let before = self.posts_tags.len();
        self.posts_tags.retain(|link| !post_ids.contains(&link.post_id));
        let links = before - self.posts_tags.len();

        let removed = post_ids
            .iter()
            .filter(|&&id| self.posts.remove(&id).is_some())
            .count();

        debug!(links, posts = removed, "post cascade");
        removed
    }

    fn delete_tag(&mut self, tag_id: i32) {
        let before = self.posts_tags.len();
        self.posts_tags.retain(|link| link.tag_id != tag_id);
        let links = before - self.posts_tags.len();

        self.tags.remove(&tag_id);
        debug!(links, tag_id, "tag cascade");
    }

    fn replace_post_tags(&mut self, post_id: i32, names: &BTreeSet<String>) -> Result<(), StoreError> {
        let resolved: Vec<Tag> = self
            .tags
            .values()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect();
        ensure_resolved(names, &resolved)?;

        let before = self.posts_tags.len();
        self.posts_tags.retain(|link| link.post_id != post_id);
        let cleared = before - self.posts_tags.len();

        self.posts_tags
            .extend(resolved.iter().map(|t| PostTag { post_id, tag_id: t.id }));

        debug!(post_id, cleared, inserted = resolved.len(), "post tags replaced");
        Ok(())
    }

    #[cfg(test)]
    fn dangling_links(&self) -> usize {
        self.posts_tags
            .iter()
            .filter(|l| !self.posts.contains_key(&l.post_id) || !self.tags.contains_key(&l.tag_id))
            .count()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl Svc for MemoryStore {}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read<T>(&self, op: impl FnOnce(&Tables) -> Result<T, StoreError> + Send) -> Result<T, StoreError> {
        let tables = self.tables.read().await;
        op(&tables)
    }

    /// Runs `op` on a staged copy and publishes it only on success.
    async fn write<T>(
        &self,
        op: impl FnOnce(&mut Tables) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let out = op(&mut staged)?;
        *tables = staged;
        Ok(out)
    }
}

#[async_trait]
impl UserService for MemoryStore {
    #[instrument(skip(self))]
    async fn create_user(&self, input: &UserInput) -> Result<User, StoreError> {
        let new = input.validate()?;
        self.write(|t| {
            t.last_user_id += 1;
            let user = User {
                id: t.last_user_id,
                first_name: new.first_name,
                last_name: new.last_name,
                image_url: new.image_url,
            };
            t.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        self.read(|t| t.user(id).cloned()).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.read(|t| Ok(t.users.values().cloned().collect())).await
    }

    async fn user_with_posts(&self, id: i32) -> Result<UserDetail, StoreError> {
        self.read(|t| {
            let user = t.user(id)?.clone();
            let posts = t.posts.values().filter(|p| p.user_id == id).cloned().collect();
            Ok(UserDetail { user, posts })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update_user(&self, id: i32, input: &UserInput) -> Result<User, StoreError> {
        let changes = input.validate()?;
        self.write(|t| {
            let user = t
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("user", id))?;
            user.first_name = changes.first_name;
            user.last_name = changes.last_name;
            user.image_url = changes.image_url;
            Ok(user.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i32) -> Result<(), StoreError> {
        self.write(|t| {
            t.user(id)?;
            let post_ids: Vec<i32> = t
                .posts
                .values()
                .filter(|p| p.user_id == id)
                .map(|p| p.id)
                .collect();
            let posts = t.delete_posts(&post_ids);
            t.users.remove(&id);
            debug!(user_id = id, posts, "user deleted");
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl PostService for MemoryStore {
    #[instrument(skip(self))]
    async fn create_post(&self, user_id: i32, input: &PostInput) -> Result<Post, StoreError> {
        let PostChanges { title, content } = input.validate()?;
        self.write(|t| {
            t.user(user_id)?;
            t.last_post_id += 1;
            let post = Post {
                id: t.last_post_id,
                title,
                content,
                created_at: Utc::now(),
                user_id,
            };
            t.posts.insert(post.id, post.clone());
            Ok(post)
        })
        .await
    }

    async fn get_post(&self, id: i32) -> Result<Post, StoreError> {
        self.read(|t| t.post(id).cloned()).await
    }

    async fn post_with_tags(&self, id: i32) -> Result<PostDetail, StoreError> {
        self.read(|t| {
            let post = t.post(id)?.clone();
            let author = t.user(post.user_id)?.clone();
            let tags = t.tags_of(id);
            Ok(PostDetail { post, author, tags })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update_post(
        &self,
        id: i32,
        input: &PostInput,
        tag_names: &BTreeSet<String>,
    ) -> Result<Post, StoreError> {
        let changes = input.validate()?;
        self.write(|t| {
            let post = t
                .posts
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("post", id))?;
            post.title = changes.title;
            post.content = changes.content;
            let post = post.clone();

            t.replace_post_tags(id, tag_names)?;
            Ok(post)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i32) -> Result<(), StoreError> {
        self.write(|t| {
            t.post(id)?;
            t.delete_posts(&[id]);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TagService for MemoryStore {
    #[instrument(skip(self))]
    async fn create_tag(&self, input: &TagInput) -> Result<Tag, StoreError> {
        let NewTag { name } = input.validate()?;
        self.write(|t| {
            t.ensure_unique_name(&name, None)?;
            t.last_tag_id += 1;
            let tag = Tag {
                id: t.last_tag_id,
                name,
            };
            t.tags.insert(tag.id, tag.clone());
            Ok(tag)
        })
        .await
    }

    async fn get_tag(&self, id: i32) -> Result<Tag, StoreError> {
        self.read(|t| t.tag(id).cloned()).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        self.read(|t| {
            let mut tags: Vec<Tag> = t.tags.values().cloned().collect();
            tags.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(tags)
        })
        .await
    }

    async fn tag_with_posts(&self, id: i32) -> Result<TagDetail, StoreError> {
        self.read(|t| {
            let tag = t.tag(id)?.clone();
            let posts = t
                .posts_tags
                .iter()
                .filter(|link| link.tag_id == id)
                .filter_map(|link| t.posts.get(&link.post_id).cloned())
                .collect();
            Ok(TagDetail { tag, posts })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update_tag(&self, id: i32, input: &TagInput) -> Result<Tag, StoreError> {
        let NewTag { name } = input.validate()?;
        self.write(|t| {
            t.tag(id)?;
            t.ensure_unique_name(&name, Some(id))?;
            let tag = t
                .tags
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("tag", id))?;
            tag.name = name;
            Ok(tag.clone())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_tag(&self, id: i32) -> Result<(), StoreError> {
        self.write(|t| {
            t.tag(id)?;
            t.delete_tag(id);
            Ok(())
        })
        .await
    }
}
