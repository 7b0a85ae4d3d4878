use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{required, tag::Tag, user::User};
use crate::error::StoreError;

pub const TITLE_MAX: usize = 50;

#[derive(Deserialize, Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

impl PostInput {
    #[cfg(test)]
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_owned(),
            content: content.to_owned(),
        }
    }

    pub fn validate(&self) -> Result<PostChanges, StoreError> {
        Ok(PostChanges {
            title: required("title", &self.title, Some(TITLE_MAX))?,
            content: required("content", &self.content, None)?,
        })
    }
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostChanges {
    pub title: String,
    pub content: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    pub user_id: i32,
    pub title: String,
    pub content: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(User))]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
}

/// An association row: post `post_id` carries tag `tag_id`.
#[derive(Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[diesel(belongs_to(Post))]
#[diesel(belongs_to(Tag))]
#[diesel(table_name = crate::schema::posts_tags)]
#[diesel(primary_key(post_id, tag_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostTag {
    pub post_id: i32,
    pub tag_id: i32,
}

/// A post with its creator and current tags (tags in name order).
#[derive(Serialize, Debug)]
pub struct PostDetail {
    pub post: Post,
    pub author: User,
    pub tags: Vec<Tag>,
}

impl PostDetail {
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}
