use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{post::Post, required};
use crate::error::StoreError;

#[derive(Deserialize, Debug, Clone)]
pub struct TagInput {
    pub name: String,
}

impl TagInput {
    #[cfg(test)]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }

    pub fn validate(&self) -> Result<NewTag, StoreError> {
        Ok(NewTag {
            name: required("name", &self.name, None)?,
        })
    }
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTag {
    pub name: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

/// A tag with the posts carrying it, in id order.
#[derive(Serialize, Debug)]
pub struct TagDetail {
    pub tag: Tag,
    pub posts: Vec<Post>,
}
