use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::required;
use crate::error::StoreError;

pub const FIRST_NAME_MAX: usize = 25;
pub const LAST_NAME_MAX: usize = 25;
pub const IMAGE_URL_MAX: usize = 200;

/// Stored for users created or edited without an image.
pub const DEFAULT_IMAGE_URL: &str = "https://img.freepik.com/premium-vector/default-image-icon-vector-missing-picture-page-website-design-mobile-app-no-photo-available_87543-7509.jpg?w=996";

// the input to `create_user` and `update_user`
#[derive(Deserialize, Debug, Clone)]
pub struct UserInput {
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
}

impl UserInput {
    #[cfg(test)]
    pub fn new(first_name: &str, last_name: &str, image_url: Option<&str>) -> Self {
        Self {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            image_url: image_url.map(str::to_owned),
        }
    }

    /// Checks the field constraints and resolves the image placeholder.
    pub fn validate(&self) -> Result<NewUser, StoreError> {
        let image_url = match self.image_url.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_IMAGE_URL.to_owned(),
            Some(url) if url.chars().count() > IMAGE_URL_MAX => {
                return Err(StoreError::validation(
                    "image_url",
                    format!("must be at most {IMAGE_URL_MAX} characters"),
                ))
            }
            Some(url) => url.to_owned(),
        };
        Ok(NewUser {
            first_name: required("first_name", &self.first_name, Some(FIRST_NAME_MAX))?,
            last_name: required("last_name", &self.last_name, Some(LAST_NAME_MAX))?,
            image_url,
        })
    }
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
}

/// A user together with the posts they created.
#[derive(Serialize, Debug)]
pub struct UserDetail {
    pub user: User,
    pub posts: Vec<super::post::Post>,
}
