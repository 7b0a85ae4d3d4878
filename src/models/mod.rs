pub mod post;
pub mod tag;
pub mod user;

use crate::error::StoreError;

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub(crate) fn required(field: &'static str, value: &str, max: Option<usize>) -> Result<String, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::validation(field, "is required"));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(StoreError::validation(
                field,
                format!("must be at most {max} characters"),
            ));
        }
    }
    Ok(value.to_owned())
}
