use crate::error::{AppError, Result};

/// Validates a content slug.
///
/// # Arguments
///
/// * `slug` - The slug taken from the page URL.
///
/// # Returns
///
/// A `Result<()>` indicating whether the slug is valid.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(AppError::Validation("Slug cannot be empty".to_string()));
    }

    if slug.len() > 200 {
        return Err(AppError::Validation(
            "Slug must be at most 200 characters".to_string(),
        ));
    }

    if !slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::Validation(
            "Slug can only contain letters, numbers, underscores, and hyphens".to_string(),
        ));
    }

    Ok(())
}
