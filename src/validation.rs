use std::sync::OnceLock;

use regex::Regex;

use crate::error::ApiError;

/// Upper bound on post content, counted in Unicode code points (not bytes).
pub const MAX_CONTENT_CHARS: usize = 2000;
/// Server-side password strength floor.
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_BIO_CHARS: usize = 500;
pub const MAX_AVATAR_URL_CHARS: usize = 500;

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // One non-space local part, an @, a domain with at least one dot.
    REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile"))
}

/// Canonical form of an email address: trimmed and lowercased. Lookups and
/// the uniqueness constraint always operate on this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email and return its canonical form.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let normalized = normalize_email(email);
    if !email_regex().is_match(&normalized) {
        return Err(ApiError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(normalized)
}

pub fn validate_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::Validation(format!(
            "Name must be {MAX_NAME_CHARS} characters or fewer"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

/// Post content rules: trimmed, non-empty, at most 2000 code points. The
/// trimmed form is what gets stored.
pub fn validate_content(content: &str) -> Result<String, ApiError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(
            "Post content is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::Validation(format!(
            "Post content must be {MAX_CONTENT_CHARS} characters or fewer"
        )));
    }
    Ok(trimmed.to_string())
}

/// Bio may be empty (that clears it), but not oversized.
pub fn validate_bio(bio: &str) -> Result<String, ApiError> {
    let trimmed = bio.trim();
    if trimmed.chars().count() > MAX_BIO_CHARS {
        return Err(ApiError::Validation(format!(
            "Bio must be {MAX_BIO_CHARS} characters or fewer"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_avatar_url(url: &str) -> Result<String, ApiError> {
    let trimmed = url.trim();
    if trimmed.chars().count() > MAX_AVATAR_URL_CHARS {
        return Err(ApiError::Validation(format!(
            "Avatar URL must be {MAX_AVATAR_URL_CHARS} characters or fewer"
        )));
    }
    Ok(trimmed.to_string())
}
