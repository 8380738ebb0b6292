//! Input normalisation shared by every layer that accepts user text.

use crate::{Error, Result};

/// Upper bound on a single comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// Trim `value` and reject it if nothing is left.
pub fn required(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Invalid(format!("{field} is required")));
  }
  Ok(trimmed.to_owned())
}

/// Trim an optional value; blank strings collapse to `None`.
pub fn optional(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_owned)
}

/// Canonical form of an email address: trimmed and lowercased.
///
/// Only a minimal shape check is applied (`local@domain`, no whitespace).
pub fn email(value: &str) -> Result<String> {
  let email = required("email", value)?.to_lowercase();
  let valid = match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
    }
    None => false,
  };
  if !valid {
    return Err(Error::Invalid(format!("{value:?} is not a valid email")));
  }
  Ok(email)
}

/// Trim a comment body and enforce [`MAX_COMMENT_CHARS`].
pub fn comment(value: &str) -> Result<String> {
  let text = required("text", value)?;
  if text.chars().count() > MAX_COMMENT_CHARS {
    return Err(Error::Invalid(format!(
      "comment exceeds {MAX_COMMENT_CHARS} characters"
    )));
  }
  Ok(text)
}
