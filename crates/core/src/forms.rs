//! User-submitted forms.
//!
//! Forms carry only the fields a caller is allowed to set. Authors, post
//! references and timestamps are never read from submissions; handlers
//! fill them in from the session and the URL.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Message shown for a missing required field.
pub const REQUIRED: &str = "This field is required.";

/// Message shown when a referenced group does not exist.
pub const INVALID_CHOICE: &str = "Select a valid choice.";

/// Field-level error messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// No errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Whether no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Errors recorded against `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Merge the errors reported by `validator`.
    pub fn extend_from(&mut self, errors: &ValidationErrors) {
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map_or_else(|| err.code.to_string(), ToString::to_string);
                self.add(field.to_string(), message);
            }
        }
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut form_errors = Self::new();
        form_errors.extend_from(errors);
        form_errors
    }
}

/// Result of submitting a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome<T> {
    /// The submission was valid and persisted.
    Saved(T),
    /// The submission was rejected; nothing was written.
    Invalid(FormErrors),
}

/// An uploaded image file, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-supplied file name.
    pub filename: Option<String>,
    /// Raw file content.
    pub data: Bytes,
}

/// Post create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct PostForm {
    /// Post body, trimmed.
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// ID of the group to file the post under.
    pub group: Option<String>,
    /// New image, if one was uploaded.
    pub image: Option<ImageUpload>,
    /// Drop the current image (edit only).
    pub clear_image: bool,
}

impl PostForm {
    /// Build a form from raw submitted values.
    #[must_use]
    pub fn new(
        text: &str,
        group: Option<&str>,
        image: Option<ImageUpload>,
        clear_image: bool,
    ) -> Self {
        Self {
            text: text.trim().to_string(),
            group: group
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string),
            image: image.filter(|i| !i.data.is_empty()),
            clear_image,
        }
    }
}

/// Comment form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct CommentForm {
    /// Comment body, trimmed.
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    /// Build a form from raw submitted text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
        }
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_form_rejects_blank_text() {
        let form = PostForm::new("   \n", None, None, false);
        let errors = FormErrors::from(&form.validate().unwrap_err());

        assert_eq!(errors.get("text"), [REQUIRED]);
        assert!(errors.get("group").is_empty());
    }

    #[test]
    fn test_post_form_normalizes_fields() {
        let form = PostForm::new(
            "  hello  ",
            Some(""),
            Some(ImageUpload {
                filename: None,
                data: Bytes::new(),
            }),
            false,
        );

        assert_eq!(form.text, "hello");
        assert_eq!(form.group, None);
        assert_eq!(form.image, None);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_comment_form_deserialize_trims() {
        let form: CommentForm = serde_json::from_str(r#"{"text": "  nice  ", "author": "x"}"#).unwrap();
        assert_eq!(form.text, "nice");

        let form: CommentForm = serde_json::from_str("{}").unwrap();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_form_errors_serialize_as_map() {
        let mut errors = FormErrors::new();
        errors.add("group", INVALID_CHOICE);

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "group": ["Select a valid choice."] })
        );
    }
}
