//! Core business logic for folio.

pub mod forms;
pub mod pagination;
pub mod services;
pub mod upload;

pub use forms::{CommentForm, FormErrors, FormOutcome, ImageUpload, PostForm};
pub use pagination::{Page, PageNumber, PageWindow};
pub use services::*;
pub use upload::{ValidatedImage, validate_image};
