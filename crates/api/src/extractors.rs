//! Request extractors.

use axum::{
    extract::{Form, FromRequest, FromRequestParts, Multipart, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use folio_common::AppError;
use folio_core::{ImageUpload, PageNumber, PostForm};
use folio_db::entities::user;
use serde::Deserialize;

/// Authenticated user extractor.
///
/// Routes using it sit behind the login guard, so a missing user only
/// happens when the guard was left out.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by auth middleware)
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// `?page=` query parameter. Garbage means the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParam(pub PageNumber);

impl<S> FromRequestParts<S> for PageParam
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = Query::<PageQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.page);
        Ok(Self(PageNumber::parse(raw.as_deref())))
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PostFields {
    #[serde(default)]
    text: String,
    #[serde(default)]
    group: Option<String>,
    #[serde(default, rename = "image-clear")]
    image_clear: Option<String>,
}

/// Post form submitted as `application/x-www-form-urlencoded` or
/// `multipart/form-data`. Fields other than `text`, `group`, `image` and
/// `image-clear` are ignored.
#[derive(Debug, Clone)]
pub struct PostFormPayload(pub PostForm);

impl<S> FromRequest<S> for PostFormPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<PostFields>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(Self(PostForm::new(
                &fields.text,
                fields.group.as_deref(),
                None,
                fields.image_clear.is_some(),
            )));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut fields = PostFields::default();
        let mut image = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" | "group" | "image-clear" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    match name.as_str() {
                        "text" => fields.text = value,
                        "group" => fields.group = Some(value),
                        _ => fields.image_clear = Some(value),
                    }
                }
                "image" => {
                    let filename = field.file_name().map(str::to_string);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    image = Some(ImageUpload { filename, data });
                }
                _ => {}
            }
        }

        Ok(Self(PostForm::new(
            &fields.text,
            fields.group.as_deref(),
            image,
            fields.image_clear.is_some(),
        )))
    }
}
