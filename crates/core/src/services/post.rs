//! Post service.
//!
//! Posts are the only records with a side effect outside the database: an
//! attached image lives in the storage backend. Images are written before
//! the row that references them and removed again if that write fails, so
//! no row ever points at a missing file.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use folio_common::{AppError, AppResult, IdGenerator, StorageBackend};
use folio_db::{
    entities::{group, post, user},
    repositories::{GroupRepository, PostRepository, PostScope, UserRepository},
};
use sea_orm::Set;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::forms::{FormErrors, FormOutcome, INVALID_CHOICE, PostForm};
use crate::pagination::{Page, PageNumber, PageWindow};
use crate::upload::{ValidatedImage, validate_image};

const CLEAR_AND_UPLOAD: &str = "Please either submit a file or check the clear checkbox, not both.";

/// A post with its author, group and image URL resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEntry {
    /// The post.
    pub post: post::Model,
    /// Its author.
    pub author: user::Model,
    /// The group it is filed under.
    pub group: Option<group::Model>,
    /// Public URL of the attached image.
    pub image_url: Option<String>,
}

/// A post form that passed validation.
struct CleanPost {
    text: String,
    group_id: Option<String>,
    image: Option<ValidatedImage>,
    clear_image: bool,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    group_repo: GroupRepository,
    user_repo: UserRepository,
    storage: Arc<dyn StorageBackend>,
    page_size: u64,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        group_repo: GroupRepository,
        user_repo: UserRepository,
        storage: Arc<dyn StorageBackend>,
        page_size: u64,
    ) -> Self {
        Self {
            post_repo,
            group_repo,
            user_repo,
            storage,
            page_size,
            id_gen: IdGenerator::new(),
        }
    }

    /// One page of a feed, newest first.
    pub async fn feed(
        &self,
        scope: PostScope<'_>,
        page: PageNumber,
    ) -> AppResult<Page<PostEntry>> {
        let count = self.post_repo.count(scope).await?;
        let window = PageWindow::new(page, self.page_size, count);

        let posts = if window.is_past_end() {
            Vec::new()
        } else {
            self.post_repo
                .find_page(scope, self.page_size, window.index())
                .await?
        };

        Ok(window.into_page(self.hydrate(posts).await?))
    }

    /// Get a post with its relations.
    pub async fn get(&self, post_id: &str) -> AppResult<PostEntry> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let mut entries = self.hydrate(vec![post]).await?;
        entries
            .pop()
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))
    }

    /// Number of posts written by `author_id`.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        self.post_repo.count_by_author(author_id).await
    }

    /// Get a post for editing by `editor_id`.
    ///
    /// Fails with [`AppError::Forbidden`] unless the editor wrote the post.
    pub async fn get_for_edit(&self, editor_id: &str, post_id: &str) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != editor_id {
            return Err(AppError::Forbidden(format!(
                "{editor_id} is not the author of post {post_id}"
            )));
        }
        Ok(post)
    }

    /// Publish a new post written by `author_id`.
    pub async fn create(&self, author_id: &str, form: PostForm) -> AppResult<FormOutcome<post::Model>> {
        let clean = match self.clean(form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let image_key = match &clean.image {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(clean.text),
            author_id: Set(author_id.to_string()),
            group_id: Set(clean.group_id),
            image: Set(image_key.clone()),
            created_at: Set(Utc::now().into()),
        };

        match self.post_repo.create(model).await {
            Ok(post) => {
                info!(
                    post_id = %post.id,
                    author_id = %author_id,
                    summary = %post.summary(),
                    "Created post"
                );
                Ok(FormOutcome::Saved(post))
            }
            Err(e) => {
                if let Some(key) = image_key {
                    self.discard_image(&key).await;
                }
                Err(e)
            }
        }
    }

    /// Apply an edit by `editor_id`. The author never changes.
    pub async fn update(
        &self,
        editor_id: &str,
        post_id: &str,
        form: PostForm,
    ) -> AppResult<FormOutcome<post::Model>> {
        let post = self.get_for_edit(editor_id, post_id).await?;

        let clean = match self.clean(form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };

        let new_key = match &clean.image {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };
        let old_key = post.image.clone();
        let image = match (&new_key, clean.clear_image) {
            (Some(key), _) => Some(key.clone()),
            (None, true) => None,
            (None, false) => old_key.clone(),
        };

        let mut model: post::ActiveModel = post.into();
        model.text = Set(clean.text);
        model.group_id = Set(clean.group_id);
        model.image = Set(image.clone());

        let updated = match self.post_repo.update(model).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(key) = new_key {
                    self.discard_image(&key).await;
                }
                return Err(e);
            }
        };

        if let Some(old) = old_key.filter(|old| image.as_ref() != Some(old)) {
            self.discard_image(&old).await;
        }

        info!(post_id = %updated.id, editor_id = %editor_id, "Updated post");
        Ok(FormOutcome::Saved(updated))
    }

    /// Delete a post on behalf of `caller_id`.
    ///
    /// Only the author can delete; anyone else gets `Ok(false)` and the post
    /// stays. Unknown posts are an error.
    pub async fn delete(&self, caller_id: &str, post_id: &str) -> AppResult<bool> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if !self.post_repo.delete_owned(&post.id, caller_id).await? {
            debug!(post_id = %post.id, caller_id = %caller_id, "Ignored delete by non-author");
            return Ok(false);
        }

        info!(
            post_id = %post.id,
            author_id = %caller_id,
            summary = %post.summary(),
            "Deleted post"
        );
        if let Some(key) = post.image {
            self.discard_image(&key).await;
        }
        Ok(true)
    }

    async fn clean(&self, form: PostForm) -> AppResult<Result<CleanPost, FormErrors>> {
        let mut errors = FormErrors::new();
        if let Err(e) = form.validate() {
            errors.extend_from(&e);
        }

        let group_id = match form.group {
            Some(id) => {
                if self.group_repo.find_by_id(&id).await?.is_some() {
                    Some(id)
                } else {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            }
            None => None,
        };

        let image = match form.image {
            Some(_) if form.clear_image => {
                errors.add("image", CLEAR_AND_UPLOAD);
                None
            }
            Some(upload) => match validate_image(upload.data) {
                Ok(image) => Some(image),
                Err(message) => {
                    errors.add("image", message);
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        Ok(Ok(CleanPost {
            text: form.text,
            group_id,
            image,
            clear_image: form.clear_image,
        }))
    }

    async fn store_image(&self, image: &ValidatedImage) -> AppResult<String> {
        let key = format!("posts/{}.{}", self.id_gen.generate(), image.extension());
        let stored = self
            .storage
            .upload(&key, &image.data, image.content_type())
            .await?;
        debug!(
            key = %stored.key,
            size = stored.size,
            md5 = %stored.md5,
            width = image.width,
            height = image.height,
            "Stored post image"
        );
        Ok(stored.key)
    }

    async fn discard_image(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(error = %e, key = %key, "Failed to remove post image");
        }
    }

    async fn hydrate(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostEntry>> {
        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut group_ids: Vec<String> = posts.iter().filter_map(|p| p.group_id.clone()).collect();
        group_ids.sort_unstable();
        group_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let groups: HashMap<String, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let author = authors
                    .get(&post.author_id)
                    .cloned()
                    .ok_or_else(|| AppError::UserNotFound(post.author_id.clone()))?;
                let group = post.group_id.as_ref().and_then(|id| groups.get(id)).cloned();
                let image_url = post.image.as_deref().map(|key| self.storage.public_url(key));
                Ok(PostEntry {
                    post,
                    author,
                    group,
                    image_url,
                })
            })
            .collect()
    }
}
