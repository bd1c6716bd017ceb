//! Author management service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        paging::{Page, PageRequest},
        Author, AuthorRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

fn not_found(id: Uuid) -> AppError {
    AppError::AuthorNotFound(format!("Author not found: {}", id))
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a new author with a generated id
    pub async fn create(&self, request: &AuthorRequest) -> AppResult<Author> {
        let author = Author::from_request(request);
        let created = self.repository.authors.insert(&author).await?;
        tracing::info!("Author created: {} ({})", created.full_name(), created.id);
        Ok(created)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Author> {
        tracing::debug!("Fetching author {}", id);
        self.repository
            .authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Replace every field of an existing author
    pub async fn update(&self, id: Uuid, request: &AuthorRequest) -> AppResult<Author> {
        let mut author = self.get_by_id(id).await?;
        author.apply(request);

        // The row may have been deleted since it was loaded
        let updated = self
            .repository
            .authors
            .update(&author)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Author updated: {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repository.authors.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("Author deleted: {}", id);
        Ok(())
    }

    pub async fn list_all(&self, page: &PageRequest) -> AppResult<Page<Author>> {
        self.repository.authors.find_all(page).await
    }
}
