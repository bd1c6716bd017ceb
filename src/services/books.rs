//! Book management service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        paging::{Page, PageRequest},
        Author, Book, BookQuery, BookRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

fn not_found(id: Uuid) -> AppError {
    AppError::BookNotFound(format!("Book not found: {}", id))
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn resolve_author(&self, author_id: Uuid) -> AppResult<Author> {
        self.repository
            .authors
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound(format!("Author not found: {}", author_id)))
    }

    /// Create a new book owned by an existing author
    pub async fn create(&self, request: &BookRequest) -> AppResult<Book> {
        let author = self.resolve_author(request.author_id).await?;
        let book = Book::from_request(request, author);
        let created = self.repository.books.insert(&book).await?;
        tracing::info!("Book created: {} ({})", created.title, created.id);
        Ok(created)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        tracing::debug!("Fetching book {}", id);
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Replace every field; the book may move to another author
    pub async fn update(&self, id: Uuid, request: &BookRequest) -> AppResult<Book> {
        let mut book = self.get_by_id(id).await?;
        let author = self.resolve_author(request.author_id).await?;
        book.apply(request, author);

        let updated = self
            .repository
            .books
            .update(&book)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!("Book updated: {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("Book deleted: {}", id);
        Ok(())
    }

    /// List books matching the highest-precedence criterion in `query`
    pub async fn find_books(&self, query: &BookQuery, page: &PageRequest) -> AppResult<Page<Book>> {
        let filter = query.filter();
        tracing::debug!("Book search with {:?}", filter);
        self.repository.books.find(&filter, page).await
    }
}
