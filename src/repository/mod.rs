//! Repository layer for persistence operations
//!
//! Services depend on the traits below; `postgres` is the production
//! implementation and `memory` backs development mode and tests. Both enforce
//! the uniqueness tuples and the book → author reference inside the store
//! itself, so duplicate inserts surface as `AppError::Conflict` without a
//! separate read-then-write check.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::BookFilter,
        paging::{Page, PageRequest},
        user::NewUser,
        Author, Book, User,
    },
};

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Insert a new author. `Conflict` if the uniqueness tuple exists.
    async fn insert(&self, author: &Author) -> AppResult<Author>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>>;

    /// Replace all fields. `None` if the author does not exist.
    async fn update(&self, author: &Author) -> AppResult<Option<Author>>;

    /// `false` if nothing was deleted. `Conflict` if the author still owns books.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn find_all(&self, page: &PageRequest) -> AppResult<Page<Author>>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a new book. `AuthorNotFound` if its author vanished,
    /// `Conflict` if the uniqueness tuple exists.
    async fn insert(&self, book: &Book) -> AppResult<Book>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// Replace all fields, including the author reference.
    async fn update(&self, book: &Book) -> AppResult<Option<Book>>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Page of books matching a single filter
    async fn find(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and assign its id. `Conflict` if the username is taken.
    async fn insert(&self, user: &NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// `false` if the user does not exist
    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool>;

    async fn delete(&self, id: i64) -> AppResult<bool>;

    async fn find_all(&self, page: &PageRequest) -> AppResult<Page<User>>;
}

/// Shared handles on every repository
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorRepository>,
    pub books: Arc<dyn BookRepository>,
    pub users: Arc<dyn UserRepository>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        let store = Arc::new(postgres::PgRepository::new(pool.clone()));
        Self {
            authors: store.clone(),
            books: store.clone(),
            users: store,
            pool: Some(pool),
        }
    }

    /// Create an empty, process-local repository
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryRepository::default());
        Self {
            authors: store.clone(),
            books: store.clone(),
            users: store,
            pool: None,
        }
    }

    /// Check that the backing store answers queries
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
