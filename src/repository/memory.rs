//! In-memory repository
//!
//! All three tables live behind one lock so that uniqueness and the
//! book → author reference are checked in the same critical section as the
//! write they guard.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthorRepository, BookRepository, UserRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookFilter,
        paging::{Direction, Page, PageRequest},
        user::NewUser,
        Author, Book, Genre, User,
    },
};

/// Book as stored: the author is a reference, joined on read
#[derive(Debug, Clone)]
struct BookRecord {
    id: Uuid,
    title: String,
    release_year: i32,
    genre: Genre,
    author_id: Uuid,
}

impl BookRecord {
    fn from_book(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            release_year: book.release_year,
            genre: book.genre,
            author_id: book.author.id,
        }
    }

    fn same_identity(&self, other: &BookRecord) -> bool {
        self.title == other.title
            && self.release_year == other.release_year
            && self.genre == other.genre
    }
}

#[derive(Debug, Default)]
struct Tables {
    authors: HashMap<Uuid, Author>,
    books: HashMap<Uuid, BookRecord>,
    users: BTreeMap<i64, User>,
    last_user_id: i64,
}

impl Tables {
    fn join(&self, record: &BookRecord) -> Option<Book> {
        self.authors.get(&record.author_id).map(|author| Book {
            id: record.id,
            title: record.title.clone(),
            release_year: record.release_year,
            genre: record.genre,
            author: author.clone(),
        })
    }

    fn author_conflict(&self, author: &Author) -> Option<AppError> {
        self.authors
            .values()
            .any(|other| {
                other.id != author.id
                    && other.first_name == author.first_name
                    && other.last_name == author.last_name
                    && other.birth_year == author.birth_year
                    && other.country == author.country
            })
            .then(|| {
                AppError::Conflict(format!(
                    "Author already exists: {} ({}, {})",
                    author.full_name(),
                    author.birth_year,
                    author.country
                ))
            })
    }

    /// Reference and uniqueness checks for a book write
    fn check_book(&self, record: &BookRecord) -> AppResult<()> {
        if !self.authors.contains_key(&record.author_id) {
            return Err(AppError::AuthorNotFound(format!(
                "Author not found: {}",
                record.author_id
            )));
        }
        if self
            .books
            .values()
            .any(|other| other.id != record.id && other.same_identity(record))
        {
            return Err(AppError::Conflict(format!(
                "Book already exists: {} ({}, {})",
                record.title, record.release_year, record.genre
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

/// Sort, then slice out the requested page
fn paginate<T>(mut items: Vec<T>, request: &PageRequest, compare: impl Fn(&T, &T) -> Ordering) -> Page<T> {
    items.sort_by(|a, b| match request.sort.direction {
        Direction::Asc => compare(a, b),
        Direction::Desc => compare(b, a),
    });
    let total = items.len() as i64;
    let content = items
        .into_iter()
        .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(request.size).unwrap_or(0))
        .collect();
    Page::new(content, request, total)
}

fn compare_authors(field: &str, a: &Author, b: &Author) -> Ordering {
    let primary = match field {
        "firstName" => a.first_name.cmp(&b.first_name),
        "birthYear" => a.birth_year.cmp(&b.birth_year),
        "country" => a.country.cmp(&b.country),
        _ => a.last_name.cmp(&b.last_name),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn compare_books(field: &str, a: &Book, b: &Book) -> Ordering {
    let primary = match field {
        "releaseYear" => a.release_year.cmp(&b.release_year),
        "genre" => a.genre.as_str().cmp(b.genre.as_str()),
        _ => a.title.cmp(&b.title),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn compare_users(field: &str, a: &User, b: &User) -> Ordering {
    match field {
        "username" => a.username.cmp(&b.username).then_with(|| a.id.cmp(&b.id)),
        _ => a.id.cmp(&b.id),
    }
}

// =========================================================================
// AUTHORS
// =========================================================================

#[async_trait]
impl AuthorRepository for MemoryRepository {
    async fn insert(&self, author: &Author) -> AppResult<Author> {
        let mut tables = self.tables.write().await;
        if let Some(conflict) = tables.author_conflict(author) {
            return Err(conflict);
        }
        tables.authors.insert(author.id, author.clone());
        Ok(author.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        Ok(self.tables.read().await.authors.get(&id).cloned())
    }

    async fn update(&self, author: &Author) -> AppResult<Option<Author>> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&author.id) {
            return Ok(None);
        }
        if let Some(conflict) = tables.author_conflict(author) {
            return Err(conflict);
        }
        tables.authors.insert(author.id, author.clone());
        Ok(Some(author.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.books.values().any(|b| b.author_id == id) {
            return Err(AppError::Conflict(format!("Author {} still has books", id)));
        }
        Ok(tables.authors.remove(&id).is_some())
    }

    async fn find_all(&self, page: &PageRequest) -> AppResult<Page<Author>> {
        let tables = self.tables.read().await;
        let authors: Vec<Author> = tables.authors.values().cloned().collect();
        Ok(paginate(authors, page, |a, b| compare_authors(page.sort.field, a, b)))
    }
}

// =========================================================================
// BOOKS
// =========================================================================

#[async_trait]
impl BookRepository for MemoryRepository {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let record = BookRecord::from_book(book);
        let mut tables = self.tables.write().await;
        tables.check_book(&record)?;
        let stored = tables.join(&record);
        tables.books.insert(record.id, record);
        stored.ok_or_else(|| AppError::Internal("Book stored without author".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.get(&id).and_then(|record| tables.join(record)))
    }

    async fn update(&self, book: &Book) -> AppResult<Option<Book>> {
        let record = BookRecord::from_book(book);
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&record.id) {
            return Ok(None);
        }
        tables.check_book(&record)?;
        let stored = tables.join(&record);
        tables.books.insert(record.id, record);
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.books.remove(&id).is_some())
    }

    async fn find(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        let tables = self.tables.read().await;
        let books: Vec<Book> = tables
            .books
            .values()
            .filter_map(|record| tables.join(record))
            .filter(|book| filter.matches(book))
            .collect();
        Ok(paginate(books, page, |a, b| compare_books(page.sort.field, a, b)))
    }
}

// =========================================================================
// USERS
// =========================================================================

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn insert(&self, user: &NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already in use".to_string()));
        }
        tables.last_user_id += 1;
        let stored = User {
            id: tables.last_user_id,
            username: user.username.clone(),
            password: user.password_hash.clone(),
            role: user.role,
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }

    async fn find_all(&self, page: &PageRequest) -> AppResult<Page<User>> {
        let tables = self.tables.read().await;
        let users: Vec<User> = tables.users.values().cloned().collect();
        Ok(paginate(users, page, |a, b| compare_users(page.sort.field, a, b)))
    }
}
