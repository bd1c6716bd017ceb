//! PostgreSQL repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{AuthorRepository, BookRepository, UserRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        author::author_sort_column,
        book::{book_sort_column, BookFilter, BookRow},
        paging::{Page, PageRequest},
        user::{user_sort_column, NewUser},
        Author, Book, User,
    },
};

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.release_year, b.genre,
           a.id AS author_id,
           a.first_name AS author_first_name,
           a.last_name AS author_last_name,
           a.birth_year AS author_birth_year,
           a.country AS author_country
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct PgRepository {
    pool: Pool<Postgres>,
}

impl PgRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false)
}

/// Translate constraint violations raised by a book write
fn book_write_error(e: sqlx::Error, book: &Book) -> AppError {
    if is_unique_violation(&e) {
        tracing::warn!("Duplicate book: {} ({}, {})", book.title, book.release_year, book.genre);
        AppError::Conflict(format!(
            "Book already exists: {} ({}, {})",
            book.title, book.release_year, book.genre
        ))
    } else if is_foreign_key_violation(&e) {
        AppError::AuthorNotFound(format!("Author not found: {}", book.author.id))
    } else {
        AppError::Database(e)
    }
}

fn author_write_error(e: sqlx::Error, author: &Author) -> AppError {
    if is_unique_violation(&e) {
        tracing::warn!("Duplicate author: {}", author.full_name());
        AppError::Conflict(format!(
            "Author already exists: {} ({}, {})",
            author.full_name(),
            author.birth_year,
            author.country
        ))
    } else {
        AppError::Database(e)
    }
}

/// Escape LIKE wildcards in user input
fn like_pattern(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_book_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    match filter {
        BookFilter::AuthorId(id) => {
            builder.push(" WHERE b.author_id = ").push_bind(*id);
        }
        BookFilter::AuthorName(name) => {
            let pattern = like_pattern(name);
            builder
                .push(" WHERE (a.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR (a.first_name || ' ' || a.last_name) ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        BookFilter::ReleaseYear(year) => {
            builder.push(" WHERE b.release_year = ").push_bind(*year);
        }
        BookFilter::ReleaseYearBetween(start, end) => {
            builder
                .push(" WHERE b.release_year BETWEEN ")
                .push_bind(*start)
                .push(" AND ")
                .push_bind(*end);
        }
        BookFilter::Genre(genre) => {
            builder.push(" WHERE b.genre = ").push_bind(*genre);
        }
        BookFilter::TitleContains(title) => {
            builder.push(" WHERE b.title ILIKE ").push_bind(like_pattern(title));
        }
        BookFilter::All => {}
    }
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, column: &str, page: &PageRequest, id_column: &str) {
    builder.push(format!(
        " ORDER BY {} {}, {} ASC LIMIT ",
        column,
        page.sort.direction.as_sql(),
        id_column
    ));
    builder.push_bind(page.size);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
}

// =========================================================================
// AUTHORS
// =========================================================================

#[async_trait]
impl AuthorRepository for PgRepository {
    async fn insert(&self, author: &Author) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (id, first_name, last_name, birth_year, country)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, birth_year, country
            "#,
        )
        .bind(author.id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.birth_year)
        .bind(&author.country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| author_write_error(e, author))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, birth_year, country FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn update(&self, author: &Author) -> AppResult<Option<Author>> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $2, last_name = $3, birth_year = $4, country = $5
            WHERE id = $1
            RETURNING id, first_name, last_name, birth_year, country
            "#,
        )
        .bind(author.id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.birth_year)
        .bind(&author.country)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| author_write_error(e, author))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(format!("Author {} still has books", id))
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_all(&self, page: &PageRequest) -> AppResult<Page<Author>> {
        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&mut *tx)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, first_name, last_name, birth_year, country FROM authors",
        );
        push_page(&mut builder, author_sort_column(page.sort.field), page, "id");
        let authors = builder
            .build_query_as::<Author>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Page::new(authors, page, total))
    }
}

// =========================================================================
// BOOKS
// =========================================================================

#[async_trait]
impl BookRepository for PgRepository {
    async fn insert(&self, book: &Book) -> AppResult<Book> {
        // The foreign key re-checks the author inside the same statement
        sqlx::query(
            r#"
            INSERT INTO books (id, title, release_year, genre, author_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(book.release_year)
        .bind(book.genre)
        .bind(book.author.id)
        .execute(&self.pool)
        .await
        .map_err(|e| book_write_error(e, book))?;

        Ok(book.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Book::from))
    }

    async fn update(&self, book: &Book) -> AppResult<Option<Book>> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, release_year = $3, genre = $4, author_id = $5
            WHERE id = $1
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(book.release_year)
        .bind(book.genre)
        .bind(book.author.id)
        .execute(&self.pool)
        .await
        .map_err(|e| book_write_error(e, book))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, filter: &BookFilter, page: &PageRequest) -> AppResult<Page<Book>> {
        let mut tx = self.pool.begin().await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM books b JOIN authors a ON a.id = b.author_id",
        );
        push_book_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(BOOK_SELECT);
        push_book_filter(&mut select, filter);
        push_page(&mut select, book_sort_column(page.sort.field), page, "b.id");
        let rows = select
            .build_query_as::<BookRow>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Page::new(rows.into_iter().map(Book::from).collect(), page, total))
    }
}

// =========================================================================
// USERS
// =========================================================================

#[async_trait]
impl UserRepository for PgRepository {
    async fn insert(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                tracing::warn!("Duplicate user: {}", user.username);
                AppError::Conflict("Username already in use".to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_all(&self, page: &PageRequest) -> AppResult<Page<User>> {
        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;

        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT id, username, password, role FROM users");
        push_page(&mut builder, user_sort_column(page.sort.field), page, "id");
        let users = builder.build_query_as::<User>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok(Page::new(users, page, total))
    }
}
