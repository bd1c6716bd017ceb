//! Book model, filters and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{
    author::{Author, AuthorDto},
    enums::Genre,
    validation::{current_year, not_blank, year_between},
};

/// Sortable fields for book listings; the first is the default
pub const BOOK_SORT_FIELDS: &[&str] = &["title", "releaseYear", "genre"];

/// Map an API sort name to its column
pub fn book_sort_column(field: &str) -> &'static str {
    match field {
        "releaseYear" => "b.release_year",
        "genre" => "b.genre",
        _ => "b.title",
    }
}

/// Persisted book together with its owning author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub release_year: i32,
    pub genre: Genre,
    pub author: Author,
}

impl Book {
    /// Build a new book with a freshly generated identifier
    pub fn from_request(request: &BookRequest, author: Author) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            release_year: request.release_year,
            genre: request.genre,
            author,
        }
    }

    /// Overwrite every mutable field; the author is re-resolved by the caller
    pub fn apply(&mut self, request: &BookRequest, author: Author) {
        self.title = request.title.clone();
        self.release_year = request.release_year;
        self.genre = request.genre;
        self.author = author;
    }
}

/// Row shape of `books JOIN authors`
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub release_year: i32,
    pub genre: Genre,
    pub author_id: Uuid,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_birth_year: i32,
    pub author_country: String,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            release_year: row.release_year,
            genre: row.genre,
            author: Author {
                id: row.author_id,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
                birth_year: row.author_birth_year,
                country: row.author_country,
            },
        }
    }
}

/// Create/replace book request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(custom(function = "not_blank", message = "Title must not be blank"))]
    pub title: String,
    /// Between 0 and the current year
    #[validate(custom(function = "validate_release_year"))]
    pub release_year: i32,
    pub genre: Genre,
    pub author_id: Uuid,
}

fn validate_release_year(year: i32) -> Result<(), ValidationError> {
    year_between(year, 0, current_year())
}

/// Book representation returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: Uuid,
    pub title: String,
    pub release_year: i32,
    pub genre: Genre,
    pub author: AuthorDto,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            release_year: book.release_year,
            genre: book.genre,
            author: book.author.into(),
        }
    }
}

/// Book listing query parameters. At most one criterion is applied, see
/// [`BookQuery::filter`].
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Books owned by this author
    pub author_id: Option<Uuid>,
    /// Case-insensitive match on the author's first, last or full name
    #[serde(alias = "name")]
    pub author_name: Option<String>,
    /// Exact release year
    pub release_year: Option<i32>,
    /// Range start, used only together with `endYear`
    pub start_year: Option<i32>,
    /// Range end, used only together with `startYear`
    pub end_year: Option<i32>,
    pub genre: Option<Genre>,
    /// Case-insensitive title substring
    pub title: Option<String>,
}

/// The single predicate applied to a book listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    AuthorId(Uuid),
    AuthorName(String),
    ReleaseYear(i32),
    ReleaseYearBetween(i32, i32),
    Genre(Genre),
    TitleContains(String),
    All,
}

type FilterRule = fn(&BookQuery) -> Option<BookFilter>;

/// Evaluated in order; the first rule that yields a filter wins.
const FILTER_RULES: &[FilterRule] = &[
    |q| q.author_id.map(BookFilter::AuthorId),
    |q| q.author_name.clone().map(BookFilter::AuthorName),
    |q| q.release_year.map(BookFilter::ReleaseYear),
    |q| match (q.start_year, q.end_year) {
        (Some(start), Some(end)) if start <= end => Some(BookFilter::ReleaseYearBetween(start, end)),
        _ => None,
    },
    |q| q.genre.map(BookFilter::Genre),
    |q| q.title.clone().map(BookFilter::TitleContains),
];

impl BookQuery {
    /// Pick exactly one filter by precedence:
    /// authorId > authorName > releaseYear > [startYear, endYear] > genre > title > all
    pub fn filter(&self) -> BookFilter {
        FILTER_RULES
            .iter()
            .find_map(|rule| rule(self))
            .unwrap_or(BookFilter::All)
    }
}

impl BookFilter {
    /// In-process evaluation, used by the in-memory repository
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::AuthorId(id) => book.author.id == *id,
            BookFilter::AuthorName(name) => {
                let needle = name.to_lowercase();
                book.author.first_name.to_lowercase().contains(&needle)
                    || book.author.last_name.to_lowercase().contains(&needle)
                    || book.author.full_name().to_lowercase().contains(&needle)
            }
            BookFilter::ReleaseYear(year) => book.release_year == *year,
            BookFilter::ReleaseYearBetween(start, end) => {
                (*start..=*end).contains(&book.release_year)
            }
            BookFilter::Genre(genre) => book.genre == *genre,
            BookFilter::TitleContains(title) => {
                book.title.to_lowercase().contains(&title.to_lowercase())
            }
            BookFilter::All => true,
        }
    }
}
