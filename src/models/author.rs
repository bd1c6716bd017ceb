//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validation::{current_year, not_blank, year_between};

/// Oldest accepted birth year
pub const MIN_BIRTH_YEAR: i32 = -2600;

/// Authors must be at least this many years old
const MIN_AUTHOR_AGE: i32 = 10;

/// Sortable fields for author listings; the first is the default
pub const AUTHOR_SORT_FIELDS: &[&str] = &["lastName", "firstName", "birthYear", "country"];

/// Map an API sort name to its column
pub fn author_sort_column(field: &str) -> &'static str {
    match field {
        "firstName" => "first_name",
        "birthYear" => "birth_year",
        "country" => "country",
        _ => "last_name",
    }
}

/// Persisted author
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_year: i32,
    pub country: String,
}

impl Author {
    /// Build a new author with a freshly generated identifier
    pub fn from_request(request: &AuthorRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            birth_year: request.birth_year,
            country: request.country.clone(),
        }
    }

    /// Overwrite every mutable field from the request
    pub fn apply(&mut self, request: &AuthorRequest) {
        self.first_name = request.first_name.clone();
        self.last_name = request.last_name.clone();
        self.birth_year = request.birth_year;
        self.country = request.country.clone();
    }

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Create/replace author request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRequest {
    #[validate(custom(function = "not_blank", message = "First name must not be blank"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "Last name must not be blank"))]
    pub last_name: String,
    /// Between -2600 and ten years before the current year
    #[validate(custom(function = "validate_birth_year"))]
    pub birth_year: i32,
    #[validate(custom(function = "not_blank", message = "Country must not be blank"))]
    pub country: String,
}

/// Latest accepted birth year
pub fn max_birth_year() -> i32 {
    current_year() - MIN_AUTHOR_AGE
}

fn validate_birth_year(year: i32) -> Result<(), ValidationError> {
    year_between(year, MIN_BIRTH_YEAR, max_birth_year())
}

/// Author representation returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_year: i32,
    pub country: String,
}

impl From<Author> for AuthorDto {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            birth_year: author.birth_year,
            country: author.country,
        }
    }
}
