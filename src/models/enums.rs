//! Shared domain enums

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Book genre classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genre {
    Classics,
    Fantasy,
    SciFi,
    Romance,
    Thriller,
    Mystery,
    Horror,
    Detective,
    Adventure,
    Historical,
    Biography,
    Poetry,
    Drama,
    NonFiction,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Classics => "CLASSICS",
            Genre::Fantasy => "FANTASY",
            Genre::SciFi => "SCI_FI",
            Genre::Romance => "ROMANCE",
            Genre::Thriller => "THRILLER",
            Genre::Mystery => "MYSTERY",
            Genre::Horror => "HORROR",
            Genre::Detective => "DETECTIVE",
            Genre::Adventure => "ADVENTURE",
            Genre::Historical => "HISTORICAL",
            Genre::Biography => "BIOGRAPHY",
            Genre::Poetry => "POETRY",
            Genre::Drama => "DRAMA",
            Genre::NonFiction => "NON_FICTION",
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CLASSICS" => Ok(Genre::Classics),
            "FANTASY" => Ok(Genre::Fantasy),
            "SCI_FI" => Ok(Genre::SciFi),
            "ROMANCE" => Ok(Genre::Romance),
            "THRILLER" => Ok(Genre::Thriller),
            "MYSTERY" => Ok(Genre::Mystery),
            "HORROR" => Ok(Genre::Horror),
            "DETECTIVE" => Ok(Genre::Detective),
            "ADVENTURE" => Ok(Genre::Adventure),
            "HISTORICAL" => Ok(Genre::Historical),
            "BIOGRAPHY" => Ok(Genre::Biography),
            "POETRY" => Ok(Genre::Poetry),
            "DRAMA" => Ok(Genre::Drama),
            "NON_FICTION" => Ok(Genre::NonFiction),
            _ => Err(format!("Invalid genre: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for Genre {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Genre {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<'r, Postgres>>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Genre {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// User role. Closed set: there is no role hierarchy beyond USER < ADMIN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<'r, Postgres>>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}
