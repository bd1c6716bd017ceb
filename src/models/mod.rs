//! Data models for the book catalog

pub mod author;
pub mod book;
pub mod enums;
pub mod paging;
pub mod user;
pub mod validation;

// Re-export commonly used types
pub use author::{Author, AuthorDto, AuthorRequest};
pub use book::{Book, BookDto, BookFilter, BookQuery, BookRequest};
pub use enums::{Genre, Role};
pub use paging::{Page, PageParams, PageRequest, PagedResponse};
pub use user::{Caller, User, UserDto, UserRequest};
