//! Paging and sorting shared by every listing endpoint

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::PagingConfig,
    error::{AppError, AppResult},
};

use super::{author::AuthorDto, book::BookDto, user::UserDto};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A validated sort key. `field` is always one of the whitelisted API names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub direction: Direction,
}

impl Sort {
    /// Parse `field` or `field,asc|desc` against the allowed field names.
    /// The first allowed field is the default.
    pub fn parse(raw: Option<&str>, allowed: &[&'static str]) -> AppResult<Self> {
        let default_field = allowed
            .first()
            .copied()
            .ok_or_else(|| AppError::Internal("No sortable fields declared".to_string()))?;

        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Sort {
                field: default_field,
                direction: Direction::Asc,
            });
        };

        let mut parts = raw.splitn(2, ',');
        let name = parts.next().unwrap_or_default().trim();
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            None => Direction::Asc,
            Some(d) if d == "asc" => Direction::Asc,
            Some(d) if d == "desc" => Direction::Desc,
            Some(d) => {
                return Err(AppError::BadRequest(format!("Invalid sort direction: {}", d)));
            }
        };

        let field = allowed
            .iter()
            .copied()
            .find(|f| *f == name)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Cannot sort by '{}'; allowed: {}",
                    name,
                    allowed.join(", ")
                ))
            })?;

        Ok(Sort { field, direction })
    }
}

/// Raw paging query parameters
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Zero-based page index (default: 0)
    pub page: Option<i64>,
    /// Page size (default: 10)
    pub size: Option<i64>,
    /// Sort key, `field` or `field,asc|desc`
    pub sort: Option<String>,
}

/// Normalized page request handed to repositories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: Sort,
}

impl PageRequest {
    /// Clamp page and size into range and resolve the sort key
    pub fn from_params(
        params: &PageParams,
        paging: &PagingConfig,
        sortable: &[&'static str],
    ) -> AppResult<Self> {
        let page = params.page.unwrap_or(0).max(0);
        let size = match params.size {
            Some(size) if size > 0 => size.min(paging.max_size),
            _ => paging.default_size,
        };
        let sort = Sort::parse(params.sort.as_deref(), sortable)?;
        Ok(Self { page, size, sort })
    }

    /// Rows to skip; saturates so far-out page indexes read as past the end
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results plus the total element count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.size <= 0 {
            return 1;
        }
        (self.total_elements + self.size - 1) / self.size
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages() - 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

/// Paged response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(PagedAuthors = PagedResponse<AuthorDto>, PagedBooks = PagedResponse<BookDto>, PagedUsers = PagedResponse<UserDto>)]
pub struct PagedResponse<T> {
    /// Items of the current page
    pub content: Vec<T>,
    /// Current page number
    pub page: i64,
    /// Current page size
    pub size: i64,
    /// Total number of elements
    pub total_elements: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Is first page
    pub is_first: bool,
    /// Is last page
    pub last: bool,
}

impl<T> From<Page<T>> for PagedResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        let is_first = page.is_first();
        let last = page.is_last();
        Self {
            content: page.content,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages,
            is_first,
            last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["title", "releaseYear", "genre"];

    fn request(page: i64, size: i64) -> PageRequest {
        PageRequest {
            page,
            size,
            sort: Sort {
                field: "title",
                direction: Direction::Asc,
            },
        }
    }

    #[test]
    fn total_pages_is_ceiling_of_elements_over_size() {
        for (total, size, expected) in [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (3, 2, 2)] {
            let page: Page<()> = Page::new(vec![], &request(0, size), total);
            assert_eq!(page.total_pages(), expected, "total={} size={}", total, size);
        }
    }

    #[test]
    fn last_flag_follows_page_index() {
        let first: Page<()> = Page::new(vec![], &request(0, 2), 3);
        assert!(first.is_first());
        assert!(!first.is_last());

        let second: Page<()> = Page::new(vec![], &request(1, 2), 3);
        assert!(!second.is_first());
        assert!(second.is_last());

        let empty: Page<()> = Page::new(vec![], &request(0, 10), 0);
        assert!(empty.is_last());
    }

    #[test]
    fn page_request_clamps_out_of_range_values() {
        let paging = PagingConfig::default();
        let params = PageParams {
            page: Some(-3),
            size: Some(10_000),
            sort: None,
        };
        let req = PageRequest::from_params(&params, &paging, FIELDS).unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.size, paging.max_size);

        let req = PageRequest::from_params(&PageParams::default(), &paging, FIELDS).unwrap();
        assert_eq!(req.size, paging.default_size);
        assert_eq!(req.sort.field, "title");
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn huge_page_index_saturates_instead_of_overflowing() {
        let paging = PagingConfig::default();
        let params = PageParams {
            page: Some(i64::MAX),
            size: Some(10),
            sort: None,
        };
        let req = PageRequest::from_params(&params, &paging, FIELDS).unwrap();
        assert_eq!(req.page, i64::MAX);
        assert_eq!(req.offset(), i64::MAX);

        let page: Page<()> = Page::new(vec![], &req, 42);
        assert!(page.is_last());
        assert!(!page.is_first());
    }

    #[test]
    fn sort_accepts_direction_and_rejects_unknown_fields() {
        let sort = Sort::parse(Some("releaseYear,desc"), FIELDS).unwrap();
        assert_eq!(sort.field, "releaseYear");
        assert_eq!(sort.direction, Direction::Desc);

        let sort = Sort::parse(Some("genre"), FIELDS).unwrap();
        assert_eq!(sort.direction, Direction::Asc);

        assert!(matches!(
            Sort::parse(Some("password"), FIELDS),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            Sort::parse(Some("title,sideways"), FIELDS),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn paged_response_carries_derived_flags() {
        let page = Page::new(vec![1, 2], &request(0, 2), 5);
        let response: PagedResponse<i32> = page.into();
        assert_eq!(response.total_pages, 3);
        assert!(response.is_first);
        assert!(!response.last);
        assert!(response.content.len() as i64 <= response.size);
    }
}
