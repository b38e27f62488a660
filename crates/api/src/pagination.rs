//! Pagination envelope
//!
//! List endpoints accept `page`/`limit` and answer with
//! `{count, next, previous, results}`. Link URLs preserve the caller's other
//! query parameters and only swap the `page` value.

use foodgram_common::config::PaginationConfig;
use serde::{Deserialize, Serialize};

/// Client-supplied pagination parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    /// 1-based page number
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to the configured bounds
    pub fn limit(&self, config: &PaginationConfig) -> u64 {
        self.limit
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size)
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build the envelope around one fetched page.
    ///
    /// `uri` is the request's path and query; sibling page links are derived
    /// from it.
    pub fn new(uri: &str, page: u64, limit: u64, count: u64, results: Vec<T>) -> Self {
        let next = if page * limit < count {
            Some(with_page(uri, page + 1))
        } else {
            None
        };

        let previous = if page > 1 {
            Some(with_page(uri, page - 1))
        } else {
            None
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Rebuild a path-and-query string with `page` set to the given value,
/// keeping every other parameter as-is.
fn with_page(uri: &str, page: u64) -> String {
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, query),
        None => (uri, ""),
    };

    let mut params: Vec<String> = query
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("page=") && *p != "page")
        .map(str::to_string)
        .collect();
    params.push(format!("page={}", page));

    format!("{}?{}", path, params.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig::default()
    }

    #[test]
    fn test_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(&config()), 6);
    }

    #[test]
    fn test_limit_clamped() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(&config()), 100);
    }

    #[test]
    fn test_with_page_preserves_filters() {
        let uri = "/api/recipes/?author=3&page=2&limit=6";
        assert_eq!(with_page(uri, 3), "/api/recipes/?author=3&limit=6&page=3");
    }

    #[test]
    fn test_with_page_without_query() {
        assert_eq!(with_page("/api/recipes/", 2), "/api/recipes/?page=2");
    }

    #[test]
    fn test_links_first_page() {
        let page: Page<i32> = Page::new("/api/recipes/?page=1", 1, 6, 13, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(page.count, 13);
        assert_eq!(page.next.as_deref(), Some("/api/recipes/?page=2"));
        assert!(page.previous.is_none());
    }

    #[test]
    fn test_links_last_page() {
        let page: Page<i32> = Page::new("/api/recipes/?page=3", 3, 6, 13, vec![13]);
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/api/recipes/?page=2"));
    }

    #[test]
    fn test_exact_multiple_has_no_next() {
        let page: Page<i32> = Page::new("/api/recipes/", 2, 6, 12, vec![]);
        assert!(page.next.is_none());
    }
}
