//! This modules defines the common configuration for paging data.

use serde::Deserialize;

/// The config for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// The page requested by a client, as read from the query string.
///
/// Page numbers in URLs are one-based.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationConfig {
    /// Resolve the requested page into a zero-based page index and a page size.
    ///
    /// Missing values fall back to the defaults, a page size of zero is
    /// replaced by the default and page sizes are capped at
    /// [PaginationConfig::max_page_size]. The page index is capped so that the
    /// row offset `page_index * page_size` fits in an SQLite integer.
    pub fn resolve(&self, query: &PageQuery) -> (u64, u64) {
        let page = query.page.unwrap_or(self.default_page).max(1);
        let page_size = match query.per_page {
            None | Some(0) => self.default_page_size,
            Some(page_size) => page_size.min(self.max_page_size),
        }
        .max(1);

        let max_page_index = i64::MAX as u64 / page_size;

        ((page - 1).min(max_page_index), page_size)
    }
}
