//! Pagination strategies and the pager shown in the table footer.

use std::ops::Range;

use maud::{Markup, html};

/// The page being displayed. Page indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page_index: u64,
    pub page_size: u64,
}

/// Decides which of the table's rows are shown and how many pages there are.
pub trait Paginator {
    fn page_info(&self) -> PageInfo;

    /// The number of pages, given that the table was handed `row_count` rows.
    fn page_count(&self, row_count: usize) -> u64;

    /// The total number of rows across all pages.
    fn total_rows(&self, row_count: usize) -> u64;

    /// The slice of the table's rows that make up the current page.
    fn page_range(&self, row_count: usize) -> Range<usize>;
}

/// The rows handed to the table are already the current page.
///
/// The server reports the page count and total, the table never slices rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualPagination {
    pub page_info: PageInfo,
    pub page_count: u64,
    pub total_rows: u64,
}

impl Paginator for ManualPagination {
    fn page_info(&self) -> PageInfo {
        self.page_info
    }

    fn page_count(&self, _row_count: usize) -> u64 {
        self.page_count
    }

    fn total_rows(&self, _row_count: usize) -> u64 {
        self.total_rows
    }

    fn page_range(&self, row_count: usize) -> Range<usize> {
        0..row_count
    }
}

/// The table is handed every row and shows one page of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomaticPagination {
    pub page_info: PageInfo,
}

impl Paginator for AutomaticPagination {
    fn page_info(&self) -> PageInfo {
        self.page_info
    }

    fn page_count(&self, row_count: usize) -> u64 {
        let page_size = self.page_info.page_size.max(1);
        (row_count as u64).div_ceil(page_size)
    }

    fn total_rows(&self, row_count: usize) -> u64 {
        row_count as u64
    }

    fn page_range(&self, row_count: usize) -> Range<usize> {
        let page_size = self.page_info.page_size.max(1);
        let start = self.page_info.page_index.saturating_mul(page_size);
        let end = start.saturating_add(page_size);

        let start = usize::try_from(start).unwrap_or(usize::MAX).min(row_count);
        let end = usize::try_from(end).unwrap_or(usize::MAX).min(row_count);

        start..end
    }
}

const MAX_PAGE_BUTTONS: u64 = 5;

/// The one-based page numbers to show as buttons, at most five of them,
/// centred on the current page where possible.
pub fn page_window(page_index: u64, page_count: u64) -> Vec<u64> {
    if page_count <= MAX_PAGE_BUTTONS {
        return (1..=page_count).collect();
    }

    let current = page_index.saturating_add(1);
    let mut start = current.saturating_sub(2);
    let mut end = current.saturating_add(2);

    if start < 1 {
        start = 1;
        end = start + MAX_PAGE_BUTTONS - 1;
    }

    if end > page_count {
        end = page_count;
        start = end - (MAX_PAGE_BUTTONS - 1);
    }

    (start..=end).collect()
}

pub fn can_previous(page_index: u64) -> bool {
    page_index > 0
}

pub fn can_next(page_index: u64, page_count: u64) -> bool {
    page_index.saturating_add(1) < page_count
}

/// The zero-based index of the last page of `total_rows` rows, or 0 when there are no rows.
pub fn last_page_index(total_rows: u64, page_size: u64) -> u64 {
    total_rows.saturating_sub(1) / page_size.max(1)
}

/// The summary shown in the table footer.
///
/// `total_rows` is `None` when the table is not paginated.
pub fn footer_label(page_info: Option<PageInfo>, row_count: usize, total_rows: u64) -> String {
    let Some(page_info) = page_info else {
        return format!("Showing {row_count} rows");
    };

    if total_rows == 0 {
        return "Showing 0 results".to_owned();
    }

    let start = page_info
        .page_index
        .saturating_mul(page_info.page_size)
        .saturating_add(1)
        .min(total_rows);
    let end = start
        .saturating_add(page_info.page_size.saturating_sub(1))
        .min(total_rows);

    format!("Showing {start} to {end} of {total_rows}")
}

const PAGER_BUTTON_STYLE: &str = "px-3 py-1 rounded border border-gray-300 \
    dark:border-gray-600 hover:bg-gray-100 dark:hover:bg-gray-700";
const PAGER_CURRENT_STYLE: &str = "px-3 py-1 rounded border border-blue-600 \
    bg-blue-50 text-blue-700 dark:bg-blue-600/20 dark:text-blue-200";
const PAGER_DISABLED_STYLE: &str = "px-3 py-1 rounded border border-gray-200 \
    dark:border-gray-700 text-gray-400 dark:text-gray-500 cursor-not-allowed";

/// Previous, numbered and next buttons linking to the URLs from `page_link`.
pub(crate) fn pager(
    page_info: PageInfo,
    page_count: u64,
    page_link: &dyn Fn(PageInfo) -> String,
) -> Markup {
    let link_to = |page_index: u64| {
        page_link(PageInfo {
            page_index,
            page_size: page_info.page_size,
        })
    };

    html! {
        nav class="flex items-center gap-1" aria-label="Pagination"
        {
            @if can_previous(page_info.page_index) {
                @let url = link_to(page_info.page_index - 1);
                a href=(url) hx-get=(url) class=(PAGER_BUTTON_STYLE) { "Previous" }
            } @else {
                span class=(PAGER_DISABLED_STYLE) aria-disabled="true" { "Previous" }
            }

            @for page in page_window(page_info.page_index, page_count) {
                @if page == page_info.page_index.saturating_add(1) {
                    span class=(PAGER_CURRENT_STYLE) aria-current="page" { (page) }
                } @else {
                    @let url = link_to(page - 1);
                    a href=(url) hx-get=(url) class=(PAGER_BUTTON_STYLE) { (page) }
                }
            }

            @if can_next(page_info.page_index, page_count) {
                @let url = link_to(page_info.page_index + 1);
                a href=(url) hx-get=(url) class=(PAGER_BUTTON_STYLE) { "Next" }
            } @else {
                span class=(PAGER_DISABLED_STYLE) aria-disabled="true" { "Next" }
            }
        }
    }
}

#[cfg(test)]
mod page_window_tests {
    use super::{can_next, can_previous, page_window};

    #[test]
    fn first_page_of_many() {
        assert_eq!(page_window(0, 12), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn middle_page_is_centred() {
        assert_eq!(page_window(6, 12), [5, 6, 7, 8, 9]);
    }

    #[test]
    fn last_page_of_many() {
        assert_eq!(page_window(11, 12), [8, 9, 10, 11, 12]);
    }

    #[test]
    fn few_pages_shows_all() {
        assert_eq!(page_window(0, 3), [1, 2, 3]);
        assert_eq!(page_window(2, 3), [1, 2, 3]);
    }

    #[test]
    fn no_pages() {
        assert!(page_window(0, 0).is_empty());
    }

    #[test]
    fn previous_and_next_are_disabled_at_the_ends() {
        assert!(!can_previous(0));
        assert!(can_previous(1));
        assert!(can_next(0, 2));
        assert!(!can_next(1, 2));
        assert!(!can_next(0, 0));
    }
}
