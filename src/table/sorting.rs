//! Sortable column headers.

use maud::{Markup, html};

/// The column the rows are sorted by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortingState {
    pub column_id: String,
    pub descending: bool,
}

impl SortingState {
    pub fn new(column_id: impl Into<String>, descending: bool) -> Self {
        Self {
            column_id: column_id.into(),
            descending,
        }
    }

    /// The sort after clicking the header of `column_id`.
    ///
    /// A new column sorts ascending, the current column flips direction.
    pub fn toggled(current: Option<&SortingState>, column_id: &str) -> SortingState {
        match current {
            Some(current) if current.column_id == column_id => SortingState {
                column_id: column_id.to_owned(),
                descending: !current.descending,
            },
            _ => SortingState::new(column_id, false),
        }
    }

    /// The direction `column_id` is sorted in, if it is the sorted column.
    pub fn direction_of(current: Option<&SortingState>, column_id: &str) -> Option<bool> {
        current
            .filter(|current| current.column_id == column_id)
            .map(|current| current.descending)
    }
}

/// A header that links to the toggled sort for `column_id`.
pub(crate) fn sortable_header(
    header: &str,
    column_id: &str,
    current: Option<&SortingState>,
    sort_link: &dyn Fn(&SortingState) -> String,
) -> Markup {
    let url = sort_link(&SortingState::toggled(current, column_id));
    let (arrow, aria_sort) = match SortingState::direction_of(current, column_id) {
        Some(true) => ("↓", "descending"),
        Some(false) => ("↑", "ascending"),
        None => ("↕", "none"),
    };

    html! {
        a href=(url) hx-get=(url) class="inline-flex items-center gap-1" aria-sort=(aria_sort)
        {
            (header)
            span aria-hidden="true" class="text-gray-400" { (arrow) }
        }
    }
}

#[cfg(test)]
mod sorting_state_tests {
    use super::SortingState;

    #[test]
    fn new_column_sorts_ascending() {
        let current = SortingState::new("date", true);

        assert_eq!(
            SortingState::toggled(Some(&current), "amount"),
            SortingState::new("amount", false)
        );
        assert_eq!(
            SortingState::toggled(None, "amount"),
            SortingState::new("amount", false)
        );
    }

    #[test]
    fn same_column_flips_direction() {
        let ascending = SortingState::new("name", false);
        let descending = SortingState::toggled(Some(&ascending), "name");

        assert_eq!(descending, SortingState::new("name", true));
        assert_eq!(
            SortingState::toggled(Some(&descending), "name"),
            ascending
        );
    }
}
