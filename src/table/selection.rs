//! Row selection shared between a table and the page that owns it.
//!
//! The page owns the selection as an ordered list of row IDs (for example,
//! the `selected` values of a query string). The table keeps a map from row
//! ID to whether it is selected, and reports changes back as a list of IDs.

use std::collections::HashMap;

/// The selected rows of a table.
///
/// The IDs mapped to `true` always equal the selection last reported to, or
/// seeded from, the owner. The order of IDs does not survive a round trip.
#[derive(Default)]
pub struct RowSelection<'a> {
    rows: HashMap<String, bool>,
    on_change: Option<Box<dyn FnMut(&[String]) + 'a>>,
}

impl std::fmt::Debug for RowSelection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSelection")
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl<'a> RowSelection<'a> {
    /// A selection seeded with `selected_ids`.
    pub fn new(selected_ids: &[String]) -> Self {
        let mut selection = Self::default();
        selection.sync_from_external(selected_ids);
        selection
    }

    /// Call `callback` with the selected IDs each time the table changes the selection.
    pub fn on_selected_rows_change(mut self, callback: impl FnMut(&[String]) + 'a) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Replace the selection with `selected_ids`.
    ///
    /// The change came from the owner, so the change callback is not called.
    pub fn sync_from_external(&mut self, selected_ids: &[String]) {
        self.rows = selected_ids
            .iter()
            .map(|id| (id.clone(), true))
            .collect();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.rows.get(id).copied().unwrap_or(false)
    }

    /// The selected IDs, sorted so that rendering is stable.
    pub fn selected_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .rows
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn selected_count(&self) -> usize {
        self.rows.values().filter(|selected| **selected).count()
    }

    /// Whether every row on the page is selected. An empty page is never fully selected.
    pub fn all_page_rows_selected(&self, page_ids: &[String]) -> bool {
        !page_ids.is_empty() && page_ids.iter().all(|id| self.is_selected(id))
    }

    pub fn toggle_row(&mut self, id: &str) {
        let selected = !self.is_selected(id);
        self.rows.insert(id.to_owned(), selected);
        self.notify();
    }

    pub fn set_row(&mut self, id: &str, selected: bool) {
        self.rows.insert(id.to_owned(), selected);
        self.notify();
    }

    /// Select every row on the page, or deselect them all if they are already selected.
    pub fn toggle_all_page_rows(&mut self, page_ids: &[String]) {
        let selected = !self.all_page_rows_selected(page_ids);
        self.set_all_page_rows(page_ids, selected);
    }

    pub fn set_all_page_rows(&mut self, page_ids: &[String], selected: bool) {
        for id in page_ids {
            self.rows.insert(id.clone(), selected);
        }
        self.notify();
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.notify();
    }

    /// Apply a click on the "select all" header checkbox.
    ///
    /// `header_checked` is the state of the checkbox after the click. Checking
    /// it selects the whole page unless that is already the case, unchecking
    /// it deselects the page only if the whole page was selected.
    pub fn apply_header_toggle(&mut self, page_ids: &[String], header_checked: bool) {
        let all_selected = self.all_page_rows_selected(page_ids);

        if header_checked && !all_selected {
            self.set_all_page_rows(page_ids, true);
        } else if !header_checked && all_selected {
            self.set_all_page_rows(page_ids, false);
        }
    }

    fn notify(&mut self) {
        if self.on_change.is_none() {
            return;
        }

        let selected_ids = self.selected_ids();

        if let Some(callback) = self.on_change.as_mut() {
            callback(&selected_ids);
        }
    }
}
