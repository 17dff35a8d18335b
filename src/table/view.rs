//! The table component that pages compose.

use maud::{Markup, Render, html};

use crate::html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, loading_spinner};

use super::{
    column::{ColumnDef, ColumnLayout, pinning_styles},
    filter::{ColumnFilters, FilterDescriptor},
    pagination::{PageInfo, Paginator, footer_label, pager},
    selection::RowSelection,
    sorting::{SortingState, sortable_header},
    toolbar::{Filters, Search, toolbar},
};

/// The width of the checkbox column added for row selection.
pub const SELECT_COLUMN_SIZE: u32 = 32;
/// The ID of the checkbox column added for row selection.
pub const SELECT_COLUMN_ID: &str = "select";

struct Pagination<'a> {
    paginator: Box<dyn Paginator + 'a>,
    page_link: Box<dyn Fn(PageInfo) -> String + 'a>,
}

struct Sorting<'a> {
    state: Option<SortingState>,
    sort_link: Box<dyn Fn(&SortingState) -> String + 'a>,
}

struct Selection<'a> {
    rows: RowSelection<'a>,
    url: String,
}

/// A table of `rows` with optional search, filters, sorting, pagination and
/// row selection.
///
/// The table only displays what it is given. Searching, filtering and sorting
/// are done by the page that owns the table, and every control links to the
/// URL the page returns for the new state. Each page is rendered from the
/// container `#{id}`, so controls swap the whole container with the same
/// element from the response.
pub struct TabularView<'a, T> {
    id: &'a str,
    columns: Vec<ColumnDef<'a, T>>,
    rows: &'a [T],
    row_id: Box<dyn Fn(&T) -> String + 'a>,
    pagination: Option<Pagination<'a>>,
    filters: Option<Filters<'a>>,
    search: Option<Search>,
    sorting: Option<Sorting<'a>>,
    selection: Option<Selection<'a>>,
    show_table_header: bool,
    show_table_footer: bool,
    show_table: bool,
    loading: bool,
    custom_filters: Option<Markup>,
    bulk_action_bar: Option<Markup>,
    row_class: Option<Box<dyn Fn(&T) -> Option<String> + 'a>>,
}

impl<'a, T> TabularView<'a, T> {
    /// A table with the element ID `id`. Each row is identified by `row_id`.
    pub fn new(
        id: &'a str,
        columns: Vec<ColumnDef<'a, T>>,
        rows: &'a [T],
        row_id: impl Fn(&T) -> String + 'a,
    ) -> Self {
        Self {
            id,
            columns,
            rows,
            row_id: Box::new(row_id),
            pagination: None,
            filters: None,
            search: None,
            sorting: None,
            selection: None,
            show_table_header: true,
            show_table_footer: true,
            show_table: true,
            loading: false,
            custom_filters: None,
            bulk_action_bar: None,
            row_class: None,
        }
    }

    /// Split the rows into pages. Page buttons link to `page_link(page)`.
    pub fn paginate(
        mut self,
        paginator: impl Paginator + 'a,
        page_link: impl Fn(PageInfo) -> String + 'a,
    ) -> Self {
        self.pagination = Some(Pagination {
            paginator: Box::new(paginator),
            page_link: Box::new(page_link),
        });
        self
    }

    /// Show a widget for each of `descriptors`, linking changes to `filter_link(new filters)`.
    pub fn filters(
        mut self,
        descriptors: Vec<FilterDescriptor>,
        state: ColumnFilters,
        filter_link: impl Fn(&ColumnFilters) -> String + 'a,
    ) -> Self {
        self.filters = Some(Filters {
            descriptors,
            state,
            link: Box::new(filter_link),
        });
        self
    }

    pub fn search(mut self, search: Search) -> Self {
        self.search = Some(search);
        self
    }

    /// Make the sortable column headers link to `sort_link(new sort)`.
    pub fn sorting(
        mut self,
        state: Option<SortingState>,
        sort_link: impl Fn(&SortingState) -> String + 'a,
    ) -> Self {
        self.sorting = Some(Sorting {
            state,
            sort_link: Box::new(sort_link),
        });
        self
    }

    /// Add a checkbox column. Checking a box requests `url` with the
    /// selected row IDs as `selected`.
    pub fn selection(mut self, rows: RowSelection<'a>, url: impl Into<String>) -> Self {
        self.selection = Some(Selection {
            rows,
            url: url.into(),
        });
        self
    }

    pub fn show_table_header(mut self, show: bool) -> Self {
        self.show_table_header = show;
        self
    }

    pub fn show_table_footer(mut self, show: bool) -> Self {
        self.show_table_footer = show;
        self
    }

    pub fn show_table(mut self, show: bool) -> Self {
        self.show_table = show;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn custom_filters(mut self, markup: Markup) -> Self {
        self.custom_filters = Some(markup);
        self
    }

    /// Shown above the table while at least one row is selected.
    pub fn bulk_action_bar(mut self, markup: Markup) -> Self {
        self.bulk_action_bar = Some(markup);
        self
    }

    pub fn row_class(mut self, row_class: impl Fn(&T) -> Option<String> + 'a) -> Self {
        self.row_class = Some(Box::new(row_class));
        self
    }

    /// The rows on the current page.
    fn page_rows(&self) -> &'a [T] {
        let rows: &'a [T] = self.rows;

        match &self.pagination {
            Some(pagination) => &rows[pagination.paginator.page_range(rows.len())],
            None => rows,
        }
    }

    fn selection_form_id(&self) -> String {
        format!("{}-selection", self.id)
    }

    fn render_table(&self, page_rows: &[T]) -> Markup {
        let visible_columns: Vec<&ColumnDef<'a, T>> =
            self.columns.iter().filter(|column| column.visible).collect();

        let mut layouts: Vec<ColumnLayout> = Vec::with_capacity(visible_columns.len() + 1);
        if self.selection.is_some() {
            layouts.push(ColumnLayout {
                pin: None,
                size: SELECT_COLUMN_SIZE,
            });
        }
        layouts.extend(visible_columns.iter().map(|column| column.layout()));

        let styles = pinning_styles(&layouts);
        let (select_style, column_styles) = match &self.selection {
            Some(_) => (styles.first().cloned(), styles.get(1..).unwrap_or_default()),
            None => (None, styles.as_slice()),
        };
        let column_count = layouts.len();

        let page_ids: Vec<String> = page_rows.iter().map(|row| (self.row_id)(row)).collect();

        html! {
            div class="overflow-x-auto rounded border border-gray-200 dark:border-gray-700"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    @if self.show_table_header {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                @if let Some(selection) = &self.selection {
                                    @let all_selected = selection.rows.all_page_rows_selected(&page_ids);
                                    th scope="col" class="px-2 py-3" style=[select_style.as_deref()] data-column-id=(SELECT_COLUMN_ID)
                                    {
                                        input
                                            type="checkbox"
                                            name="select_all"
                                            value="true"
                                            checked[all_selected]
                                            aria-label="Select all";
                                        input
                                            type="hidden"
                                            name="header_was_checked"
                                            value=(if all_selected { "true" } else { "false" });
                                    }
                                }

                                @for (column, style) in visible_columns.iter().zip(column_styles) {
                                    th scope="col" class="px-6 py-3" style=(style) data-column-id=(column.id)
                                    {
                                        @match (&self.sorting, column.sortable) {
                                            (Some(sorting), true) => {
                                                (sortable_header(
                                                    column.header,
                                                    column.id,
                                                    sorting.state.as_ref(),
                                                    sorting.sort_link.as_ref(),
                                                ))
                                            }
                                            _ => { (column.header) }
                                        }
                                    }
                                }
                            }
                        }
                    }

                    tbody class=[self.loading.then_some("animate-pulse")]
                    {
                        @if page_rows.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan=(column_count) class="h-24 text-center"
                                {
                                    @if self.loading {
                                        span data-loading { (loading_spinner()) }
                                    } @else {
                                        "No results."
                                    }
                                }
                            }
                        }

                        @for (row, row_id) in page_rows.iter().zip(&page_ids) {
                            @let row_style = match self.row_class.as_ref().and_then(|row_class| row_class(row)) {
                                Some(row_class) => format!("{TABLE_ROW_STYLE} {row_class}"),
                                None => TABLE_ROW_STYLE.to_owned(),
                            };
                            tr data-row-id=(row_id) class=(row_style)
                            {
                                @if let Some(selection) = &self.selection {
                                    td class="px-2 py-4" style=[select_style.as_deref()]
                                    {
                                        input
                                            type="checkbox"
                                            name="selected"
                                            value=(row_id)
                                            checked[selection.rows.is_selected(row_id)]
                                            aria-label="Select row";
                                    }
                                }

                                @for (column, style) in visible_columns.iter().zip(column_styles) {
                                    td class=(TABLE_CELL_STYLE) style=(style)
                                    {
                                        (column.render_cell(row))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn render_footer(&self, page_rows: &[T]) -> Markup {
        let (label, pager_markup) = match &self.pagination {
            Some(pagination) => {
                let page_info = pagination.paginator.page_info();
                let total_rows = pagination.paginator.total_rows(self.rows.len());
                let page_count = pagination.paginator.page_count(self.rows.len());

                let pager_markup = (total_rows > 0)
                    .then(|| pager(page_info, page_count, pagination.page_link.as_ref()));

                (
                    footer_label(Some(page_info), page_rows.len(), total_rows),
                    pager_markup,
                )
            }
            None => (
                footer_label(None, page_rows.len(), page_rows.len() as u64),
                None,
            ),
        };

        html! {
            div class="flex flex-wrap items-center justify-between gap-2 mt-2 text-sm" data-table-footer
            {
                p data-footer-label { (label) }

                @if let Some(pager_markup) = pager_markup {
                    (pager_markup)
                }
            }
        }
    }
}

impl<T> Render for TabularView<'_, T> {
    fn render(&self) -> Markup {
        let page_rows = self.page_rows();
        let container_target = format!("#{}", self.id);

        let body = html! {
            @if let Some(selection) = &self.selection {
                @if selection.rows.selected_count() > 0 {
                    @if let Some(bulk_action_bar) = &self.bulk_action_bar {
                        div class="flex items-center gap-2 mb-2" data-bulk-action-bar
                        {
                            (bulk_action_bar)
                        }
                    }
                }
            }

            @if self.show_table {
                (self.render_table(page_rows))
            }
        };

        html! {
            div
                id=(self.id)
                class="w-full"
                hx-target=(container_target)
                hx-select=(container_target)
                hx-swap="outerHTML"
                hx-push-url="true"
            {
                @if self.show_table_header {
                    @if let Some(search) = &self.search {
                        (toolbar(
                            search,
                            self.filters.as_ref(),
                            self.custom_filters.as_ref(),
                            self.loading,
                        ))
                    }
                }

                @if let Some(selection) = &self.selection {
                    @let page_ids: Vec<String> = page_rows.iter().map(|row| (self.row_id)(row)).collect();
                    form
                        id=(self.selection_form_id())
                        hx-get=(selection.url)
                        hx-trigger="change"
                    {
                        @for selected_id in selection.rows.selected_ids() {
                            @if !page_ids.contains(&selected_id) {
                                input type="hidden" name="selected" value=(selected_id);
                            }
                        }

                        (body)
                    }
                } @else {
                    (body)
                }

                @if self.show_table_footer {
                    (self.render_footer(page_rows))
                }
            }
        }
    }
}
