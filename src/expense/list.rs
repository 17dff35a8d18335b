//! The expenses listing page.
//!
//! Searching, filtering, sorting and paging are done in SQL. The page state
//! lives in the query string, and every control in the table links to the
//! same page with the new state.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, Render, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, UserID,
    category::{Category, CategoryId, get_all_categories},
    endpoints,
    expense::{
        Expense,
        query::{ExpensePage, ExpenseQuery, ExpenseSortColumn, query_expenses},
    },
    form::parse_date,
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base,
        delete_confirmation_message, edit_delete_action_links, error_banner, format_currency,
        format_date,
    },
    navigation::NavBar,
    pagination::{PageQuery, PaginationConfig},
    table::{
        ColumnDef, ColumnFilters, FilterDescriptor, FilterOption, FilterValue, ManualPagination,
        PageInfo, PinSide, RowSelection, Search, SortingState, TabularView, date_range_value,
        last_page_index,
    },
};

const TABLE_ID: &str = "expenses-table";
const DATE_FILTER: &str = "date";
const CATEGORY_FILTER: &str = "category";

/// The state needed for the expenses page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query string of the expenses page.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExpensesPageQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
    #[serde(default)]
    pub category: Vec<CategoryId>,
    #[serde(default)]
    pub selected: Vec<String>,
    /// Present when the "select all" checkbox is checked.
    pub select_all: Option<String>,
    /// Whether the "select all" checkbox was checked when the page was rendered.
    pub header_was_checked: Option<String>,
}

/// The state of the expenses table, used to build the links in the table.
#[derive(Debug, Clone, PartialEq)]
struct ListState {
    search: String,
    page_index: u64,
    page_size: u64,
    per_page: Option<u64>,
    sorting: SortingState,
    date_range: Option<(Date, Date)>,
    category_ids: Vec<CategoryId>,
    selected: Vec<String>,
}

impl ListState {
    fn from_query(query: &ExpensesPageQuery, config: &PaginationConfig) -> Self {
        let (page_index, page_size) = config.resolve(&PageQuery {
            page: query.page,
            per_page: query.per_page,
        });

        let sort = ExpenseSortColumn::from_column_id(&query.sort).unwrap_or_default();
        let descending = match query.order.as_str() {
            "asc" => false,
            "desc" => true,
            _ => query.sort.is_empty() || sort == ExpenseSortColumn::Date,
        };

        let date_range = match (parse_date(&query.date_from), parse_date(&query.date_to)) {
            (Ok(from), Ok(to)) if from <= to => Some((from, to)),
            (Ok(from), Ok(to)) => Some((to, from)),
            _ => None,
        };

        let mut category_ids = query.category.clone();
        category_ids.sort_unstable();
        category_ids.dedup();

        Self {
            search: query.q.trim().to_owned(),
            page_index,
            page_size,
            per_page: query.per_page,
            sorting: SortingState::new(sort.column_id(), descending),
            date_range,
            category_ids,
            selected: query.selected.clone(),
        }
    }

    fn expense_query(&self) -> ExpenseQuery {
        ExpenseQuery {
            search: self.search.clone(),
            date_range: self.date_range.map(|(from, to)| from..=to),
            category_ids: self.category_ids.clone(),
            sort: ExpenseSortColumn::from_column_id(&self.sorting.column_id).unwrap_or_default(),
            descending: self.sorting.descending,
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    fn column_filters(&self) -> ColumnFilters {
        let mut filters = ColumnFilters::new();
        filters.set(
            DATE_FILTER,
            self.date_range
                .and_then(|(from, to)| date_range_value(Some(from), Some(to))),
        );

        if !self.category_ids.is_empty() {
            filters.set(
                CATEGORY_FILTER,
                Some(FilterValue::Multi(
                    self.category_ids.iter().map(ToString::to_string).collect(),
                )),
            );
        }

        filters
    }

    fn with_filters(&self, filters: &ColumnFilters) -> Self {
        let category_ids = match filters.get(CATEGORY_FILTER) {
            Some(FilterValue::Multi(values)) => values
                .iter()
                .filter_map(|value| value.parse().ok())
                .collect::<BTreeSet<CategoryId>>()
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };

        Self {
            date_range: filters
                .get(DATE_FILTER)
                .and_then(FilterValue::date_range),
            category_ids,
            page_index: 0,
            ..self.clone()
        }
    }

    /// The query parameters for this state. The page is left out on the first page.
    fn params(&self, include_selected: bool) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if !self.search.is_empty() {
            params.push(("q", self.search.clone()));
        }

        if let Some((from, to)) = self.date_range {
            params.push(("date_from", from.to_string()));
            params.push(("date_to", to.to_string()));
        }

        for category_id in &self.category_ids {
            params.push(("category", category_id.to_string()));
        }

        params.push(("sort", self.sorting.column_id.clone()));
        params.push((
            "order",
            if self.sorting.descending { "desc" } else { "asc" }.to_owned(),
        ));

        if self.page_index > 0 {
            params.push(("page", (self.page_index + 1).to_string()));
        }

        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.to_string()));
        }

        if include_selected {
            for id in &self.selected {
                params.push(("selected", id.clone()));
            }
        }

        params
    }

    fn url(&self) -> String {
        endpoints::with_query(endpoints::EXPENSES_VIEW, &self.params(true))
    }
}

/// Resolve a click on the "select all" checkbox into the new selection.
fn resolve_selection(query: &ExpensesPageQuery, page_ids: &[String]) -> Vec<String> {
    let mut selected_ids = RowSelection::new(&query.selected).selected_ids();

    let Some(header_was_checked) = query.header_was_checked.as_deref() else {
        return selected_ids;
    };

    let header_checked = query.select_all.is_some();
    if header_checked == (header_was_checked == "true") {
        return selected_ids;
    }

    {
        let mut selection = RowSelection::new(&selected_ids)
            .on_selected_rows_change(|ids| selected_ids = ids.to_vec());
        selection.apply_header_toggle(page_ids, header_checked);
    }

    selected_ids
}

/// Render the expenses page.
pub async fn get_expenses_page(
    user_id: UserID,
    State(state): State<ExpensesPageState>,
    Query(query): Query<ExpensesPageQuery>,
) -> Result<Response, Error> {
    let mut list_state = ListState::from_query(&query, &state.pagination_config);

    let (page, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let mut page = query_expenses(user_id, &list_state.expense_query(), &connection);
        if let Ok(result) = &page {
            let last_page = last_page_index(result.total, list_state.page_size);
            if list_state.page_index > last_page {
                list_state.page_index = last_page;
                page = query_expenses(user_id, &list_state.expense_query(), &connection);
            }
        }
        let page =
            page.inspect_err(|error| tracing::error!("Failed to retrieve expenses: {error}"));
        let categories = get_all_categories(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))
            .unwrap_or_default();

        (page, categories)
    };

    if let Ok(page) = &page {
        let page_ids: Vec<String> = page
            .expenses
            .iter()
            .map(|expense| expense.id.to_string())
            .collect();
        list_state.selected = resolve_selection(&query, &page_ids);
    }

    Ok(expenses_view(&list_state, page, &categories).into_response())
}

fn expense_columns<'a>() -> Vec<ColumnDef<'a, Expense>> {
    vec![
        ColumnDef::new("name", "Name", |expense: &Expense| {
            html! {
                span class="font-medium text-gray-900 dark:text-white" { (expense.name) }
            }
        })
        .sortable()
        .size(200),
        ColumnDef::new("category", "Category", |expense: &Expense| match &expense.category {
            Some(category) => html! {
                span class=(BADGE_STYLE)
                {
                    @if let Some(thumbnail_url) = &category.thumbnail_url {
                        img src=(thumbnail_url) alt="" class="h-4 w-4 rounded-full object-cover";
                    }
                    (category.name)
                }
            },
            None => html! {
                span class="text-gray-400" { "Uncategorized" }
            },
        }),
        ColumnDef::new("amount", "Amount", |expense: &Expense| {
            html! { (format_currency(expense.amount)) }
        })
        .sortable()
        .size(120),
        ColumnDef::new("date", "Date", |expense: &Expense| {
            html! { (format_date(expense.date)) }
        })
        .sortable()
        .size(140),
        ColumnDef::new("actions", "Actions", |expense: &Expense| {
            let edit_url = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id);
            let delete_url = endpoints::format_endpoint(endpoints::EXPENSE, expense.id);

            edit_delete_action_links(
                &edit_url,
                &delete_url,
                &delete_confirmation_message(expense.name.as_ref()),
                "closest tr",
                "delete",
            )
        })
        .pinned(PinSide::Right)
        .size(120),
    ]
}

fn filter_descriptors(categories: &[Category]) -> Vec<FilterDescriptor> {
    vec![
        FilterDescriptor::Date {
            key: DATE_FILTER.to_owned(),
            title: "Date".to_owned(),
        },
        FilterDescriptor::MultiSelect {
            key: CATEGORY_FILTER.to_owned(),
            title: "Category".to_owned(),
            options: categories
                .iter()
                .map(|category| FilterOption::new(category.id.to_string(), category.name.as_ref()))
                .collect(),
        },
    ]
}

fn bulk_action_bar(list_state: &ListState) -> Markup {
    let count = list_state.selected.len();
    let clear_url = ListState {
        selected: Vec::new(),
        ..list_state.clone()
    }
    .url();
    let confirm_message = match count {
        1 => "Are you sure you want to delete 1 expense? This action cannot be undone.".to_owned(),
        count => {
            format!("Are you sure you want to delete {count} expenses? This action cannot be undone.")
        }
    };

    html! {
        span class="text-sm" { (count) " selected" }

        button
            type="button"
            hx-post=(endpoints::BULK_DELETE_EXPENSES)
            hx-confirm=(confirm_message)
            hx-target-error="#alert-container"
            hx-select="unset"
            hx-push-url="false"
            class=(BUTTON_DELETE_STYLE)
        {
            "Delete selected"
        }

        a href=(clear_url) hx-get=(clear_url) class="text-sm underline" { "Clear selection" }
    }
}

fn expenses_table(list_state: &ListState, page: &ExpensePage, categories: &[Category]) -> Markup {
    let page_info = PageInfo {
        page_index: list_state.page_index,
        page_size: list_state.page_size,
    };
    let search_url = endpoints::with_query(
        endpoints::EXPENSES_VIEW,
        &ListState {
            search: String::new(),
            page_index: 0,
            ..list_state.clone()
        }
        .params(true),
    );
    let selection_url = endpoints::with_query(endpoints::EXPENSES_VIEW, &list_state.params(false));

    TabularView::new(TABLE_ID, expense_columns(), &page.expenses, |expense: &Expense| {
        expense.id.to_string()
    })
    .paginate(
        ManualPagination {
            page_info,
            page_count: page.total.div_ceil(page_info.page_size.max(1)),
            total_rows: page.total,
        },
        |page_info: PageInfo| {
            ListState {
                page_index: page_info.page_index,
                ..list_state.clone()
            }
            .url()
        },
    )
    .search(Search {
        text: list_state.search.clone(),
        placeholder: "Search expenses...".to_owned(),
        url: search_url,
    })
    .filters(
        filter_descriptors(categories),
        list_state.column_filters(),
        |filters: &ColumnFilters| list_state.with_filters(filters).url(),
    )
    .sorting(
        Some(list_state.sorting.clone()),
        |sorting: &SortingState| {
            ListState {
                sorting: sorting.clone(),
                page_index: 0,
                ..list_state.clone()
            }
            .url()
        },
    )
    .selection(RowSelection::new(&list_state.selected), selection_url)
    .bulk_action_bar(bulk_action_bar(list_state))
    .render()
}

fn expenses_view(
    list_state: &ListState,
    page: Result<ExpensePage, Error>,
    categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    let table = match &page {
        Ok(page) => expenses_table(list_state, page, categories),
        Err(error) => error_banner(&format!("Error loading expenses: {error}")),
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Expenses" }

                    a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE)
                    {
                        "Record Expense"
                    }
                }

                (table)
            }
        }
    );

    base("Expenses", &[], &content)
}


#[cfg(test)]
mod expenses_page_tests {
    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        Error, UserID,
        category::{CategoryName, create_category},
        expense::{ExpenseName, NewExpense, create_expense},
        pagination::PaginationConfig,
        test_utils::{
            assert_valid_html, element_texts, get_test_connection, insert_test_user,
            parse_html_document, shared,
        },
    };

    use super::{ExpensesPageQuery, ExpensesPageState, ListState, expenses_view, get_expenses_page};

    fn insert(owner: UserID, name: &str, category_id: Option<i64>, day: u8, connection: &Connection) {
        create_expense(
            owner,
            NewExpense {
                name: ExpenseName::new_unchecked(name),
                category_id,
                amount: 4.5,
                date: date!(2024 - 03 - 01).replace_day(day).unwrap(),
            },
            connection,
        )
        .unwrap();
    }

    async fn render(
        connection: Connection,
        user_id: UserID,
        query: &str,
    ) -> Html {
        let state = ExpensesPageState {
            db_connection: shared(connection),
            pagination_config: PaginationConfig::default(),
        };
        let query: ExpensesPageQuery = serde_html_form::from_str(query).unwrap();

        let response = get_expenses_page(user_id, State(state), Query(query))
            .await
            .expect("Could not render page");

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    #[tokio::test]
    async fn users_only_see_their_own_expenses() {
        let connection = get_test_connection();
        let alice = insert_test_user("alice@example.com", &connection);
        let bob = insert_test_user("bob@example.com", &connection);
        insert(alice, "Coffee", None, 1, &connection);

        let state = shared(connection);
        let render_for = |user_id: UserID| {
            let state = ExpensesPageState {
                db_connection: state.clone(),
                pagination_config: PaginationConfig::default(),
            };
            async move {
                let response = get_expenses_page(user_id, State(state), Query(Default::default()))
                    .await
                    .unwrap();
                parse_html_document(response).await
            }
        };

        let alice_page = render_for(alice).await;
        assert_eq!(element_texts(&alice_page, "tbody td:nth-child(2) span"), ["Coffee"]);
        assert_eq!(
            element_texts(&alice_page, "tbody td:nth-child(4)"),
            ["$4.50"]
        );
        assert_eq!(
            element_texts(&alice_page, "tbody td:nth-child(5)"),
            ["Mar 01, 2024"]
        );

        let bob_page = render_for(bob).await;
        assert_eq!(element_texts(&bob_page, "tbody td"), ["No results."]);
    }

    #[tokio::test]
    async fn shows_requested_page_with_server_total() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        for day in 1..=23 {
            insert(user_id, &format!("#{day}"), None, day, &connection);
        }

        let html = render(connection, user_id, "page=3&sort=date&order=asc").await;

        assert_eq!(
            element_texts(&html, "tbody td:nth-child(2) span"),
            ["#21", "#22", "#23"]
        );
        assert_eq!(
            element_texts(&html, "[data-footer-label]"),
            ["Showing 21 to 23 of 23"]
        );
    }

    #[tokio::test]
    async fn page_past_the_end_shows_last_page() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        for day in 1..=23 {
            insert(user_id, &format!("#{day}"), None, day, &connection);
        }

        let html = render(connection, user_id, "page=50&sort=date&order=asc").await;

        assert_eq!(
            element_texts(&html, "tbody td:nth-child(2) span"),
            ["#21", "#22", "#23"]
        );
        assert_eq!(
            element_texts(&html, "[data-footer-label]"),
            ["Showing 21 to 23 of 23"]
        );
    }

    #[tokio::test]
    async fn huge_page_number_does_not_poison_the_database_lock() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        insert(user_id, "Coffee", None, 1, &connection);
        let db_connection = shared(connection);
        let state = ExpensesPageState {
            db_connection: db_connection.clone(),
            pagination_config: PaginationConfig::default(),
        };
        let query: ExpensesPageQuery =
            serde_html_form::from_str("page=18446744073709551615").unwrap();

        let response = get_expenses_page(user_id, State(state.clone()), Query(query))
            .await
            .expect("Could not render page");

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_eq!(element_texts(&html, "tbody td:nth-child(2) span"), ["Coffee"]);
        assert!(!db_connection.is_poisoned());
        get_expenses_page(user_id, State(state), Query(Default::default()))
            .await
            .expect("Could not render page after a huge page number");
    }

    #[tokio::test]
    async fn filters_by_category() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let food =
            create_category(user_id, CategoryName::new_unchecked("Food"), None, &connection)
                .unwrap();
        insert(user_id, "Lunch", Some(food.id), 1, &connection);
        insert(user_id, "Bus", None, 2, &connection);

        let html = render(connection, user_id, &format!("category={}", food.id)).await;

        assert_eq!(element_texts(&html, "tbody td:nth-child(2) span"), ["Lunch"]);
        assert_eq!(element_texts(&html, "[data-filter=category] [data-badge]"), ["Food✕"]);
    }

    #[tokio::test]
    async fn selected_rows_show_bulk_action_bar() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        insert(user_id, "Coffee", None, 1, &connection);
        insert(user_id, "Tea", None, 2, &connection);

        let html = render(
            connection,
            user_id,
            "select_all=true&header_was_checked=false",
        )
        .await;

        let checked = html
            .select(&Selector::parse("tbody input[name=selected][checked]").unwrap())
            .count();
        assert_eq!(checked, 2);
        let bar = html
            .select(&Selector::parse("[data-bulk-action-bar] button").unwrap())
            .next()
            .expect("No bulk action bar");
        assert_eq!(bar.value().attr("hx-post"), Some("/api/expenses/bulk_delete"));
        assert_eq!(bar.value().attr("type"), Some("button"));
    }

    #[test]
    fn shows_banner_on_error() {
        let state = ListState::from_query(&ExpensesPageQuery::default(), &PaginationConfig::default());

        let markup = expenses_view(&state, Err(Error::DatabaseLockError), &[]);

        let html = Html::parse_document(&markup.into_string());
        assert_eq!(
            element_texts(&html, "[data-error-banner]"),
            ["Error loading expenses: could not acquire the database lock"]
        );
    }
}
