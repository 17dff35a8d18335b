//! The categories listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, Render, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    category::{CategoryWithExpenseCount, db::get_categories_with_expense_counts},
    endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, base, delete_confirmation_message,
        edit_delete_action_links, error_banner, format_date,
    },
    navigation::NavBar,
    pagination::{PageQuery, PaginationConfig},
    table::{AutomaticPagination, ColumnDef, PageInfo, PinSide, TabularView, last_page_index},
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render the categories listing page, newest first.
///
/// Every category is loaded and the table shows one page of them.
pub async fn get_categories_page(
    user_id: UserID,
    State(state): State<CategoriesPageState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, Error> {
    let (page_index, page_size) = state.pagination_config.resolve(&query);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories_with_expense_counts(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"));

    let page_info = PageInfo {
        page_index,
        page_size,
    };

    Ok(categories_view(categories, page_info, query.per_page).into_response())
}

fn categories_page_url(page_info: PageInfo, per_page: Option<u64>) -> String {
    let mut params = Vec::new();

    if page_info.page_index > 0 {
        params.push(("page", (page_info.page_index + 1).to_string()));
    }

    if let Some(per_page) = per_page {
        params.push(("per_page", per_page.to_string()));
    }

    endpoints::with_query(endpoints::CATEGORIES_VIEW, &params)
}

fn delete_confirmation(category: &CategoryWithExpenseCount) -> String {
    let message = delete_confirmation_message(category.category.name.as_ref());

    match category.expense_count {
        0 => message,
        1 => format!("{message} 1 expense will be left without a category."),
        count => format!("{message} {count} expenses will be left without a category."),
    }
}

fn category_columns<'a>() -> Vec<ColumnDef<'a, CategoryWithExpenseCount>> {
    vec![
        ColumnDef::new("name", "Name", |row: &CategoryWithExpenseCount| {
            html! {
                div class="flex items-center gap-3"
                {
                    @if let Some(thumbnail_url) = &row.category.thumbnail_url {
                        img
                            src=(thumbnail_url)
                            alt=""
                            class="h-8 w-8 rounded object-cover";
                    } @else {
                        div class="h-8 w-8 rounded bg-gray-200 dark:bg-gray-600" {}
                    }

                    span class="font-medium text-gray-900 dark:text-white" { (row.category.name) }
                }
            }
        })
        .size(250),
        ColumnDef::new("created_at", "Created", |row: &CategoryWithExpenseCount| {
            html! { (format_date(row.category.created_at.date())) }
        }),
        ColumnDef::new("actions", "Actions", |row: &CategoryWithExpenseCount| {
            let edit_url =
                endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, row.category.id);
            let delete_url = endpoints::format_endpoint(endpoints::CATEGORY, row.category.id);

            edit_delete_action_links(
                &edit_url,
                &delete_url,
                &delete_confirmation(row),
                "closest tr",
                "delete",
            )
        })
        .pinned(PinSide::Right)
        .size(120),
    ]
}

fn categories_view(
    categories: Result<Vec<CategoryWithExpenseCount>, Error>,
    page_info: PageInfo,
    per_page: Option<u64>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table = match &categories {
        Ok(categories) => {
            let page_info = PageInfo {
                page_index: page_info
                    .page_index
                    .min(last_page_index(categories.len() as u64, page_info.page_size)),
                ..page_info
            };

            TabularView::new(
                "categories-table",
                category_columns(),
                categories,
                |row: &CategoryWithExpenseCount| row.category.id.to_string(),
            )
            .paginate(AutomaticPagination { page_info }, move |page_info| {
                categories_page_url(page_info, per_page)
            })
            .render()
        }
        Err(error) => error_banner(&format!("Error loading categories: {error}")),
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Create Category"
                    }
                }

                (table)
            }
        }
    );

    base("Categories", &[], &content)
}
