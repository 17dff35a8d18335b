//! The payments listing page.

use std::sync::{Arc, Mutex};

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
    AppState, Error, UserID, endpoints,
    form::parse_date,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, base, delete_confirmation_message,
        edit_delete_action_links, error_banner, format_currency, format_date,
    },
    navigation::NavBar,
    pagination::{PageQuery, PaginationConfig},
    payment::{
        Payment,
        db::get_payment_sources,
        query::{PaymentPage, PaymentQuery, query_payments},
    },
    table::{
        ColumnDef, ColumnFilters, FilterDescriptor, FilterOption, FilterValue, ManualPagination,
        PageInfo, PinSide, Search, TabularView, date_range_value, last_page_index,
    },
};

const TABLE_ID: &str = "payments-table";
const DATE_FILTER: &str = "date";
const SOURCE_FILTER: &str = "payment_from";

/// The state needed for the payments page.
#[derive(Debug, Clone)]
pub struct PaymentsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for PaymentsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query string of the payments page.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaymentsPageQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
    #[serde(default)]
    pub payment_from: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ListState {
    search: String,
    page_index: u64,
    page_size: u64,
    per_page: Option<u64>,
    date_range: Option<(Date, Date)>,
    payment_from: Option<String>,
}

impl ListState {
    fn from_query(query: &PaymentsPageQuery, config: &PaginationConfig) -> Self {
        let (page_index, page_size) = config.resolve(&PageQuery {
            page: query.page,
            per_page: query.per_page,
        });

        let date_range = match (parse_date(&query.date_from), parse_date(&query.date_to)) {
            (Ok(from), Ok(to)) if from <= to => Some((from, to)),
            (Ok(from), Ok(to)) => Some((to, from)),
            _ => None,
        };

        Self {
            search: query.q.trim().to_owned(),
            page_index,
            page_size,
            per_page: query.per_page,
            date_range,
            payment_from: Some(query.payment_from.trim())
                .filter(|source| !source.is_empty())
                .map(ToOwned::to_owned),
        }
    }

    fn payment_query(&self) -> PaymentQuery {
        PaymentQuery {
            search: self.search.clone(),
            date_range: self.date_range.map(|(from, to)| from..=to),
            payment_from: self.payment_from.clone(),
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
        filters.set(SOURCE_FILTER, self.payment_from.clone().map(FilterValue::Single));
        filters
    }

    fn with_filters(&self, filters: &ColumnFilters) -> Self {
        Self {
            date_range: filters.get(DATE_FILTER).and_then(FilterValue::date_range),
            payment_from: match filters.get(SOURCE_FILTER) {
                Some(FilterValue::Single(source)) => Some(source.clone()),
                _ => None,
            },
            page_index: 0,
            ..self.clone()
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if !self.search.is_empty() {
            params.push(("q", self.search.clone()));
        }

        if let Some((from, to)) = self.date_range {
            params.push(("date_from", from.to_string()));
            params.push(("date_to", to.to_string()));
        }

        if let Some(payment_from) = &self.payment_from {
            params.push(("payment_from", payment_from.clone()));
        }

        if self.page_index > 0 {
            params.push(("page", (self.page_index + 1).to_string()));
        }

        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.to_string()));
        }

        params
    }

    fn url(&self) -> String {
        endpoints::with_query(endpoints::PAYMENTS_VIEW, &self.params())
    }
}

/// Render the payments page.
pub async fn get_payments_page(
    user_id: UserID,
    State(state): State<PaymentsPageState>,
    Query(query): Query<PaymentsPageQuery>,
) -> Result<Response, Error> {
    let mut list_state = ListState::from_query(&query, &state.pagination_config);

    let (page, sources) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let mut page = query_payments(user_id, &list_state.payment_query(), &connection);
        if let Ok(result) = &page {
            let last_page = last_page_index(result.total, list_state.page_size);
            if list_state.page_index > last_page {
                list_state.page_index = last_page;
                page = query_payments(user_id, &list_state.payment_query(), &connection);
            }
        }
        let page =
            page.inspect_err(|error| tracing::error!("Failed to retrieve payments: {error}"));
        let sources = get_payment_sources(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve payment sources: {error}"))
            .unwrap_or_default();

        (page, sources)
    };

    Ok(payments_view(&list_state, page, &sources).into_response())
}

fn payment_columns<'a>() -> Vec<ColumnDef<'a, Payment>> {
    vec![
        ColumnDef::new("amount", "Amount", |payment: &Payment| {
            html! {
                span class="font-medium text-gray-900 dark:text-white"
                {
                    (format_currency(payment.amount))
                }
            }
        })
        .size(120),
        ColumnDef::new("payment_from", "Payment From", |payment: &Payment| {
            html! { (payment.payment_from.as_deref().unwrap_or("-")) }
        }),
        ColumnDef::new("date", "Date", |payment: &Payment| {
            html! { (format_date(payment.date)) }
        })
        .size(140),
        ColumnDef::new("created_at", "Created At", |payment: &Payment| {
            html! { (format_date(payment.created_at.date())) }
        })
        .size(140),
        ColumnDef::new("actions", "Actions", |payment: &Payment| {
            let edit_url = endpoints::format_endpoint(endpoints::EDIT_PAYMENT_VIEW, payment.id);
            let delete_url = endpoints::format_endpoint(endpoints::PAYMENT, payment.id);
            let name = match &payment.payment_from {
                Some(source) => format!("{} from {source}", format_currency(payment.amount)),
                None => format_currency(payment.amount),
            };

            edit_delete_action_links(
                &edit_url,
                &delete_url,
                &delete_confirmation_message(&name),
                "closest tr",
                "delete",
            )
        })
        .pinned(PinSide::Right)
        .size(120),
    ]
}

fn payments_table(list_state: &ListState, page: &PaymentPage, sources: &[String]) -> Markup {
    let page_info = PageInfo {
        page_index: list_state.page_index,
        page_size: list_state.page_size,
    };
    let search_url = ListState {
        search: String::new(),
        page_index: 0,
        ..list_state.clone()
    }
    .url();
    let descriptors = vec![
        FilterDescriptor::Date {
            key: DATE_FILTER.to_owned(),
            title: "Date".to_owned(),
        },
        FilterDescriptor::SingleSelect {
            key: SOURCE_FILTER.to_owned(),
            title: "Payment From".to_owned(),
            options: sources
                .iter()
                .map(|source| FilterOption::new(source.as_str(), source.as_str()))
                .collect(),
        },
    ];

    TabularView::new(TABLE_ID, payment_columns(), &page.payments, |payment: &Payment| {
        payment.id.to_string()
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
        placeholder: "Search payments...".to_owned(),
        url: search_url,
    })
    .filters(
        descriptors,
        list_state.column_filters(),
        |filters: &ColumnFilters| list_state.with_filters(filters).url(),
    )
    .render()
}

fn payments_view(
    list_state: &ListState,
    page: Result<PaymentPage, Error>,
    sources: &[String],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PAYMENTS_VIEW).into_html();

    let table = match &page {
        Ok(page) => payments_table(list_state, page, sources),
        Err(error) => error_banner(&format!("Error loading payments: {error}")),
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Payments" }

                    a href=(endpoints::NEW_PAYMENT_VIEW) class=(LINK_STYLE)
                    {
                        "Record Payment"
                    }
                }

                (table)
            }
        }
    );

    base("Payments", &[], &content)
}

#[cfg(test)]
mod payments_page_tests {
    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::Html;
    use time::macros::date;

    use crate::{
        UserID,
        pagination::PaginationConfig,
        payment::{NewPayment, create_payment},
        test_utils::{
            assert_valid_html, element_texts, get_test_connection, insert_test_user,
            parse_html_document, shared,
        },
    };

    use super::{ListState, PaymentsPageQuery, PaymentsPageState, get_payments_page};

    fn insert(owner: UserID, amount: f64, day: u8, source: Option<&str>, connection: &Connection) {
        create_payment(
            owner,
            NewPayment {
                amount,
                date: date!(2024 - 03 - 01).replace_day(day).unwrap(),
                payment_from: source.map(ToOwned::to_owned),
            },
            connection,
        )
        .unwrap();
    }

    async fn render(connection: Connection, user_id: UserID, query: &str) -> Html {
        let state = PaymentsPageState {
            db_connection: shared(connection),
            pagination_config: PaginationConfig::default(),
        };
        let query: PaymentsPageQuery = serde_html_form::from_str(query).unwrap();

        let response = get_payments_page(user_id, State(state), Query(query))
            .await
            .expect("Could not render page");

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    #[tokio::test]
    async fn lists_payments_with_placeholder_source() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        insert(user_id, 250.0, 1, Some("Employer"), &connection);
        insert(user_id, 40.0, 2, None, &connection);
        insert(someone_else, 99.0, 3, None, &connection);

        let html = render(connection, user_id, "").await;

        assert_eq!(
            element_texts(&html, "tbody td:nth-child(1)"),
            ["$40.00", "$250.00"]
        );
        assert_eq!(element_texts(&html, "tbody td:nth-child(2)"), ["-", "Employer"]);
        assert_eq!(
            element_texts(&html, "tbody td:nth-child(3)"),
            ["Mar 02, 2024", "Mar 01, 2024"]
        );
        assert_eq!(element_texts(&html, "[data-footer-label]"), ["Showing 1 to 2 of 2"]);
    }

    #[tokio::test]
    async fn filters_by_source() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        insert(user_id, 2500.0, 1, Some("Employer"), &connection);
        insert(user_id, 40.0, 2, Some("Gran"), &connection);

        let html = render(connection, user_id, "payment_from=Gran").await;

        assert_eq!(element_texts(&html, "tbody td:nth-child(1)"), ["$40.00"]);
        assert_eq!(
            element_texts(&html, "details[data-filter=payment_from] li[data-option] span:last-child"),
            ["Employer", "Gran"]
        );
    }

    #[tokio::test]
    async fn page_past_the_end_shows_last_page() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        for day in 1..=12 {
            insert(user_id, f64::from(day), day, None, &connection);
        }

        let html = render(connection, user_id, "page=18446744073709551615").await;

        assert_eq!(
            element_texts(&html, "tbody td:nth-child(1)"),
            ["$2.00", "$1.00"]
        );
        assert_eq!(
            element_texts(&html, "[data-footer-label]"),
            ["Showing 11 to 12 of 12"]
        );
    }

    #[test]
    fn links_keep_filters_and_reset_page() {
        let query: PaymentsPageQuery = serde_html_form::from_str(
            "q=gran&page=2&date_from=2024-03-31&date_to=2024-03-01&payment_from=Gran",
        )
        .unwrap();

        let state = ListState::from_query(&query, &PaginationConfig::default());

        assert_eq!(state.page_index, 1);
        assert_eq!(
            state.url(),
            "/payments?q=gran&date_from=2024-03-01&date_to=2024-03-31&payment_from=Gran&page=2"
        );
        let cleared = state.with_filters(&Default::default());
        assert_eq!(cleared.url(), "/payments?q=gran");
    }
}
