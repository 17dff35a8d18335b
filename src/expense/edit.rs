//! Expense editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, UserID,
    category::{Category, get_all_categories},
    endpoints,
    expense::{
        Expense, ExpenseFormData, ExpenseId, get_expense, update_expense,
        form::{ExpenseFormAction, expense_form, validate_expense_form},
    },
    form::FieldErrors,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the edit expense page and endpoint.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the expense editing page.
///
/// Responds with 404 if the expense does not exist or belongs to another user.
pub async fn get_edit_expense_page(
    user_id: UserID,
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpenseState>,
) -> Result<Response, Error> {
    let (expense, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let expense = get_expense(user_id, expense_id, &connection).inspect_err(|error| {
            if *error != Error::NotFound {
                tracing::error!("Failed to retrieve expense {expense_id}: {error}");
            }
        })?;
        let categories = get_all_categories(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for edit expense page: {error}")
        })?;

        (expense, categories)
    };

    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    Ok(edit_expense_view(&expense, &categories, today).into_response())
}

/// Handle expense update form submission.
pub async fn update_expense_endpoint(
    user_id: UserID,
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpenseState>,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let expense = match validate_expense_form(&form, today) {
        Ok(expense) => expense,
        Err(errors) => {
            let update_endpoint = endpoints::format_endpoint(endpoints::EXPENSE, expense_id);

            return match get_all_categories(user_id, &connection) {
                Ok(categories) => expense_form(
                    ExpenseFormAction::Update {
                        endpoint: &update_endpoint,
                    },
                    &form,
                    &categories,
                    today,
                    &errors,
                )
                .into_response(),
                Err(error) => {
                    tracing::error!("Failed to retrieve categories: {error}");
                    error.into_alert_response()
                }
            };
        }
    };

    match update_expense(user_id, expense_id, expense, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::UpdateMissingExpense | Error::InvalidCategory)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_expense_view(expense: &Expense, categories: &[Category], today: Date) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id);
    let update_endpoint = endpoints::format_endpoint(endpoints::EXPENSE, expense.id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let values = ExpenseFormData {
        name: expense.name.to_string(),
        category_id: expense
            .category
            .as_ref()
            .map(|category| category.id.to_string())
            .unwrap_or_default(),
        amount: format!("{:.2}", expense.amount),
        date: expense.date.to_string(),
    };
    let form = expense_form(
        ExpenseFormAction::Update {
            endpoint: &update_endpoint,
        },
        &values,
        categories,
        today,
        &FieldErrors::default(),
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Expense" }
            (form)
        }
    };

    base("Edit Expense", &[dollar_input_styles()], &content)
}


#[cfg(test)]
mod update_expense_endpoint_tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        endpoints,
        expense::{
            ExpenseFormData, ExpenseName, NewExpense, create_expense, get_expense,
            update_expense_endpoint,
        },
        test_utils::{
            assert_hx_redirect, element_texts, get_test_connection, insert_test_user,
            parse_html_fragment, shared,
        },
    };

    use super::EditExpenseState;

    #[tokio::test]
    async fn can_update_expense() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let category =
            create_category(user_id, CategoryName::new_unchecked("Food"), None, &connection)
                .unwrap();
        let expense = create_expense(
            user_id,
            NewExpense {
                name: ExpenseName::new_unchecked("Coffee"),
                category_id: None,
                amount: 4.5,
                date: date!(2024 - 03 - 01),
            },
            &connection,
        )
        .unwrap();
        let state = EditExpenseState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: shared(connection),
        };
        let form = ExpenseFormData {
            name: "Tea".to_owned(),
            category_id: category.id.to_string(),
            amount: "3".to_owned(),
            date: "2024-02-29".to_owned(),
        };

        let response =
            update_expense_endpoint(user_id, Path(expense.id), State(state.clone()), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::EXPENSES_VIEW);
        let updated = get_expense(user_id, expense.id, &state.db_connection.lock().unwrap())
            .unwrap();
        assert_eq!(updated.name, ExpenseName::new_unchecked("Tea"));
        assert_eq!(updated.amount, 3.0);
        assert_eq!(updated.date, date!(2024 - 02 - 29));
        assert_eq!(updated.category.map(|category| category.id), Some(category.id));
    }

    #[tokio::test]
    async fn missing_expense_gives_not_found_alert() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let category =
            create_category(user_id, CategoryName::new_unchecked("Food"), None, &connection)
                .unwrap();
        let state = EditExpenseState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: shared(connection),
        };
        let form = ExpenseFormData {
            name: "Tea".to_owned(),
            category_id: category.id.to_string(),
            amount: "3".to_owned(),
            date: "2024-02-29".to_owned(),
        };

        let response = update_expense_endpoint(user_id, Path(1337), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_eq!(
            element_texts(&html, "p"),
            ["Could not update expense", "The expense could not be found."]
        );
    }

    #[tokio::test]
    async fn invalid_form_targets_update_endpoint() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let state = EditExpenseState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: shared(connection),
        };
        let form = ExpenseFormData {
            name: "".to_owned(),
            category_id: "".to_owned(),
            amount: "3".to_owned(),
            date: "2024-02-29".to_owned(),
        };

        let response = update_expense_endpoint(user_id, Path(5), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let form = html
            .select(&scraper::Selector::parse("form").unwrap())
            .next()
            .unwrap();
        assert_eq!(form.value().attr("hx-put"), Some("/api/expenses/5"));
        assert_eq!(
            element_texts(&html, "form p"),
            ["Expense name is required", "Category is required"]
        );
    }
}
