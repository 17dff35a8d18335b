//! Expense creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
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
        ExpenseFormData, create_expense,
        form::{ExpenseFormAction, expense_form, validate_expense_form},
    },
    form::FieldErrors,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for the new expense page and for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for recording a new expense, dated today by default.
pub async fn get_new_expense_page(
    user_id: UserID,
    State(state): State<CreateExpenseState>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new expense page: {error}")
        })?
    };

    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    Ok(new_expense_view(&categories, today).into_response())
}

/// Handle expense creation form submission.
pub async fn create_expense_endpoint(
    user_id: UserID,
    State(state): State<CreateExpenseState>,
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
            return match get_all_categories(user_id, &connection) {
                Ok(categories) => expense_form(
                    ExpenseFormAction::Create,
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

    match create_expense(user_id, expense, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::InvalidCategory) => Error::InvalidCategory.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an expense: {error}");

            error.into_alert_response()
        }
    }
}

fn new_expense_view(categories: &[Category], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW).into_html();
    let defaults = ExpenseFormData {
        date: today.to_string(),
        ..Default::default()
    };
    let form = expense_form(
        ExpenseFormAction::Create,
        &defaults,
        categories,
        today,
        &FieldErrors::default(),
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Expense" }
            (form)
        }
    };

    base("Create Expense", &[dollar_input_styles()], &content)
}
