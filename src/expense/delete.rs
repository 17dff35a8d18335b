//! Endpoints for deleting one expense or the selected expenses.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    alert::Alert,
    endpoints,
    expense::{
        ExpenseId,
        db::{delete_expense, delete_expenses},
    },
};

/// The state needed for deleting expenses.
#[derive(Debug, Clone)]
pub struct DeleteExpenseEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The expenses ticked in the expenses table.
#[derive(Debug, Default, Deserialize)]
pub struct BulkDeleteForm {
    #[serde(default)]
    pub selected: Vec<ExpenseId>,
}

/// Handle expense deletion. Returns success alert or error.
pub async fn delete_expense_endpoint(
    user_id: UserID,
    Path(expense_id): Path<ExpenseId>,
    State(state): State<DeleteExpenseEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_expense(user_id, expense_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Expense deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingExpense) => Error::DeleteMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

/// Delete every selected expense and reload the expenses page.
pub async fn bulk_delete_expenses_endpoint(
    user_id: UserID,
    State(state): State<DeleteExpenseEndpointState>,
    Form(form): Form<BulkDeleteForm>,
) -> Response {
    if form.selected.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Alert::ErrorSimple {
                message: "Select at least one expense to delete".to_owned(),
            }
            .into_html(),
        )
            .into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_expenses(user_id, &form.selected, &connection) {
        Ok(deleted) => {
            tracing::info!("Deleted {deleted} of {} selected expenses", form.selected.len());

            (
                HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting expenses: {error}");
            error.into_alert_response()
        }
    }
}
