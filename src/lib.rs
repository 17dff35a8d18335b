//! Spendwise is a web app for tracking personal expenses and payments.
//!
//! This library provides a REST API that directly serves HTML pages. Users
//! record expenses and payments, sort expenses into categories, and see
//! per-category totals and a monthly payments-vs-expenses comparison on the
//! dashboard.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod blob;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod expense;
mod form;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod pagination;
mod payment;
mod routing;
mod table;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_email, parse_email,
    update_password,
};
pub use blob::{BlobStore, LocalBlobStore};
pub use category::{Category, CategoryId, CategoryName, ThumbnailUrl, create_category};
pub use db::initialize as initialize_db;
pub use expense::{ExpenseId, ExpenseName, NewExpense, create_expense};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use payment::{NewPayment, PaymentId, create_payment};
pub use routing::build_router;

use crate::{
    alert::Alert,
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
    html::error_view,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry an authenticated user.
    #[error("Unauthorized")]
    Unauthorized,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no auth token in the cookie jar")]
    CookieMissing,

    /// The auth token in the cookie jar could not be read or has expired.
    #[error("invalid auth token: {0}")]
    InvalidToken(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string used to register a user is not a valid email address.
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// The email used to register a user already belongs to another user.
    #[error("An account with this email already exists")]
    DuplicateEmail,

    /// An empty string was used to create a category name.
    #[error("Category name is required")]
    EmptyCategoryName,

    /// A category name was longer than the allowed number of characters.
    #[error("Category name is too long")]
    CategoryNameTooLong,

    /// The thumbnail for a category was not an http(s) URL or an uploaded file.
    #[error("Please enter a valid URL")]
    InvalidThumbnailUrl,

    /// An empty string was used to create an expense name.
    #[error("Expense name is required")]
    EmptyExpenseName,

    /// An expense name was longer than the allowed number of characters.
    #[error("Name is too long")]
    ExpenseNameTooLong,

    /// An expense form was submitted without choosing a category.
    #[error("Category is required")]
    MissingCategory,

    /// A zero, negative or non-finite amount was used for an expense or payment.
    #[error("Amount must be greater than 0")]
    NonPositiveAmount,

    /// A date in the future was used for an expense or payment.
    ///
    /// Expenses and payments record events that have already happened,
    /// therefore future dates are not allowed.
    #[error("Date cannot be in the future")]
    FutureDate(Date),

    /// A date field could not be read as a calendar date.
    #[error("Please enter a valid date")]
    InvalidDate,

    /// The category ID used for an expense does not refer to one of the
    /// user's categories.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory,

    /// The uploaded thumbnail was not an image.
    #[error("Please upload an image file")]
    NotAnImage,

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// An uploaded file could not be written to the blob store.
    #[error("could not store the uploaded file: {0}")]
    BlobStoreError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to update a payment that does not exist
    #[error("tried to update a payment that is not in the database")]
    UpdateMissingPayment,

    /// Tried to delete a payment that does not exist
    #[error("tried to delete a payment that is not in the database")]
    DeleteMissingPayment,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidCategory
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_view(
                    "Unauthorized",
                    "401",
                    "Unauthorized",
                    "Log in to view this page.",
                ),
            )
                .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for HTMX requests.
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Alert::Error {
                    message: "Unauthorized".to_owned(),
                    details: "Your session has ended. Log in again to continue.".to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidCategory => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: "The selected category could not be found. \
                        Refresh the page and choose another category."
                        .to_owned(),
                },
            ),
            Error::NotAnImage => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: Error::NotAnImage.to_string(),
                },
            ),
            Error::MultipartError(error) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not read the upload".to_owned(),
                    details: error,
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                        Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingExpense => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update expense".to_owned(),
                    details: "The expense could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingExpense => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete expense".to_owned(),
                    details: "The expense could not be found. \
                        Try refreshing the page to see if the expense has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingPayment => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update payment".to_owned(),
                    details: "The payment could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingPayment => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete payment".to_owned(),
                    details: "The payment could not be found. \
                        Try refreshing the page to see if the payment has already been deleted."
                        .to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "An unexpected error occurred".to_owned(),
                    details: "Check the server logs for more details.".to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        Error,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[test]
    fn query_returned_no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn duplicate_email_maps_to_duplicate_email() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch("CREATE TABLE user (id INTEGER PRIMARY KEY, email TEXT UNIQUE);")
            .unwrap();
        connection
            .execute("INSERT INTO user (email) VALUES ('a@b.com')", ())
            .unwrap();

        let error: Error = connection
            .execute("INSERT INTO user (email) VALUES ('a@b.com')", ())
            .unwrap_err()
            .into();

        assert_eq!(error, Error::DuplicateEmail);
    }

    #[test]
    fn unauthorized_displays_as_unauthorized() {
        assert_eq!(Error::Unauthorized.to_string(), "Unauthorized");
    }

    #[tokio::test]
    async fn unauthorized_page_has_401_status() {
        let response = Error::Unauthorized.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unexpected_error_renders_generic_alert() {
        let response = Error::HashingError("oops".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(
            text.contains("An unexpected error occurred"),
            "want generic alert message, got {text:?}"
        );
        assert!(!text.contains("oops"), "internal details should not be shown");
    }
}
