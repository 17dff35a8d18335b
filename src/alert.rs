//! Alert messages shown after htmx requests.
//!
//! Alerts are swapped into the `#alert-container` element of the base page
//! and can be dismissed by the user.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A success or error message for the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    #[allow(dead_code)]
    Success { message: String, details: String },
    /// A success message without details.
    SuccessSimple { message: String },
    /// An error message with details on how to fix it.
    Error { message: String, details: String },
    /// An error message without details.
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, Some(details)),
            Alert::SuccessSimple { message } => (false, message, None),
            Alert::Error { message, details } => (true, message, Some(details)),
            Alert::ErrorSimple { message } => (true, message, None),
        };

        let container_style = if is_error {
            "flex p-4 mb-4 rounded-lg border text-red-800 bg-red-50 border-red-300 \
            dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "flex p-4 mb-4 rounded-lg border text-green-800 bg-green-50 border-green-300 \
            dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };

        html! {
            div
                role="alert"
                class=(container_style)
            {
                div class="flex-1"
                {
                    p class="font-medium" { (message) }

                    @if let Some(details) = details.filter(|details| !details.is_empty())
                    {
                        p class="mt-1 text-sm" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="ms-3 -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex h-8 w-8 \
                        items-center justify-center hover:bg-gray-200 dark:hover:bg-gray-700"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "✕"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
