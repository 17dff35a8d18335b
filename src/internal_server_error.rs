//! Defines the page and route handler to display when an internal server error occurs.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl InternalServerError<'_> {
    pub fn into_html(self) -> Html<String> {
        Html(error_view("Internal Server Error", "500", self.description, self.fix).into_string())
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.into_html()).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

/// Send the client to the internal error page from an htmx request.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}

#[cfg(test)]
mod internal_server_error_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{assert_hx_redirect, assert_valid_html, parse_html_document},
    };

    use super::{
        InternalServerError, get_internal_server_error_page, get_internal_server_error_redirect,
    };

    #[test]
    fn redirect_points_to_error_page() {
        let response = get_internal_server_error_redirect();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_hx_redirect(&response, endpoints::INTERNAL_ERROR_VIEW);
    }

    #[tokio::test]
    async fn error_page_has_500_status() {
        let response = get_internal_server_error_page().await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_valid_html(&parse_html_document(response).await);
    }

    #[tokio::test]
    async fn error_page_shows_fix() {
        let response = axum::response::IntoResponse::into_response(InternalServerError {
            description: "Invalid Timezone Settings",
            fix: "Set a canonical timezone",
        });

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Invalid Timezone Settings"));
        assert!(text.contains("Set a canonical timezone"));
    }
}
