//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/expenses/{expense_id}/edit', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for listing a user's expenses.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The page for recording a new expense.
pub const NEW_EXPENSE_VIEW: &str = "/expenses/new";
/// The page for editing an existing expense.
pub const EDIT_EXPENSE_VIEW: &str = "/expenses/{expense_id}/edit";
/// The page for listing a user's payments.
pub const PAYMENTS_VIEW: &str = "/payments";
/// The page for recording a new payment.
pub const NEW_PAYMENT_VIEW: &str = "/payments/new";
/// The page for editing an existing payment.
pub const EDIT_PAYMENT_VIEW: &str = "/payments/{payment_id}/edit";
/// The page for listing a user's categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
/// The route for user uploaded files, e.g., category thumbnails.
pub const UPLOADS: &str = "/uploads";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to access users.
pub const USERS: &str = "/api/users";
/// The route to create an expense.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to update or delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to delete the selected expenses.
pub const BULK_DELETE_EXPENSES: &str = "/api/expenses/bulk_delete";
/// The route to create a payment.
pub const PAYMENTS_API: &str = "/api/payments";
/// The route to update or delete a single payment.
pub const PAYMENT: &str = "/api/payments/{payment_id}";
/// The route to create a category.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to update or delete a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to upload a category thumbnail.
pub const CATEGORY_THUMBNAIL: &str = "/api/categories/thumbnail";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/expenses/{expense_id}', '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// Append `params` to `endpoint` as a query string, keeping repeated keys.
pub fn with_query(endpoint: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return endpoint.to_owned();
    }

    match serde_urlencoded::to_string(params) {
        Ok(query) => format!("{endpoint}?{query}"),
        Err(error) => {
            tracing::error!("Could not encode query parameters for {endpoint}: {error}");
            endpoint.to_owned()
        }
    }
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::{format_endpoint, with_query};

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::EXPENSES_VIEW,
            endpoints::NEW_EXPENSE_VIEW,
            endpoints::EDIT_EXPENSE_VIEW,
            endpoints::PAYMENTS_VIEW,
            endpoints::NEW_PAYMENT_VIEW,
            endpoints::EDIT_PAYMENT_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::NEW_CATEGORY_VIEW,
            endpoints::EDIT_CATEGORY_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::UPLOADS,
            endpoints::COFFEE,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::EXPENSES_API,
            endpoints::EXPENSE,
            endpoints::BULK_DELETE_EXPENSES,
            endpoints::PAYMENTS_API,
            endpoints::PAYMENT,
            endpoints::CATEGORIES_API,
            endpoints::CATEGORY,
            endpoints::CATEGORY_THUMBNAIL,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::EDIT_EXPENSE_VIEW, 42);

        assert_eq!(formatted_path, "/expenses/42/edit");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn with_query_encodes_repeated_keys() {
        let url = with_query(
            endpoints::EXPENSES_VIEW,
            &[
                ("q", "tea & cake".to_owned()),
                ("category", "1".to_owned()),
                ("category", "2".to_owned()),
            ],
        );

        assert_eq!(url, "/expenses?q=tea+%26+cake&category=1&category=2");
        assert!(url.parse::<Uri>().is_ok());
    }

    #[test]
    fn with_query_without_params_is_the_endpoint() {
        assert_eq!(with_query(endpoints::PAYMENTS_VIEW, &[]), "/payments");
    }
}
