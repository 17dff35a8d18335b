//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, get_new_category_page, update_category_endpoint,
        upload_thumbnail_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    expense::{
        bulk_delete_expenses_endpoint, create_expense_endpoint, delete_expense_endpoint,
        get_edit_expense_page, get_expenses_page, get_new_expense_page, update_expense_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    payment::{
        create_payment_endpoint, delete_payment_endpoint, get_edit_payment_page,
        get_new_payment_page, get_payments_page, update_payment_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::PAYMENTS_VIEW, get(get_payments_page))
        .route(endpoints::NEW_PAYMENT_VIEW, get(get_new_payment_page))
        .route(endpoints::EDIT_PAYMENT_VIEW, get(get_edit_payment_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .nest_service(endpoints::UPLOADS, ServeDir::new(&state.upload_dir))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::EXPENSES_API, post(create_expense_endpoint))
            .route(
                endpoints::BULK_DELETE_EXPENSES,
                post(bulk_delete_expenses_endpoint),
            )
            .route(
                endpoints::EXPENSE,
                put(update_expense_endpoint).delete(delete_expense_endpoint),
            )
            .route(endpoints::PAYMENTS_API, post(create_payment_endpoint))
            .route(
                endpoints::PAYMENT,
                put(update_payment_endpoint).delete(delete_payment_endpoint),
            )
            .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
            .route(
                endpoints::CATEGORY_THUMBNAIL,
                post(upload_thumbnail_endpoint),
            )
            .route(
                endpoints::CATEGORY,
                put(update_category_endpoint).delete(delete_category_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
