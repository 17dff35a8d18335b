//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    alert::Alert,
    category::{CategoryId, db::delete_category},
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. Returns success alert or error.
pub async fn delete_category_endpoint(
    user_id: UserID,
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(user_id, category_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingCategory) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, create_category, delete_category_endpoint, get_category},
        expense::{ExpenseName, NewExpense, create_expense, get_expense},
        test_utils::{
            assert_valid_html, element_texts, get_test_connection, insert_test_user,
            parse_html_fragment, shared,
        },
    };

    use super::DeleteCategoryEndpointState;

    #[tokio::test]
    async fn delete_category_keeps_expenses_uncategorized() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let category =
            create_category(user_id, CategoryName::new_unchecked("Coffee"), None, &connection)
                .unwrap();
        let expense = create_expense(
            user_id,
            NewExpense {
                name: ExpenseName::new_unchecked("Flat white"),
                category_id: Some(category.id),
                amount: 5.5,
                date: date!(2024 - 03 - 01),
            },
            &connection,
        )
        .unwrap();
        let state = DeleteCategoryEndpointState {
            db_connection: shared(connection),
        };

        let response =
            delete_category_endpoint(user_id, Path(category.id), State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_category(user_id, category.id, &connection),
            Err(Error::NotFound)
        );
        let expense = get_expense(user_id, expense.id, &connection).unwrap();
        assert_eq!(expense.category, None);
    }

    #[tokio::test]
    async fn delete_category_of_other_user_fails() {
        let connection = get_test_connection();
        let owner = insert_test_user("owner@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        let category =
            create_category(owner, CategoryName::new_unchecked("Coffee"), None, &connection)
                .unwrap();
        let state = DeleteCategoryEndpointState {
            db_connection: shared(connection),
        };

        let response =
            delete_category_endpoint(someone_else, Path(category.id), State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_eq!(
            element_texts(&html, "p")[0],
            "Could not delete category"
        );
        assert!(get_category(owner, category.id, &state.db_connection.lock().unwrap()).is_ok());
    }
}
