use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    alert::Alert,
    payment::{PaymentId, delete_payment},
};

/// The state needed for deleting a payment.
#[derive(Debug, Clone)]
pub struct DeletePaymentEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeletePaymentEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle payment deletion. Returns success alert or error.
pub async fn delete_payment_endpoint(
    user_id: UserID,
    Path(payment_id): Path<PaymentId>,
    State(state): State<DeletePaymentEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_payment(user_id, payment_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Payment deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingPayment) => Error::DeleteMissingPayment.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting payment {payment_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_payment_endpoint_tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        Error,
        payment::{NewPayment, create_payment, get_payment},
        test_utils::{get_test_connection, insert_test_user, shared},
    };

    use super::{DeletePaymentEndpointState, delete_payment_endpoint};

    #[tokio::test]
    async fn can_delete_payment_once() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let payment = create_payment(
            user_id,
            NewPayment {
                amount: 10.0,
                date: date!(2024 - 03 - 01),
                payment_from: None,
            },
            &connection,
        )
        .unwrap();
        let state = DeletePaymentEndpointState {
            db_connection: shared(connection),
        };

        let response =
            delete_payment_endpoint(user_id, Path(payment.id), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_payment(user_id, payment.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );

        let response = delete_payment_endpoint(user_id, Path(payment.id), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
