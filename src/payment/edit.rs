//! Payment editing page and endpoint.

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
    AppState, Error, UserID, endpoints,
    form::FieldErrors,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    payment::{
        Payment, PaymentFormData, PaymentId, get_payment, update_payment,
        form::{PaymentFormAction, payment_form, validate_payment_form},
    },
    timezone::local_today,
};

/// The state needed for the edit payment page and endpoint.
#[derive(Debug, Clone)]
pub struct EditPaymentState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditPaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the payment editing page, or 404 if the payment is not the user's.
pub async fn get_edit_payment_page(
    user_id: UserID,
    Path(payment_id): Path<PaymentId>,
    State(state): State<EditPaymentState>,
) -> Result<Response, Error> {
    let payment = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_payment(user_id, payment_id, &connection).inspect_err(|error| {
            if *error != Error::NotFound {
                tracing::error!("Failed to retrieve payment {payment_id}: {error}");
            }
        })?
    };

    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    Ok(edit_payment_view(&payment, today).into_response())
}

/// Handle payment update form submission.
pub async fn update_payment_endpoint(
    user_id: UserID,
    Path(payment_id): Path<PaymentId>,
    State(state): State<EditPaymentState>,
    Form(form): Form<PaymentFormData>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let payment = match validate_payment_form(&form, today) {
        Ok(payment) => payment,
        Err(errors) => {
            let update_endpoint = endpoints::format_endpoint(endpoints::PAYMENT, payment_id);

            return payment_form(
                PaymentFormAction::Update {
                    endpoint: &update_endpoint,
                },
                &form,
                today,
                &errors,
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_payment(user_id, payment_id, payment, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PAYMENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingPayment) => Error::UpdateMissingPayment.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating payment {payment_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_payment_view(payment: &Payment, today: Date) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_PAYMENT_VIEW, payment.id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PAYMENT, payment.id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let values = PaymentFormData {
        amount: format!("{:.2}", payment.amount),
        date: payment.date.to_string(),
        payment_from: payment.payment_from.clone().unwrap_or_default(),
    };
    let form = payment_form(
        PaymentFormAction::Update {
            endpoint: &update_endpoint,
        },
        &values,
        today,
        &FieldErrors::default(),
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Payment" }
            (form)
        }
    };

    base("Edit Payment", &[dollar_input_styles()], &content)
}
