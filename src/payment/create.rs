//! Payment creation page and endpoint.

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
    AppState, Error, UserID, endpoints,
    form::FieldErrors,
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    payment::{
        PaymentFormData, create_payment,
        form::{PaymentFormAction, payment_form, validate_payment_form},
    },
    timezone::local_today,
};

/// The state needed for the new payment page and for creating a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_new_payment_page(State(state): State<CreatePaymentState>) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    Ok(new_payment_view(today).into_response())
}

/// Handle payment creation form submission.
pub async fn create_payment_endpoint(
    user_id: UserID,
    State(state): State<CreatePaymentState>,
    Form(form): Form<PaymentFormData>,
) -> Response {
    let Some(today) = local_today(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let payment = match validate_payment_form(&form, today) {
        Ok(payment) => payment,
        Err(errors) => {
            return payment_form(PaymentFormAction::Create, &form, today, &errors).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_payment(user_id, payment, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PAYMENTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a payment: {error}");

            error.into_alert_response()
        }
    }
}

fn new_payment_view(today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_PAYMENT_VIEW).into_html();
    let defaults = PaymentFormData {
        date: today.to_string(),
        ..Default::default()
    };
    let form = payment_form(
        PaymentFormAction::Create,
        &defaults,
        today,
        &FieldErrors::default(),
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Payment" }
            (form)
        }
    };

    base("Create Payment", &[dollar_input_styles()], &content)
}
