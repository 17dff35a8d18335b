//! Core payment domain types.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::UserID;

/// Database identifier for a payment.
pub type PaymentId = i64;

/// Money a user has received, e.g. a salary payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserID,
    /// A positive amount of dollars.
    pub amount: f64,
    pub date: Date,
    /// Who the payment came from, if the user said.
    pub payment_from: Option<String>,
    pub created_at: OffsetDateTime,
}

/// The validated fields needed to record or change a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub amount: f64,
    pub date: Date,
    pub payment_from: Option<String>,
}

/// Form data for payment creation and editing.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PaymentFormData {
    pub amount: String,
    pub date: String,
    #[serde(default)]
    pub payment_from: String,
}
