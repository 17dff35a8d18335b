//! Payments are money a user has received, e.g. wages or a gift.
//!
//! This module contains the domain types, database queries, pages and
//! endpoints for recording, listing, editing and deleting payments.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod query;

pub use create::{create_payment_endpoint, get_new_payment_page};
pub use db::{
    create_payment, create_payment_table, delete_payment, get_payment, get_payment_sources,
    update_payment,
};
pub use delete::delete_payment_endpoint;
pub use domain::{NewPayment, Payment, PaymentFormData, PaymentId};
pub use edit::{get_edit_payment_page, update_payment_endpoint};
pub use list::get_payments_page;
