//! Dashboard module
//!
//! Provides an overview page with expense and payment totals for a chosen
//! period, a per-category breakdown and a six-month payments-vs-expenses chart.

mod aggregation;
mod cards;
mod charts;
mod handlers;

pub use handlers::get_dashboard_page;
