//! Expenses are money a user has spent, optionally sorted into a category.
//!
//! This module contains the domain types, database queries, pages and
//! endpoints for recording, listing, editing and deleting expenses.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod query;

pub use create::{create_expense_endpoint, get_new_expense_page};
pub use db::{
    create_expense, create_expense_table, delete_expense, delete_expenses, get_expense,
    update_expense,
};
pub use delete::{bulk_delete_expenses_endpoint, delete_expense_endpoint};
pub use domain::{
    Expense, ExpenseCategory, ExpenseFormData, ExpenseId, ExpenseName, MAX_EXPENSE_NAME_LENGTH,
    NewExpense,
};
pub use edit::{get_edit_expense_page, update_expense_endpoint};
pub use list::get_expenses_page;
