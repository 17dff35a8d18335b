//! Categories group a user's expenses, e.g. 'Groceries' or 'Rent'.
//!
//! This module contains the domain types, database queries, pages and
//! endpoints for creating, listing, editing and deleting categories, and for
//! uploading category thumbnails.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod thumbnail;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    create_category, create_category_table, delete_category, get_all_categories, get_category,
    update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryName, CategoryWithExpenseCount, ThumbnailUrl};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;
pub use thumbnail::upload_thumbnail_endpoint;
