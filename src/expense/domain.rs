//! Core expense domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error, UserID,
    category::{CategoryId, CategoryName, ThumbnailUrl},
};

/// The most characters an expense name may have.
pub const MAX_EXPENSE_NAME_LENGTH: usize = 100;

/// A validated, non-empty expense name of at most [MAX_EXPENSE_NAME_LENGTH] characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ExpenseName(String);

impl ExpenseName {
    /// Create an expense name.
    ///
    /// # Errors
    ///
    /// This function will return:
    /// - [Error::EmptyExpenseName] if `name` is empty or only whitespace,
    /// - [Error::ExpenseNameTooLong] if `name` is longer than [MAX_EXPENSE_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyExpenseName)
        } else if name.graphemes(true).count() > MAX_EXPENSE_NAME_LENGTH {
            Err(Error::ExpenseNameTooLong)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create an expense name without validation.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for ExpenseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExpenseName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseName::new(s)
    }
}

impl Display for ExpenseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// The category an expense belongs to, as shown alongside the expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseCategory {
    pub id: CategoryId,
    pub name: CategoryName,
    pub thumbnail_url: Option<ThumbnailUrl>,
}

/// Money a user has spent.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: UserID,
    pub name: ExpenseName,
    /// `None` if the expense was never categorized or its category was deleted.
    pub category: Option<ExpenseCategory>,
    /// A positive amount of dollars.
    pub amount: f64,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

/// The validated fields needed to record or change an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub name: ExpenseName,
    pub category_id: Option<CategoryId>,
    pub amount: f64,
    pub date: Date,
}

/// Form data for expense creation and editing.
///
/// Fields are kept as text so that invalid input can be shown back to the user.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ExpenseFormData {
    pub name: String,
    #[serde(default)]
    pub category_id: String,
    pub amount: String,
    pub date: String,
}
