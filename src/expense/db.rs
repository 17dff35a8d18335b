//! Database operations for expenses.
//!
//! Every query is scoped to the expense's owner, and an expense can only be
//! put in one of its owner's categories.

use rusqlite::{Connection, Row, params_from_iter};

use crate::{
    Error, UserID,
    category::{CategoryName, ThumbnailUrl},
    expense::{Expense, ExpenseCategory, ExpenseId, ExpenseName, NewExpense},
};

/// The columns read by [map_row], in order.
pub(super) const EXPENSE_COLUMNS: &str = "e.id, e.user_id, e.name, e.category_id, c.name, \
    c.thumbnail_url, e.amount, e.date, e.created_at";

/// The expense table joined with the owner's categories.
pub(super) const EXPENSE_FROM: &str = "FROM expense e \
    LEFT JOIN category c ON c.id = e.category_id AND c.user_id = e.user_id";

/// Record a new expense for `owner`.
///
/// # Errors
/// Returns [Error::InvalidCategory] if the expense names a category that does
/// not exist or belongs to someone else.
pub fn create_expense(
    owner: UserID,
    expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let rows_affected = connection.execute(
        "INSERT INTO expense (user_id, name, category_id, amount, date)
        SELECT ?1, ?2, ?3, ?4, ?5
        WHERE ?3 IS NULL OR EXISTS (SELECT 1 FROM category WHERE id = ?3 AND user_id = ?1)",
        (
            owner.as_i64(),
            expense.name.as_ref(),
            expense.category_id,
            expense.amount,
            expense.date,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidCategory);
    }

    get_expense(owner, connection.last_insert_rowid(), connection)
}

/// Retrieve one of `owner`'s expenses by ID, including its category.
///
/// Returns [Error::NotFound] if the expense does not exist or belongs to someone else.
pub fn get_expense(
    owner: UserID,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} {EXPENSE_FROM} WHERE e.id = ?1 AND e.user_id = ?2"
        ))?
        .query_row((expense_id, owner.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Replace the fields of an existing expense.
///
/// # Errors
/// - [Error::InvalidCategory] if the new category is not one of `owner`'s categories,
/// - [Error::UpdateMissingExpense] if the expense does not exist or belongs to someone else.
pub fn update_expense(
    owner: UserID,
    expense_id: ExpenseId,
    expense: NewExpense,
    connection: &Connection,
) -> Result<(), Error> {
    if let Some(category_id) = expense.category_id {
        let category_exists: bool = connection.query_row(
            "SELECT EXISTS (SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2)",
            (category_id, owner.as_i64()),
            |row| row.get(0),
        )?;

        if !category_exists {
            return Err(Error::InvalidCategory);
        }
    }

    let rows_affected = connection.execute(
        "UPDATE expense SET name = ?1, category_id = ?2, amount = ?3, date = ?4
        WHERE id = ?5 AND user_id = ?6",
        (
            expense.name.as_ref(),
            expense.category_id,
            expense.amount,
            expense.date,
            expense_id,
            owner.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(())
}

/// Delete an expense by ID. Returns an error if the expense doesn't exist.
pub fn delete_expense(
    owner: UserID,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (expense_id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// Delete each of `expense_ids` that belongs to `owner` and return how many were deleted.
///
/// IDs of missing expenses, or of expenses owned by someone else, are ignored.
pub fn delete_expenses(
    owner: UserID,
    expense_ids: &[ExpenseId],
    connection: &Connection,
) -> Result<usize, Error> {
    if expense_ids.is_empty() {
        return Ok(0);
    }

    let placeholders = (2..expense_ids.len() + 2)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!("DELETE FROM expense WHERE user_id = ?1 AND id IN ({placeholders})");

    let params = std::iter::once(owner.as_i64()).chain(expense_ids.iter().copied());

    connection
        .execute(&query, params_from_iter(params))
        .map_err(|error| error.into())
}

/// Initialize the expense table and indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_expense_category ON expense(category_id);",
    )?;

    Ok(())
}

/// Map a row selected with [EXPENSE_COLUMNS] to an [Expense].
pub(super) fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let raw_name: String = row.get(2)?;
    let category_id: Option<i64> = row.get(3)?;
    let category_name: Option<String> = row.get(4)?;
    let thumbnail_url: Option<String> = row.get(5)?;

    let category = match (category_id, category_name) {
        (Some(id), Some(name)) => Some(ExpenseCategory {
            id,
            name: CategoryName::new_unchecked(&name),
            thumbnail_url: thumbnail_url.as_deref().map(ThumbnailUrl::new_unchecked),
        }),
        _ => None,
    };

    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: ExpenseName::new_unchecked(&raw_name),
        category,
        amount: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
    })
}
