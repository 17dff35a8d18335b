//! The paged, searchable expense query behind the expenses page.

use std::ops::RangeInclusive;

use rusqlite::{Connection, params_from_iter, types::Value};
use time::Date;

use crate::{
    Error, UserID,
    category::CategoryId,
    db::like_pattern,
    expense::{
        Expense,
        db::{EXPENSE_COLUMNS, EXPENSE_FROM, map_row},
    },
};

/// The columns expenses can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpenseSortColumn {
    Name,
    Amount,
    #[default]
    Date,
}

impl ExpenseSortColumn {
    /// The sort column for the table column `column_id`, if that column is sortable.
    pub fn from_column_id(column_id: &str) -> Option<Self> {
        match column_id {
            "name" => Some(Self::Name),
            "amount" => Some(Self::Amount),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn column_id(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Amount => "amount",
            Self::Date => "date",
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::Name => "e.name COLLATE NOCASE",
            Self::Amount => "e.amount",
            Self::Date => "e.date",
        }
    }
}

/// Which of a user's expenses to fetch and in what order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseQuery {
    /// Case-insensitive text matched against the name, category, amount and date.
    pub search: String,
    /// Only include expenses in this inclusive date range.
    pub date_range: Option<RangeInclusive<Date>>,
    /// Only include expenses in one of these categories. Empty means any category.
    pub category_ids: Vec<CategoryId>,
    pub sort: ExpenseSortColumn,
    pub descending: bool,
    /// Zero-based.
    pub page_index: u64,
    pub page_size: u64,
}

impl Default for ExpenseQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            date_range: None,
            category_ids: Vec::new(),
            sort: ExpenseSortColumn::Date,
            descending: true,
            page_index: 0,
            page_size: 10,
        }
    }
}

/// One page of expenses and the number of expenses on every page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpensePage {
    pub expenses: Vec<Expense>,
    pub total: u64,
}

/// Fetch a page of `owner`'s expenses matching `query`.
///
/// Expenses with equal sort keys are ordered by ID so that pages are stable.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_expenses(
    owner: UserID,
    query: &ExpenseQuery,
    connection: &Connection,
) -> Result<ExpensePage, Error> {
    let mut where_clause_parts = vec!["e.user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(owner.as_i64())];

    let search = query.search.trim();
    if !search.is_empty() {
        let index = query_parameters.len() + 1;
        where_clause_parts.push(format!(
            "(e.name LIKE ?{index} ESCAPE '\\' OR c.name LIKE ?{index} ESCAPE '\\' \
            OR CAST(e.amount AS TEXT) LIKE ?{index} ESCAPE '\\' \
            OR e.date LIKE ?{index} ESCAPE '\\')"
        ));
        query_parameters.push(Value::Text(like_pattern(search)));
    }

    if let Some(date_range) = &query.date_range {
        where_clause_parts.push(format!(
            "e.date BETWEEN ?{} AND ?{}",
            query_parameters.len() + 1,
            query_parameters.len() + 2,
        ));
        query_parameters.push(Value::Text(date_range.start().to_string()));
        query_parameters.push(Value::Text(date_range.end().to_string()));
    }

    if !query.category_ids.is_empty() {
        let placeholders = query
            .category_ids
            .iter()
            .enumerate()
            .map(|(offset, _)| format!("?{}", query_parameters.len() + 1 + offset))
            .collect::<Vec<_>>()
            .join(", ");
        where_clause_parts.push(format!("e.category_id IN ({placeholders})"));
        query_parameters.extend(query.category_ids.iter().copied().map(Value::Integer));
    }

    let where_clause = where_clause_parts.join(" AND ");

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) {EXPENSE_FROM} WHERE {where_clause}"),
        params_from_iter(query_parameters.iter()),
        |row| row.get(0),
    )?;

    let direction = if query.descending { "DESC" } else { "ASC" };
    let page_size = query.page_size.max(1);
    let page_query = format!(
        "SELECT {EXPENSE_COLUMNS} {EXPENSE_FROM} WHERE {where_clause} \
        ORDER BY {} {direction}, e.id ASC \
        LIMIT {page_size} OFFSET {}",
        query.sort.order_by(),
        query.page_index.saturating_mul(page_size).min(i64::MAX as u64),
    );

    let expenses = connection
        .prepare(&page_query)?
        .query_map(params_from_iter(query_parameters.iter()), map_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(ExpensePage {
        expenses,
        total: total.max(0) as u64,
    })
}
