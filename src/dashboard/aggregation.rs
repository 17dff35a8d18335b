//! Per-category totals, payment totals and the monthly payments-vs-expenses
//! comparison shown on the dashboard.

use std::{collections::BTreeMap, ops::RangeInclusive};

use rusqlite::Connection;
use time::{Date, Month};

use crate::{
    Error, UserID,
    category::{CategoryId, CategoryName, ThumbnailUrl},
};

/// The number of months in [ReportAggregator::monthly_comparison], including the current month.
pub const COMPARISON_MONTHS: usize = 6;

/// The amount spent in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub id: CategoryId,
    pub name: CategoryName,
    pub thumbnail_url: Option<ThumbnailUrl>,
    pub total: f64,
}

/// The totals for a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    /// Sorted by total, largest first. Uncategorized expenses are left out.
    pub category_totals: Vec<CategoryTotal>,
    /// The sum of every expense in the range, categorized or not.
    pub total_expenses: f64,
    pub total_payments: f64,
    pub payment_count: usize,
}

/// Expenses and payments for one calendar month, rounded to whole dollars.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyComparison {
    /// The full month name, e.g. "March".
    pub month: String,
    pub expenses: f64,
    pub payments: f64,
}

/// Computes dashboard figures from one user's expenses and payments.
pub struct ReportAggregator<'a> {
    owner: UserID,
    connection: &'a Connection,
}

impl<'a> ReportAggregator<'a> {
    pub fn new(owner: UserID, connection: &'a Connection) -> Self {
        Self { owner, connection }
    }

    /// Category and payment totals for the inclusive `date_range`.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if either query fails.
    pub fn dashboard_data(&self, date_range: RangeInclusive<Date>) -> Result<DashboardData, Error> {
        let mut statement = self.connection.prepare(
            "SELECT e.amount, c.id, c.name, c.thumbnail_url
            FROM expense e
            LEFT JOIN category c ON c.id = e.category_id AND c.user_id = e.user_id
            WHERE e.user_id = ?1 AND e.date BETWEEN ?2 AND ?3
            ORDER BY e.date ASC, e.id ASC",
        )?;
        let rows = statement.query_map(
            (self.owner.as_i64(), date_range.start(), date_range.end()),
            |row| {
                let amount: f64 = row.get(0)?;
                let category_id: Option<CategoryId> = row.get(1)?;
                let name: Option<String> = row.get(2)?;
                let thumbnail_url: Option<String> = row.get(3)?;

                let category = category_id.zip(name).map(|(id, name)| CategoryTotal {
                    id,
                    name: CategoryName::new_unchecked(&name),
                    thumbnail_url: thumbnail_url.as_deref().map(ThumbnailUrl::new_unchecked),
                    total: 0.0,
                });

                Ok((amount, category))
            },
        )?;

        let mut total_expenses = 0.0;
        let mut totals_by_category: BTreeMap<CategoryId, CategoryTotal> = BTreeMap::new();

        for row in rows {
            let (amount, category) = row?;
            total_expenses += amount;

            if let Some(category) = category {
                totals_by_category
                    .entry(category.id)
                    .or_insert(category)
                    .total += amount;
            }
        }

        let mut category_totals: Vec<CategoryTotal> = totals_by_category.into_values().collect();
        category_totals.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.name.as_ref().cmp(b.name.as_ref()))
        });

        let (total_payments, payment_count): (f64, i64) = self.connection.query_row(
            "SELECT COALESCE(SUM(amount), 0.0), COUNT(*) FROM payment
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
            (self.owner.as_i64(), date_range.start(), date_range.end()),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(DashboardData {
            category_totals,
            total_expenses,
            total_payments,
            payment_count: payment_count.max(0) as usize,
        })
    }

    /// Monthly expense and payment sums for the month of `today` and the five months before it.
    ///
    /// Months without any records are zero. Entries are in chronological order.
    ///
    /// # Errors
    /// Returns [Error::SqlError] if either query fails.
    pub fn monthly_comparison(&self, today: Date) -> Result<Vec<MonthlyComparison>, Error> {
        let start = first_of_month(today, COMPARISON_MONTHS as u32 - 1);

        let mut buckets: BTreeMap<(i32, u8), (f64, f64)> = BTreeMap::new();
        for offset in 0..COMPARISON_MONTHS as u32 {
            let month = first_of_month(today, offset);
            buckets.insert((month.year(), month.month() as u8), (0.0, 0.0));
        }

        for (table, is_expense) in [("expense", true), ("payment", false)] {
            let mut statement = self.connection.prepare(&format!(
                "SELECT date, amount FROM {table} WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3"
            ))?;
            let rows = statement.query_map((self.owner.as_i64(), start, today), |row| {
                Ok((row.get::<_, Date>(0)?, row.get::<_, f64>(1)?))
            })?;

            for row in rows {
                let (date, amount) = row?;

                if let Some((expenses, payments)) =
                    buckets.get_mut(&(date.year(), date.month() as u8))
                {
                    if is_expense {
                        *expenses += amount;
                    } else {
                        *payments += amount;
                    }
                }
            }
        }

        Ok(buckets
            .into_iter()
            .map(|((_, month), (expenses, payments))| MonthlyComparison {
                month: Month::try_from(month)
                    .map(|month| month.to_string())
                    .unwrap_or_default(),
                expenses: expenses.round(),
                payments: payments.round(),
            })
            .collect())
    }
}

/// The first day of the month `months_before` months before the month of `date`.
fn first_of_month(date: Date, months_before: u32) -> Date {
    let mut year = date.year();
    let mut month = date.month();

    for _ in 0..months_before {
        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    Date::from_calendar_date(year, month, 1).unwrap_or(date)
}
