//! The paged, searchable payment query behind the payments page.

use std::ops::RangeInclusive;

use rusqlite::{Connection, params_from_iter, types::Value};
use time::Date;

use crate::{
    Error, UserID,
    db::like_pattern,
    payment::{
        Payment,
        db::{PAYMENT_COLUMNS, map_row},
    },
};

/// Which of a user's payments to fetch. Payments are listed newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentQuery {
    /// Case-insensitive text matched against the amount, source and date.
    pub search: String,
    pub date_range: Option<RangeInclusive<Date>>,
    /// Only include payments from this source.
    pub payment_from: Option<String>,
    /// Zero-based.
    pub page_index: u64,
    pub page_size: u64,
}

impl Default for PaymentQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            date_range: None,
            payment_from: None,
            page_index: 0,
            page_size: 10,
        }
    }
}

/// One page of payments and the number of payments on every page.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPage {
    pub payments: Vec<Payment>,
    pub total: u64,
}

/// Fetch a page of `owner`'s payments matching `query`.
pub fn query_payments(
    owner: UserID,
    query: &PaymentQuery,
    connection: &Connection,
) -> Result<PaymentPage, Error> {
    let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(owner.as_i64())];

    let search = query.search.trim();
    if !search.is_empty() {
        let index = query_parameters.len() + 1;
        where_clause_parts.push(format!(
            "(CAST(amount AS TEXT) LIKE ?{index} ESCAPE '\\' \
            OR payment_from LIKE ?{index} ESCAPE '\\' \
            OR date LIKE ?{index} ESCAPE '\\')"
        ));
        query_parameters.push(Value::Text(like_pattern(search)));
    }

    if let Some(date_range) = &query.date_range {
        where_clause_parts.push(format!(
            "date BETWEEN ?{} AND ?{}",
            query_parameters.len() + 1,
            query_parameters.len() + 2,
        ));
        query_parameters.push(Value::Text(date_range.start().to_string()));
        query_parameters.push(Value::Text(date_range.end().to_string()));
    }

    if let Some(payment_from) = &query.payment_from {
        where_clause_parts.push(format!("payment_from = ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(payment_from.clone()));
    }

    let where_clause = where_clause_parts.join(" AND ");

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(*) FROM payment WHERE {where_clause}"),
        params_from_iter(query_parameters.iter()),
        |row| row.get(0),
    )?;

    let page_size = query.page_size.max(1);
    let page_query = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payment WHERE {where_clause} \
        ORDER BY date DESC, id ASC \
        LIMIT {page_size} OFFSET {}",
        query.page_index.saturating_mul(page_size).min(i64::MAX as u64),
    );

    let payments = connection
        .prepare(&page_query)?
        .query_map(params_from_iter(query_parameters.iter()), map_row)?
        .map(|maybe_payment| maybe_payment.map_err(|error| error.into()))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(PaymentPage {
        payments,
        total: total.max(0) as u64,
    })
}

#[cfg(test)]
mod query_payments_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        UserID,
        payment::{NewPayment, create_payment},
        test_utils::{get_test_connection, insert_test_user},
    };

    use super::{PaymentQuery, query_payments};

    fn insert(
        owner: UserID,
        amount: f64,
        date: Date,
        payment_from: Option<&str>,
        connection: &Connection,
    ) {
        create_payment(
            owner,
            NewPayment {
                amount,
                date,
                payment_from: payment_from.map(ToOwned::to_owned),
            },
            connection,
        )
        .expect("Could not create payment");
    }

    fn amounts(query: &PaymentQuery, owner: UserID, connection: &Connection) -> Vec<f64> {
        query_payments(owner, query, connection)
            .expect("Could not query payments")
            .payments
            .into_iter()
            .map(|payment| payment.amount)
            .collect()
    }

    #[test]
    fn lists_newest_first_for_owner_only() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        insert(owner, 1.0, date!(2024 - 01 - 01), None, &connection);
        insert(owner, 2.0, date!(2024 - 03 - 01), None, &connection);
        insert(someone_else, 3.0, date!(2024 - 02 - 01), None, &connection);

        let page = query_payments(owner, &PaymentQuery::default(), &connection).unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(amounts(&PaymentQuery::default(), owner, &connection), [2.0, 1.0]);
    }

    #[test]
    fn second_page_has_the_remainder() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        for day in 1..=12 {
            let date = date!(2024 - 03 - 01).replace_day(day).unwrap();
            insert(owner, f64::from(day), date, None, &connection);
        }
        let query = PaymentQuery {
            page_index: 1,
            ..Default::default()
        };

        let page = query_payments(owner, &query, &connection).unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(amounts(&query, owner, &connection), [2.0, 1.0]);
    }

    #[test]
    fn search_matches_amount_source_and_date() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        insert(owner, 2500.0, date!(2024 - 03 - 01), Some("Employer"), &connection);
        insert(owner, 40.0, date!(2024 - 02 - 14), Some("Gran"), &connection);
        insert(owner, 12.5, date!(2024 - 01 - 20), None, &connection);

        let search = |text: &str| {
            let query = PaymentQuery {
                search: text.to_owned(),
                ..Default::default()
            };
            amounts(&query, owner, &connection)
        };

        assert_eq!(search("employ"), [2500.0]);
        assert_eq!(search("12.5"), [12.5]);
        assert_eq!(search("2024-02"), [40.0]);
        assert!(search("_").is_empty());
    }

    #[test]
    fn filters_by_date_range_and_source() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        insert(owner, 1.0, date!(2024 - 03 - 05), Some("Employer"), &connection);
        insert(owner, 2.0, date!(2024 - 03 - 06), Some("Gran"), &connection);
        insert(owner, 3.0, date!(2024 - 04 - 01), Some("Employer"), &connection);

        let query = PaymentQuery {
            date_range: Some(date!(2024 - 03 - 01)..=date!(2024 - 03 - 31)),
            payment_from: Some("Employer".to_owned()),
            ..Default::default()
        };

        assert_eq!(amounts(&query, owner, &connection), [1.0]);
    }
}
