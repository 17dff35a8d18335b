//! Database operations for payments.

use rusqlite::{Connection, Row};

use crate::{
    Error, UserID,
    payment::{NewPayment, Payment, PaymentId},
};

/// The columns read by [map_row], in order.
pub(super) const PAYMENT_COLUMNS: &str = "id, user_id, amount, date, payment_from, created_at";

/// Record a new payment for `owner`.
pub fn create_payment(
    owner: UserID,
    payment: NewPayment,
    connection: &Connection,
) -> Result<Payment, Error> {
    connection.execute(
        "INSERT INTO payment (user_id, amount, date, payment_from) VALUES (?1, ?2, ?3, ?4)",
        (
            owner.as_i64(),
            payment.amount,
            payment.date,
            payment.payment_from,
        ),
    )?;

    get_payment(owner, connection.last_insert_rowid(), connection)
}

/// Retrieve one of `owner`'s payments by ID.
///
/// Returns [Error::NotFound] if the payment does not exist or belongs to someone else.
pub fn get_payment(
    owner: UserID,
    payment_id: PaymentId,
    connection: &Connection,
) -> Result<Payment, Error> {
    connection
        .prepare(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((payment_id, owner.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Replace the fields of an existing payment.
///
/// # Errors
/// Returns [Error::UpdateMissingPayment] if the payment does not exist or belongs to someone else.
pub fn update_payment(
    owner: UserID,
    payment_id: PaymentId,
    payment: NewPayment,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE payment SET amount = ?1, date = ?2, payment_from = ?3
        WHERE id = ?4 AND user_id = ?5",
        (
            payment.amount,
            payment.date,
            payment.payment_from,
            payment_id,
            owner.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingPayment);
    }

    Ok(())
}

/// Delete a payment by ID. Returns an error if the payment doesn't exist.
pub fn delete_payment(
    owner: UserID,
    payment_id: PaymentId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM payment WHERE id = ?1 AND user_id = ?2",
        (payment_id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingPayment);
    }

    Ok(())
}

/// The distinct, non-empty payment sources `owner` has used, sorted alphabetically.
pub fn get_payment_sources(owner: UserID, connection: &Connection) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT payment_from FROM payment
            WHERE user_id = ?1 AND payment_from IS NOT NULL AND payment_from != ''
            ORDER BY payment_from COLLATE NOCASE ASC",
        )?
        .query_map([owner.as_i64()], |row| row.get(0))?
        .map(|maybe_source| maybe_source.map_err(|error| error.into()))
        .collect()
}

/// Initialize the payment table and indexes.
pub fn create_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS payment (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            payment_from TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_payment_user_date ON payment(user_id, date);",
    )?;

    Ok(())
}

/// Map a row selected with [PAYMENT_COLUMNS] to a [Payment].
pub(super) fn map_row(row: &Row) -> Result<Payment, rusqlite::Error> {
    Ok(Payment {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        date: row.get(3)?,
        payment_from: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod payment_query_tests {
    use time::macros::date;

    use crate::{
        Error,
        payment::NewPayment,
        test_utils::{get_test_connection, insert_test_user},
    };

    use super::{
        create_payment, delete_payment, get_payment, get_payment_sources, update_payment,
    };

    fn salary(payment_from: Option<&str>) -> NewPayment {
        NewPayment {
            amount: 2500.0,
            date: date!(2024 - 03 - 01),
            payment_from: payment_from.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn create_payment_succeeds() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);

        let payment = create_payment(owner, salary(Some("Employer")), &connection)
            .expect("Could not create payment");

        assert!(payment.id > 0);
        assert_eq!(payment.user_id, owner);
        assert_eq!(payment.amount, 2500.0);
        assert_eq!(payment.date, date!(2024 - 03 - 01));
        assert_eq!(payment.payment_from.as_deref(), Some("Employer"));
    }

    #[test]
    fn get_payment_is_owner_scoped() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        let payment = create_payment(owner, salary(None), &connection).unwrap();

        assert_eq!(get_payment(owner, payment.id, &connection), Ok(payment.clone()));
        assert_eq!(
            get_payment(someone_else, payment.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_payment_succeeds() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let payment = create_payment(owner, salary(None), &connection).unwrap();

        update_payment(
            owner,
            payment.id,
            NewPayment {
                amount: 100.0,
                date: date!(2024 - 02 - 29),
                payment_from: Some("Gift".to_owned()),
            },
            &connection,
        )
        .expect("Could not update payment");

        let updated = get_payment(owner, payment.id, &connection).unwrap();
        assert_eq!(updated.amount, 100.0);
        assert_eq!(updated.date, date!(2024 - 02 - 29));
        assert_eq!(updated.payment_from.as_deref(), Some("Gift"));
    }

    #[test]
    fn update_payment_fails_for_other_owner() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        let payment = create_payment(owner, salary(None), &connection).unwrap();

        let result = update_payment(someone_else, payment.id, salary(None), &connection);

        assert_eq!(result, Err(Error::UpdateMissingPayment));
    }

    #[test]
    fn delete_payment_succeeds_once() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let payment = create_payment(owner, salary(None), &connection).unwrap();

        delete_payment(owner, payment.id, &connection).expect("Could not delete payment");

        assert_eq!(get_payment(owner, payment.id, &connection), Err(Error::NotFound));
        assert_eq!(
            delete_payment(owner, payment.id, &connection),
            Err(Error::DeleteMissingPayment)
        );
    }

    #[test]
    fn payment_sources_are_distinct_and_owner_scoped() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        create_payment(owner, salary(Some("Employer")), &connection).unwrap();
        create_payment(owner, salary(Some("Employer")), &connection).unwrap();
        create_payment(owner, salary(Some("bank")), &connection).unwrap();
        create_payment(owner, salary(None), &connection).unwrap();
        create_payment(someone_else, salary(Some("Lottery")), &connection).unwrap();

        let sources = get_payment_sources(owner, &connection).unwrap();

        assert_eq!(sources, ["bank", "Employer"]);
    }
}
