//! Database setup shared by the server and the command line tools.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, auth::create_user_table, category::create_category_table,
    expense::create_expense_table, payment::create_payment_table,
};

/// Enable foreign keys and create every table the app needs.
///
/// Tables that already exist are left untouched, so this is safe to call on
/// every start up.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_payment_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Escape the `LIKE` wildcards in `text` so that it matches literally.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');

    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(character);
    }

    pattern.push('%');
    pattern
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::{initialize, like_pattern};

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialize failed");
        initialize(&connection).expect("second initialize failed");
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let foreign_keys: i64 = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
