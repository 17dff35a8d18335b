use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, UserID, create_user},
    db::initialize,
};

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// Create a user with `email` and return their ID.
#[track_caller]
pub(crate) fn insert_test_user(email: &str, connection: &Connection) -> UserID {
    let email = email.parse().expect("invalid test email");

    create_user(email, PasswordHash::new_unchecked("hunter2"), connection)
        .expect("Could not create test user")
        .id
}

pub(crate) fn shared(connection: Connection) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(connection))
}
