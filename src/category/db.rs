//! Database operations for categories.
//!
//! Every query is scoped to the category's owner.

use rusqlite::{Connection, Row};

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName, CategoryWithExpenseCount, ThumbnailUrl},
};

const CATEGORY_COLUMNS: &str = "id, user_id, name, thumbnail_url, created_at";

/// Create a category for `owner` and return it with its generated ID.
pub fn create_category(
    owner: UserID,
    name: CategoryName,
    thumbnail_url: Option<ThumbnailUrl>,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO category (user_id, name, thumbnail_url) VALUES (?1, ?2, ?3)
            RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                owner.as_i64(),
                name.as_ref(),
                thumbnail_url.as_ref().map(ThumbnailUrl::as_str),
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve one of `owner`'s categories by ID.
///
/// Returns [Error::NotFound] if the category does not exist or belongs to someone else.
pub fn get_category(
    owner: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = :id AND user_id = :user_id;"
        ))?
        .query_row(
            &[(":id", &category_id), (":user_id", &owner.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of `owner`'s categories, newest first.
pub fn get_all_categories(owner: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC;"
        ))?
        .query_map([owner.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all of `owner`'s categories with how many expenses each has, newest first.
pub fn get_categories_with_expense_counts(
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<CategoryWithExpenseCount>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.user_id, c.name, c.thumbnail_url, c.created_at, COUNT(e.id)
            FROM category c
            LEFT JOIN expense e ON e.category_id = c.id AND e.user_id = c.user_id
            WHERE c.user_id = ?1
            GROUP BY c.id
            ORDER BY c.created_at DESC, c.id DESC;",
        )?
        .query_map([owner.as_i64()], |row| {
            Ok(CategoryWithExpenseCount {
                category: map_row(row)?,
                expense_count: row.get(5)?,
            })
        })?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update a category's name and thumbnail. Returns an error if the category doesn't exist.
pub fn update_category(
    owner: UserID,
    category_id: CategoryId,
    name: CategoryName,
    thumbnail_url: Option<ThumbnailUrl>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, thumbnail_url = ?2 WHERE id = ?3 AND user_id = ?4",
        (
            name.as_ref(),
            thumbnail_url.as_ref().map(ThumbnailUrl::as_str),
            category_id,
            owner.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category by ID. Returns an error if the category doesn't exist.
///
/// Expenses in the category are kept and become uncategorized.
pub fn delete_category(
    owner: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, owner.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            thumbnail_url TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_created_at ON category(user_id, created_at);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;
    let raw_thumbnail_url: Option<String> = row.get(3)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        thumbnail_url: raw_thumbnail_url.as_deref().map(ThumbnailUrl::new_unchecked),
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod category_query_tests {
    use std::collections::HashSet;

    use crate::{
        Error,
        category::{
            CategoryName, ThumbnailUrl, create_category, get_all_categories, get_category,
            update_category,
        },
        test_utils::{get_test_connection, insert_test_user},
    };

    use super::{delete_category, get_categories_with_expense_counts};

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let name = CategoryName::new("Coffee").unwrap();
        let thumbnail = Some(ThumbnailUrl::new_unchecked("https://example.com/coffee.png"));

        let category = create_category(owner, name.clone(), thumbnail.clone(), &connection)
            .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.user_id, owner);
        assert_eq!(category.name, name);
        assert_eq!(category.thumbnail_url, thumbnail);
    }

    #[test]
    fn get_category_succeeds() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let inserted = create_category(owner, CategoryName::new_unchecked("Foo"), None, &connection)
            .expect("Could not create test category");

        let selected = get_category(owner, inserted.id, &connection);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_category_of_other_user_returns_not_found() {
        let connection = get_test_connection();
        let owner = insert_test_user("owner@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        let inserted = create_category(owner, CategoryName::new_unchecked("Foo"), None, &connection)
            .expect("Could not create test category");

        let selected = get_category(someone_else, inserted.id, &connection);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_only_returns_owned_categories() {
        let connection = get_test_connection();
        let owner = insert_test_user("owner@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        let inserted = HashSet::from([
            create_category(owner, CategoryName::new_unchecked("Foo"), None, &connection).unwrap(),
            create_category(owner, CategoryName::new_unchecked("Bar"), None, &connection).unwrap(),
        ]
        .map(|category| category.id));
        create_category(someone_else, CategoryName::new_unchecked("Baz"), None, &connection)
            .unwrap();

        let selected: HashSet<_> = get_all_categories(owner, &connection)
            .expect("Could not get categories")
            .into_iter()
            .map(|category| category.id)
            .collect();

        assert_eq!(inserted, selected);
    }

    #[test]
    fn update_category_succeeds() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let category = create_category(owner, CategoryName::new_unchecked("Foo"), None, &connection)
            .unwrap();
        let thumbnail = Some(ThumbnailUrl::new_unchecked("/uploads/1/abc.png"));

        update_category(
            owner,
            category.id,
            CategoryName::new_unchecked("Bar"),
            thumbnail.clone(),
            &connection,
        )
        .expect("Could not update category");

        let updated = get_category(owner, category.id, &connection).unwrap();
        assert_eq!(updated.name, CategoryName::new_unchecked("Bar"));
        assert_eq!(updated.thumbnail_url, thumbnail);
    }

    #[test]
    fn update_category_of_other_user_fails() {
        let connection = get_test_connection();
        let owner = insert_test_user("owner@example.com", &connection);
        let someone_else = insert_test_user("else@example.com", &connection);
        let category = create_category(owner, CategoryName::new_unchecked("Foo"), None, &connection)
            .unwrap();

        let result = update_category(
            someone_else,
            category.id,
            CategoryName::new_unchecked("Bar"),
            None,
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_category_succeeds() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        let category = create_category(owner, CategoryName::new_unchecked("Foo"), None, &connection)
            .unwrap();

        delete_category(owner, category.id, &connection).expect("Could not delete category");

        assert_eq!(
            get_category(owner, category.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_missing_category_fails() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);

        let result = delete_category(owner, 42, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }

    #[test]
    fn categories_without_expenses_have_zero_count() {
        let connection = get_test_connection();
        let owner = insert_test_user("test@example.com", &connection);
        create_category(owner, CategoryName::new_unchecked("Foo"), None, &connection).unwrap();

        let categories = get_categories_with_expense_counts(owner, &connection).unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].expense_count, 0);
    }
}
