use std::{error::Error, path::Path, process::exit, str::FromStr};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use spendwise::{
    CategoryName, ExpenseName, NewExpense, NewPayment, PasswordHash, ThumbnailUrl,
    ValidatedPassword, create_category, create_expense, create_payment, create_user,
    initialize_db,
};

/// A utility for creating a test database for the Spendwise server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of days of expenses and payments to create, counting back from today.
    #[arg(long, default_value_t = 180)]
    days: i64,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";

/// Name, thumbnail and typical expenses for each demo category.
const CATEGORIES: [(&str, Option<&str>, &[(&str, f64)]); 4] = [
    (
        "Groceries",
        Some("https://images.unsplash.com/photo-1542838132-92c53300491e?w=64"),
        &[("Supermarket", 84.20), ("Farmers market", 32.50), ("Bakery", 9.80)],
    ),
    (
        "Transport",
        None,
        &[("Bus fare", 4.50), ("Fuel", 71.35), ("Parking", 12.00)],
    ),
    (
        "Eating Out",
        None,
        &[("Coffee", 5.50), ("Lunch", 18.90), ("Dinner with friends", 64.00)],
    ),
    (
        "Utilities",
        None,
        &[("Electricity", 142.17), ("Internet", 79.99), ("Phone", 35.00)],
    ),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user {TEST_EMAIL} with the password \"{TEST_PASSWORD}\"...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(EmailAddress::from_str(TEST_EMAIL)?, password_hash, &connection)?;

    println!("Creating categories...");
    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, thumbnail_url, _) in CATEGORIES {
        let category = create_category(
            user.id,
            CategoryName::new(name)?,
            thumbnail_url.map(ThumbnailUrl::new_unchecked),
            &connection,
        )?;
        category_ids.push(category.id);
    }

    println!("Creating expenses and payments for the last {} days...", args.days);
    let today = OffsetDateTime::now_utc().date();
    let mut expense_count = 0;
    let mut payment_count = 0;

    for day in 0..args.days.max(0) {
        let date = today - Duration::days(day);

        for (index, (_, _, expenses)) in CATEGORIES.iter().enumerate() {
            // Spread the expenses so that each category has a different rhythm.
            if (day + index as i64) % (index as i64 + 2) != 0 {
                continue;
            }

            let (name, amount) = expenses[(day as usize + index) % expenses.len()];
            create_expense(
                user.id,
                NewExpense {
                    name: ExpenseName::new(name)?,
                    category_id: Some(category_ids[index]),
                    amount,
                    date,
                },
                &connection,
            )?;
            expense_count += 1;
        }

        if day % 7 == 3 {
            create_expense(
                user.id,
                NewExpense {
                    name: ExpenseName::new("Miscellaneous")?,
                    category_id: None,
                    amount: 15.0,
                    date,
                },
                &connection,
            )?;
            expense_count += 1;
        }

        if day % 14 == 0 {
            create_payment(
                user.id,
                NewPayment {
                    amount: 1850.0,
                    date,
                    payment_from: Some("Employer".to_owned()),
                },
                &connection,
            )?;
            payment_count += 1;
        }

        if day % 30 == 10 {
            create_payment(
                user.id,
                NewPayment {
                    amount: 120.0,
                    date,
                    payment_from: None,
                },
                &connection,
            )?;
            payment_count += 1;
        }
    }

    println!("Created {expense_count} expenses and {payment_count} payments.");
    println!("Success!");

    Ok(())
}
