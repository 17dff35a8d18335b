//! The form shared by the new and edit expense pages, and its validation.

use maud::{Markup, html};
use time::Date;

use crate::{
    Error,
    category::{Category, CategoryId},
    endpoints,
    expense::{ExpenseFormData, ExpenseName, NewExpense},
    form::{FieldErrors, parse_amount, parse_date, validate_date},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        form_error,
    },
};

/// Which request the expense form sends.
pub enum ExpenseFormAction<'a> {
    Create,
    Update { endpoint: &'a str },
}

/// Check every field of a submitted expense form.
///
/// All invalid fields are reported, not just the first.
pub fn validate_expense_form(
    form: &ExpenseFormData,
    today: Date,
) -> Result<NewExpense, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = errors.check("name", ExpenseName::new(&form.name));
    let category_id = errors.check(
        "category_id",
        form.category_id
            .trim()
            .parse::<CategoryId>()
            .map_err(|_| Error::MissingCategory),
    );
    let amount = errors.check("amount", parse_amount(&form.amount));
    let date = errors.check(
        "date",
        parse_date(&form.date).and_then(|date| validate_date(date, today)),
    );

    match (name, category_id, amount, date) {
        (Some(name), Some(category_id), Some(amount), Some(date)) => Ok(NewExpense {
            name,
            category_id: Some(category_id),
            amount,
            date,
        }),
        _ => Err(errors),
    }
}

/// An expense form pre-filled with `values`.
pub fn expense_form(
    action: ExpenseFormAction<'_>,
    values: &ExpenseFormData,
    categories: &[Category],
    max_date: Date,
    errors: &FieldErrors,
) -> Markup {
    let (submit_text, create_endpoint, update_endpoint) = match action {
        ExpenseFormAction::Create => ("Create Expense", Some(endpoints::EXPENSES_API), None),
        ExpenseFormAction::Update { endpoint } => ("Save Changes", None, Some(endpoint)),
    };

    html! {
        form
            hx-post=[create_endpoint]
            hx-put=[update_endpoint]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(values.name)
                    placeholder="Coffee"
                    maxlength="100"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                (form_error(errors.get("name")))
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id="category_id"
                    name="category_id"
                    required
                    class=(FORM_SELECT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for category in categories {
                        @let value = category.id.to_string();
                        option value=(value) selected[value == values.category_id.trim()]
                        {
                            (category.name)
                        }
                    }
                }

                (form_error(errors.get("category_id")))
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        id="amount"
                        type="number"
                        name="amount"
                        value=(values.amount)
                        step="0.01"
                        min="0.01"
                        placeholder="0.00"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (form_error(errors.get("amount")))
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(values.date)
                    max=(max_date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (form_error(errors.get("date")))
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
