//! The form shared by the new and edit payment pages, and its validation.

use maud::{Markup, html};
use time::Date;

use crate::{
    endpoints,
    form::{FieldErrors, parse_amount, parse_date, validate_date},
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, form_error},
    payment::{NewPayment, PaymentFormData},
};

/// Which request the payment form sends.
pub enum PaymentFormAction<'a> {
    Create,
    Update { endpoint: &'a str },
}

/// Check every field of a submitted payment form.
///
/// A blank source is stored as no source.
pub fn validate_payment_form(
    form: &PaymentFormData,
    today: Date,
) -> Result<NewPayment, FieldErrors> {
    let mut errors = FieldErrors::default();

    let amount = errors.check("amount", parse_amount(&form.amount));
    let date = errors.check(
        "date",
        parse_date(&form.date).and_then(|date| validate_date(date, today)),
    );

    let payment_from = Some(form.payment_from.trim())
        .filter(|source| !source.is_empty())
        .map(ToOwned::to_owned);

    match (amount, date) {
        (Some(amount), Some(date)) => Ok(NewPayment {
            amount,
            date,
            payment_from,
        }),
        _ => Err(errors),
    }
}

/// A payment form pre-filled with `values`.
pub fn payment_form(
    action: PaymentFormAction<'_>,
    values: &PaymentFormData,
    max_date: Date,
    errors: &FieldErrors,
) -> Markup {
    let (submit_text, create_endpoint, update_endpoint) = match action {
        PaymentFormAction::Create => ("Create Payment", Some(endpoints::PAYMENTS_API), None),
        PaymentFormAction::Update { endpoint } => ("Save Changes", None, Some(endpoint)),
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
                        autofocus
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

            div
            {
                label for="payment_from" class=(FORM_LABEL_STYLE) { "Payment From" }

                input
                    id="payment_from"
                    type="text"
                    name="payment_from"
                    value=(values.payment_from)
                    placeholder="Employer"
                    maxlength="100"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

#[cfg(test)]
mod validate_payment_form_tests {
    use time::macros::date;

    use crate::payment::{NewPayment, PaymentFormData};

    use super::validate_payment_form;

    fn form(amount: &str, date: &str, payment_from: &str) -> PaymentFormData {
        PaymentFormData {
            amount: amount.to_owned(),
            date: date.to_owned(),
            payment_from: payment_from.to_owned(),
        }
    }

    #[test]
    fn valid_form_gives_new_payment() {
        let today = date!(2024 - 03 - 01);

        let got = validate_payment_form(&form("2500", "2024-03-01", " Employer "), today);

        assert_eq!(
            got,
            Ok(NewPayment {
                amount: 2500.0,
                date: today,
                payment_from: Some("Employer".to_owned()),
            })
        );
    }

    #[test]
    fn blank_source_is_none() {
        let today = date!(2024 - 03 - 01);

        let got = validate_payment_form(&form("1", "2024-03-01", "  "), today).unwrap();

        assert_eq!(got.payment_from, None);
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let today = date!(2024 - 03 - 01);

        let errors = validate_payment_form(&form("-5", "2024-03-02", ""), today)
            .expect_err("Form should be invalid");

        assert_eq!(errors.get("amount"), Some("Amount must be greater than 0"));
        assert_eq!(errors.get("date"), Some("Date cannot be in the future"));
    }
}
