//! Summary cards and the per-category breakdown.

use maud::{Markup, html};

use crate::{
    dashboard::aggregation::{CategoryTotal, DashboardData},
    endpoints,
    html::{LINK_STYLE, format_currency},
};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

/// Formats a percentage value, avoiding "-0%" display.
fn format_percentage(value: f64) -> String {
    let rounded = value.round();
    if rounded.abs() < 0.5 {
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// The total expenses, total payments and period length cards.
pub(super) fn summary_cards_view(data: &DashboardData, days_in_period: i64) -> Markup {
    html! {
        section
            id="summary-cards"
            class="w-full grid grid-cols-1 md:grid-cols-3 gap-4 mb-8"
        {
            div class=(CARD_STYLE) data-card="expenses" {
                h3 class="text-sm font-medium text-gray-600 dark:text-gray-400" { "Total Expenses" }
                p class="text-3xl font-bold mt-1" { (format_currency(data.total_expenses)) }
            }

            div class=(CARD_STYLE) data-card="payments" {
                h3 class="text-sm font-medium text-gray-600 dark:text-gray-400" { "Total Payments" }
                p class="text-3xl font-bold mt-1" { (format_currency(data.total_payments)) }
                p class="text-sm text-gray-600 dark:text-gray-400" {
                    (pluralize(data.payment_count, "payment", "payments"))
                }
            }

            div class=(CARD_STYLE) data-card="period" {
                h3 class="text-sm font-medium text-gray-600 dark:text-gray-400" { "Period" }
                p class="text-3xl font-bold mt-1" {
                    (pluralize(days_in_period.max(0) as usize, "day", "days"))
                }
            }
        }
    }
}

/// Renders one row per category with its share of the total expenses.
pub(super) fn category_breakdown_view(data: &DashboardData) -> Markup {
    html! {
        section id="category-breakdown" class="w-full mb-8" {
            h3 class="text-xl font-semibold mb-4" { "Expenses by Category" }

            @if data.category_totals.is_empty() {
                div class=(CARD_STYLE) {
                    p class="text-gray-600 dark:text-gray-400" {
                        "No expenses found for this period"
                    }
                    a href=(endpoints::NEW_EXPENSE_VIEW) class=(LINK_STYLE) { "Record an expense" }
                }
            } @else {
                ul class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 gap-4" {
                    @for category_total in &data.category_totals {
                        (category_card(category_total, data.total_expenses))
                    }
                }
            }
        }
    }
}

fn category_card(category_total: &CategoryTotal, total_expenses: f64) -> Markup {
    let share = if total_expenses > 0.0 {
        category_total.total / total_expenses * 100.0
    } else {
        0.0
    };

    html! {
        li class=(CARD_STYLE) data-category-id=(category_total.id) {
            div class="flex items-center gap-3 mb-2" {
                @if let Some(thumbnail_url) = &category_total.thumbnail_url {
                    img
                        src=(thumbnail_url.as_str())
                        alt=""
                        class="w-8 h-8 rounded-full object-cover";
                } @else {
                    div class="w-8 h-8 rounded-full bg-gray-200 dark:bg-gray-700" {}
                }
                h4 class="text-lg font-semibold truncate" title=(category_total.name) {
                    (category_total.name)
                }
            }

            div class="text-2xl font-bold mb-1" data-total {
                (format_currency(category_total.total))
            }
            div class="text-sm text-gray-600 dark:text-gray-400 mb-2" data-share {
                (format_percentage(share)) "% of expenses"
            }
            (progress_bar(share))
        }
    }
}

/// Renders a horizontal progress bar showing percentage of total expenses.
fn progress_bar(percentage: f64) -> Markup {
    let clamped = percentage.clamp(0.0, 100.0);

    // Ensure minimum 3% width so rounded corners are visible
    let display_percentage = if clamped > 0.0 && clamped < 3.0 {
        3.0
    } else {
        clamped
    };

    html! {
        div
            class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2.5"
            role="progressbar"
            aria-valuenow=(format_percentage(clamped))
            aria-valuemin="0"
            aria-valuemax="100"
        {
            @if clamped > 0.0 {
                div
                    class="bg-blue-600 dark:bg-blue-500 h-2.5 rounded-full transition-all"
                    style=(format!("width: {:.1}%", display_percentage))
                {}
            }
        }
    }
}
