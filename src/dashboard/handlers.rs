//! Dashboard HTTP handler and view rendering.

use std::{
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, UserID,
    dashboard::{
        aggregation::{DashboardData, MonthlyComparison, ReportAggregator},
        cards::{category_breakdown_view, summary_cards_view},
        charts::{DashboardChart, charts_script, charts_view, payments_vs_expenses_chart},
    },
    endpoints,
    form::parse_date,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, base,
        error_banner,
    },
    navigation::NavBar,
    timezone::local_today,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The reporting period in the query string, as `YYYY-MM-DD` dates.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// Resolve the reporting period, defaulting to the start of the current month
/// through `today`. Dates given in the wrong order are swapped.
fn resolve_period(query: &DashboardQuery, today: Date) -> RangeInclusive<Date> {
    let start = parse_date(&query.start)
        .ok()
        .unwrap_or_else(|| today.replace_day(1).unwrap_or(today));
    let end = parse_date(&query.end).ok().unwrap_or(today);

    if start <= end {
        start..=end
    } else {
        end..=start
    }
}

/// Display the dashboard for the reporting period in the query string.
pub async fn get_dashboard_page(
    user_id: UserID,
    State(state): State<DashboardState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let period = resolve_period(&query, today);

    let report = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let aggregator = ReportAggregator::new(user_id, &connection);
        aggregator
            .dashboard_data(period.clone())
            .and_then(|data| Ok((data, aggregator.monthly_comparison(today)?)))
            .inspect_err(|error| tracing::error!("Could not build dashboard report: {error}"))
    };

    Ok(dashboard_view(&period, report).into_response())
}

fn period_form(period: &RangeInclusive<Date>) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::DASHBOARD_VIEW)
            class="w-full flex flex-wrap items-end gap-4 mb-8"
        {
            div {
                label for="start" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    name="start"
                    id="start"
                    value=(period.start())
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div {
                label for="end" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    name="end"
                    id="end"
                    value=(period.end())
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update" }
            }
        }
    }
}

fn dashboard_view(
    period: &RangeInclusive<Date>,
    report: Result<(DashboardData, Vec<MonthlyComparison>), Error>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let days_in_period = (*period.end() - *period.start()).whole_days() + 1;

    let (body, charts) = match &report {
        Ok((data, months)) => {
            let charts = vec![DashboardChart {
                id: "payments-vs-expenses-chart",
                options: payments_vs_expenses_chart(months).to_string(),
            }];

            let body = html! {
                (summary_cards_view(data, days_in_period))
                (category_breakdown_view(data))
                (charts_view(&charts))
            };

            (body, charts)
        }
        Err(error) => (
            error_banner(&format!("Error loading dashboard: {error}")),
            Vec::new(),
        ),
    };

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            h1 class="w-full text-xl font-bold mb-4" { "Dashboard" }

            (period_form(period))
            (body)
        }
    );

    let scripts = if charts.is_empty() {
        Vec::new()
    } else {
        vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            charts_script(&charts),
        ]
    };

    base("Dashboard", &scripts, &content)
}
