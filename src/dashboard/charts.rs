//! The payments-vs-expenses chart on the dashboard.
//!
//! Charts are generated as ECharts JSON configuration and initialised by a
//! script in the page head.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{dashboard::aggregation::MonthlyComparison, html::HeadElement};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates the JavaScript that initialises each chart with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A grouped bar chart with one pair of bars per month.
pub(super) fn payments_vs_expenses_chart(months: &[MonthlyComparison]) -> Chart {
    let labels: Vec<String> = months.iter().map(|month| month.month.clone()).collect();
    let payments: Vec<f64> = months.iter().map(|month| month.payments).collect();
    let expenses: Vec<f64> = months.iter().map(|month| month.expenses).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Payments vs Expenses")
                .subtext("Last six months")
                .left(20)
                .top("1%"),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().right(20).top("1%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(90)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name("Payments")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(payments),
        )
        .series(
            bar::Bar::new()
                .name("Expenses")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(expenses),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod payments_vs_expenses_chart_tests {
    use serde_json::Value;

    use crate::dashboard::aggregation::MonthlyComparison;

    use super::payments_vs_expenses_chart;

    #[test]
    fn has_one_bar_series_each_for_payments_and_expenses() {
        let months = vec![
            MonthlyComparison {
                month: "February".to_owned(),
                expenses: 120.0,
                payments: 400.0,
            },
            MonthlyComparison {
                month: "March".to_owned(),
                expenses: 80.0,
                payments: 0.0,
            },
        ];

        let options: Value = serde_json::to_value(payments_vs_expenses_chart(&months)).unwrap();

        assert!(options["title"].to_string().contains("Payments vs Expenses"));
        assert!(options["xAxis"].to_string().contains(r#"["February","March"]"#));
        let series = options["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["type"], "bar");
        assert_eq!(series[0]["name"], "Payments");
        assert_eq!(series[1]["type"], "bar");
        assert_eq!(series[1]["name"], "Expenses");
    }
}
