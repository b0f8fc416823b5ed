//! The bar chart of spend per item.
//!
//! The chart is built with charming, serialized to an ECharts option object
//! and initialised by an inline script that sits next to its container, so it
//! is drawn both on page load and when htmx swaps in a new ledger.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::bar,
};
use maud::{Markup, PreEscaped, html};

use crate::aggregation::ItemTotal;

/// The HTML element ID of the spend per item chart.
pub(super) const BILLS_BY_ITEM_CHART_ID: &str = "bills-by-item-chart";

/// A chart with its HTML container ID and ECharts configuration.
pub(super) struct LedgerChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl LedgerChart {
    /// Chart the spend per item, in the order of `item_totals`.
    pub fn bills_by_item(item_totals: &[ItemTotal]) -> Self {
        Self {
            id: BILLS_BY_ITEM_CHART_ID,
            options: bills_by_item_chart(item_totals).to_string(),
        }
    }
}

/// Renders the container for `chart` followed by the script that draws it.
pub(super) fn chart_view(chart: &LedgerChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[380px] w-full rounded dark:bg-gray-100"
        {}

        script { (chart_script(chart)) }
    )
}

/// Escape `options` so that it cannot close or comment out the script it is
/// embedded in.
///
/// Item names are user input and end up as strings in the options. Escaping
/// every `<` as `\u003c` keeps the JSON equivalent while making sequences such
/// as `</script>` and `<!--` impossible.
fn escape_for_script(options: &str) -> String {
    options.replace('<', "\\u003c")
}

fn chart_script(chart: &LedgerChart) -> PreEscaped<String> {
    PreEscaped(format!(
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
        chart.id,
        escape_for_script(&chart.options)
    ))
}

fn bills_by_item_chart(item_totals: &[ItemTotal]) -> Chart {
    let labels: Vec<String> = item_totals
        .iter()
        .map(|item_total| item_total.item.to_string())
        .collect();
    let values: Vec<f64> = item_totals
        .iter()
        .map(|item_total| item_total.total)
        .collect();

    Chart::new()
        .title(Title::new().text("Spend by item"))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(bar::Bar::new().name("Spent").data(values))
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
