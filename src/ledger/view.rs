//! The markup for the bills page and the `#ledger` fragment that htmx swaps in.

use maud::{Markup, html};
use time::UtcOffset;

use crate::{
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, ECHARTS_SCRIPT_PATH,
        FORM_CHECKBOX_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        dollar_input_styles, format_currency,
    },
    ledger::{
        chart::{LedgerChart, chart_view},
        state::{Notice, PageState, Render, Summary},
    },
    timezone::format_local_date_time,
};

/// The text shown in the main panel when there are no bills.
pub(super) const EMPTY_PLACEHOLDER: &str = "No bills yet, add one from the panel on the left.";

const NOTICE_SUCCESS_STYLE: &str = "p-3 mt-4 text-sm rounded text-green-800 bg-green-50 \
    dark:bg-gray-800 dark:text-green-400";
const NOTICE_ERROR_STYLE: &str = "p-3 mt-4 text-sm rounded text-red-800 bg-red-50 \
    dark:bg-gray-800 dark:text-red-400";

/// Renders the full bills page.
pub(super) fn ledger_page(render: &Render, local_offset: UtcOffset) -> Markup {
    let head_elements = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_PATH.to_owned()),
        dollar_input_styles(),
    ];

    base("Bills", &head_elements, &ledger_view(render, local_offset))
}

/// Renders the side panel and main panel, the part of the page that changes
/// after an action.
pub(super) fn ledger_view(render: &Render, local_offset: UtcOffset) -> Markup {
    html!(
        div id="ledger" class=(PAGE_CONTAINER_STYLE)
        {
            (input_panel(render.notice.as_ref()))
            (main_panel(&render.state, local_offset))
        }
    )
}

fn input_panel(notice: Option<&Notice>) -> Markup {
    html!(
        aside
            id="input-panel"
            class="w-full lg:max-w-xs p-6 space-y-4 bg-white rounded-lg shadow
                dark:bg-gray-800"
        {
            h2 class="text-xl font-bold" { "Add a bill" }

            form
                id="add-bill"
                hx-post=(endpoints::BILLS_API)
                hx-target="#ledger"
                hx-target-error="#ledger"
                hx-swap="outerHTML"
                class="space-y-4"
            {
                div
                {
                    label for="item" class=(FORM_LABEL_STYLE) { "Item" }

                    input
                        type="text"
                        name="item"
                        id="item"
                        placeholder="Coffee"
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="price" class=(FORM_LABEL_STYLE) { "Price" }

                    div class="input-wrapper"
                    {
                        input
                            type="number"
                            name="price"
                            id="price"
                            min="0"
                            step="0.01"
                            value="0.00"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add bill" }
            }

            @if let Some(notice) = notice
            {
                @if notice.is_error() {
                    p id="notice" role="alert" class=(NOTICE_ERROR_STYLE) { (notice.message()) }
                } @else {
                    p id="notice" role="status" class=(NOTICE_SUCCESS_STYLE) { (notice.message()) }
                }
            }

            form
                id="clear-bills"
                hx-post=(endpoints::CLEAR_BILLS)
                hx-target="#ledger"
                hx-target-error="#ledger"
                hx-swap="outerHTML"
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Clear all bills" }
            }

            form
                id="wipe-bills"
                hx-post=(endpoints::WIPE_BILLS)
                hx-target="#ledger"
                hx-target-error="#ledger"
                hx-swap="outerHTML"
                class="space-y-2"
            {
                label class="flex items-center gap-2 text-sm"
                {
                    input
                        type="checkbox"
                        name="admin_mode"
                        id="admin_mode"
                        class=(FORM_CHECKBOX_STYLE);

                    "Admin mode"
                }

                button type="submit" class=(BUTTON_DELETE_STYLE) { "Wipe all bills" }
            }

            form
                id="end-session"
                hx-post=(endpoints::END_SESSION)
            {
                button type="submit" class=(BUTTON_SECONDARY_STYLE) { "End session" }
            }
        }
    )
}

fn main_panel(state: &PageState, local_offset: UtcOffset) -> Markup {
    html!(
        section id="main-panel" class="flex-1 min-w-0 space-y-6"
        {
            h1 class="text-2xl font-bold" { "Bills" }

            @match state {
                PageState::Empty => {
                    p id="placeholder" class="text-gray-600 dark:text-gray-400"
                    {
                        (EMPTY_PLACEHOLDER)
                    }
                }
                PageState::Populated(summary) => {
                    (summary_view(summary, local_offset))
                }
            }
        }
    )
}

fn summary_view(summary: &Summary, local_offset: UtcOffset) -> Markup {
    let chart = LedgerChart::bills_by_item(&summary.by_item);

    html!(
        div class="relative overflow-x-auto shadow-md rounded"
        {
            table id="bills" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Item" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Price" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Recorded" }
                    }
                }

                tbody
                {
                    @for record in &summary.records {
                        tr class=(TABLE_ROW_STYLE) data-bill-id=(record.id)
                        {
                            td class=(TABLE_CELL_STYLE) { (record.item.to_string()) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(record.price.as_f64())) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (format_local_date_time(record.created_at, local_offset))
                            }
                        }
                    }
                }
            }
        }

        div id="total" class="p-4 bg-white rounded-lg shadow dark:bg-gray-800"
        {
            p class="text-sm text-gray-600 dark:text-gray-400" { "Total spent" }
            p class="text-3xl font-bold" { (format_currency(summary.total)) }
        }

        (chart_view(&chart))
    )
}
