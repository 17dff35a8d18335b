//! Column filters and the widgets that edit them.
//!
//! Filter state lives in [ColumnFilters], which the page owns. A widget never
//! changes the state itself: every interaction is a link (or form) pointing at
//! the URL the page returns for the new state.

use std::collections::BTreeSet;

use maud::{Markup, html};
use time::{Date, macros::format_description};

use crate::html::{BADGE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, format_date};

/// One choice in a select filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Describes a filter widget for the column `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDescriptor {
    /// A from/to date range.
    Date { key: String, title: String },
    /// Pick at most one option.
    SingleSelect {
        key: String,
        title: String,
        options: Vec<FilterOption>,
    },
    /// Pick any number of options.
    MultiSelect {
        key: String,
        title: String,
        options: Vec<FilterOption>,
    },
}

impl FilterDescriptor {
    pub fn key(&self) -> &str {
        match self {
            FilterDescriptor::Date { key, .. }
            | FilterDescriptor::SingleSelect { key, .. }
            | FilterDescriptor::MultiSelect { key, .. } => key,
        }
    }
}

/// The value of a column filter. The shape depends on the kind of filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Both ends of a date range, formatted like "Fri Mar 01 2024".
    DateRange { from: String, to: String },
    Single(String),
    Multi(BTreeSet<String>),
}

impl FilterValue {
    /// The dates of a [FilterValue::DateRange], if both ends can be read.
    pub fn date_range(&self) -> Option<(Date, Date)> {
        match self {
            FilterValue::DateRange { from, to } => {
                Some((parse_human_date(from)?, parse_human_date(to)?))
            }
            _ => None,
        }
    }
}

/// Format `date` like "Fri Mar 01 2024".
pub fn human_date(date: Date) -> String {
    date.format(format_description!(
        "[weekday repr:short] [month repr:short] [day] [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}

/// Read a date written by [human_date].
pub fn parse_human_date(text: &str) -> Option<Date> {
    // The weekday is redundant, so only the rest is parsed.
    let (_weekday, rest) = text.trim().split_once(' ')?;

    Date::parse(rest, format_description!("[month repr:short] [day] [year]")).ok()
}

/// A date range filter value, only when both ends are set.
pub fn date_range_value(from: Option<Date>, to: Option<Date>) -> Option<FilterValue> {
    match (from, to) {
        (Some(from), Some(to)) => Some(FilterValue::DateRange {
            from: human_date(from),
            to: human_date(to),
        }),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column_id: String,
    pub value: FilterValue,
}

/// The active filters in the order they were set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnFilters(Vec<ColumnFilter>);

impl ColumnFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column_id: &str) -> Option<&FilterValue> {
        self.0
            .iter()
            .find(|filter| filter.column_id == column_id)
            .map(|filter| &filter.value)
    }

    /// Set or remove the filter for `column_id`.
    ///
    /// `None` and empty multi-selections remove the entry, otherwise an
    /// existing entry is replaced in place and a new one is appended.
    pub fn set(&mut self, column_id: &str, value: Option<FilterValue>) {
        let value = value.filter(|value| !matches!(value, FilterValue::Multi(set) if set.is_empty()));

        let position = self
            .0
            .iter()
            .position(|filter| filter.column_id == column_id);

        match (position, value) {
            (Some(position), Some(value)) => self.0[position].value = value,
            (Some(position), None) => {
                self.0.remove(position);
            }
            (None, Some(value)) => self.0.push(ColumnFilter {
                column_id: column_id.to_owned(),
                value,
            }),
            (None, None) => {}
        }
    }

    /// A copy of these filters with the filter for `column_id` set to `value`.
    pub fn with(&self, column_id: &str, value: Option<FilterValue>) -> Self {
        let mut filters = self.clone();
        filters.set(column_id, value);
        filters
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnFilter> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

const FILTER_TRIGGER_STYLE: &str = "inline-flex items-center gap-2 h-8 px-2 \
    rounded border border-dashed border-gray-300 dark:border-gray-600 text-sm \
    cursor-pointer list-none hover:bg-gray-100 dark:hover:bg-gray-700";
const FILTER_POPOVER_STYLE: &str = "absolute z-20 mt-1 min-w-48 p-2 rounded \
    border border-gray-200 dark:border-gray-700 bg-white dark:bg-gray-800 shadow";
const FILTER_OPTION_STYLE: &str = "flex items-center gap-2 px-2 py-1 rounded \
    text-sm hover:bg-gray-100 dark:hover:bg-gray-700";

const OPTION_SEARCH_SCRIPT: &str = "const query = this.value.toLowerCase(); \
    const popover = this.closest('details'); \
    let shown = 0; \
    popover.querySelectorAll('[data-option]').forEach((option) => { \
        const matches = option.dataset.label.toLowerCase().includes(query); \
        option.hidden = !matches; \
        if (matches) shown++; \
    }); \
    popover.querySelector('[data-empty]').hidden = shown > 0;";

/// The widget for `descriptor`, linking each change to `filter_link(new filters)`.
pub(crate) fn filter_widget(
    descriptor: &FilterDescriptor,
    filters: &ColumnFilters,
    filter_link: &dyn Fn(&ColumnFilters) -> String,
) -> Markup {
    match descriptor {
        FilterDescriptor::Date { key, title } => date_filter(key, title, filters, filter_link),
        FilterDescriptor::SingleSelect {
            key,
            title,
            options,
        } => {
            let selected: BTreeSet<String> = match filters.get(key) {
                Some(FilterValue::Single(value)) => BTreeSet::from([value.clone()]),
                _ => BTreeSet::new(),
            };

            select_filter(key, title, options, &selected, false, filters, filter_link)
        }
        FilterDescriptor::MultiSelect {
            key,
            title,
            options,
        } => {
            let selected = match filters.get(key) {
                Some(FilterValue::Multi(values)) => values.clone(),
                _ => BTreeSet::new(),
            };

            select_filter(key, title, options, &selected, true, filters, filter_link)
        }
    }
}

/// The label shown on a date filter's trigger.
pub fn date_filter_label(title: &str, value: Option<&FilterValue>) -> String {
    match value.and_then(FilterValue::date_range) {
        Some((from, to)) => format!("{} - {}", format_date(from), format_date(to)),
        None => title.to_owned(),
    }
}

fn date_filter(
    key: &str,
    title: &str,
    filters: &ColumnFilters,
    filter_link: &dyn Fn(&ColumnFilters) -> String,
) -> Markup {
    let value = filters.get(key);
    let range = value.and_then(FilterValue::date_range);
    let form_url = filter_link(&filters.with(key, None));
    let from_name = format!("{key}_from");
    let to_name = format!("{key}_to");
    let date_format = format_description!("[year]-[month]-[day]");
    let from_value = range.and_then(|(from, _)| from.format(date_format).ok());
    let to_value = range.and_then(|(_, to)| to.format(date_format).ok());

    html! {
        details class="relative" data-filter=(key)
        {
            summary class=(FILTER_TRIGGER_STYLE)
            {
                span aria-hidden="true" { "📅" }
                span { (date_filter_label(title, value)) }
            }

            form
                class=(FILTER_POPOVER_STYLE)
                hx-get=(form_url)
                hx-sync="this:replace"
            {
                div class="flex flex-col gap-2"
                {
                    label class=(FORM_LABEL_STYLE) for=(from_name) { "From" }
                    input
                        type="date"
                        id=(from_name)
                        name=(from_name)
                        value=[from_value]
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    label class=(FORM_LABEL_STYLE) for=(to_name) { "To" }
                    input
                        type="date"
                        id=(to_name)
                        name=(to_name)
                        value=[to_value]
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    div class="flex justify-between gap-2"
                    {
                        @if range.is_some() {
                            a href=(form_url) hx-get=(form_url) class="text-sm underline" { "Clear" }
                        }

                        button type="submit" class="text-sm underline" { "Apply" }
                    }
                }
            }
        }
    }
}

fn select_filter(
    key: &str,
    title: &str,
    options: &[FilterOption],
    selected: &BTreeSet<String>,
    is_multi: bool,
    filters: &ColumnFilters,
    filter_link: &dyn Fn(&ColumnFilters) -> String,
) -> Markup {
    let value_for = |values: BTreeSet<String>| -> Option<FilterValue> {
        if is_multi {
            Some(FilterValue::Multi(values))
        } else {
            values.into_iter().next().map(FilterValue::Single)
        }
    };
    let link_without = |value: &str| {
        let mut remaining = selected.clone();
        remaining.remove(value);
        filter_link(&filters.with(key, value_for(remaining)))
    };
    let toggle_link = |value: &str| {
        if selected.contains(value) {
            link_without(value)
        } else if is_multi {
            let mut values = selected.clone();
            values.insert(value.to_owned());
            filter_link(&filters.with(key, value_for(values)))
        } else {
            filter_link(&filters.with(key, Some(FilterValue::Single(value.to_owned()))))
        }
    };
    let clear_link = filter_link(&filters.with(key, None));

    let mut sorted_options: Vec<&FilterOption> = options.iter().collect();
    sorted_options.sort_by(|a, b| a.label.cmp(&b.label));

    let selected_options: Vec<&FilterOption> = sorted_options
        .iter()
        .copied()
        .filter(|option| selected.contains(&option.value))
        .collect();

    html! {
        details class="relative" data-filter=(key)
        {
            summary class=(FILTER_TRIGGER_STYLE)
            {
                span aria-hidden="true" { @if is_multi { "⊕" } @else { "⇅" } }
                span { (title) }

                @if selected.len() > 2 {
                    a href=(clear_link) hx-get=(clear_link) class=(BADGE_STYLE) data-badge
                    {
                        (selected.len()) " selected"
                        span aria-hidden="true" { "✕" }
                    }
                } @else {
                    @for option in &selected_options {
                        @let url = link_without(&option.value);
                        a href=(url) hx-get=(url) class=(BADGE_STYLE) data-badge
                        {
                            (option.label)
                            span aria-hidden="true" { "✕" }
                        }
                    }
                }
            }

            div class=(FILTER_POPOVER_STYLE)
            {
                input
                    type="search"
                    placeholder=(title)
                    aria-label=(title)
                    autocomplete="off"
                    oninput=(OPTION_SEARCH_SCRIPT)
                    class=(FORM_TEXT_INPUT_STYLE);

                ul class="mt-2 flex flex-col"
                {
                    @for option in &sorted_options {
                        @let url = toggle_link(&option.value);
                        @let is_selected = selected.contains(&option.value);
                        li data-option data-label=(option.label)
                        {
                            a
                                href=(url)
                                hx-get=(url)
                                class=(FILTER_OPTION_STYLE)
                                aria-selected=(if is_selected { "true" } else { "false" })
                            {
                                span class="w-4" aria-hidden="true" { @if is_selected { "✓" } }
                                span { (option.label) }
                            }
                        }
                    }

                    li data-empty hidden[!sorted_options.is_empty()] class="px-2 py-1 text-sm"
                    {
                        "No results found."
                    }
                }

                @if !selected.is_empty() {
                    a
                        href=(clear_link)
                        hx-get=(clear_link)
                        class="block mt-2 pt-2 border-t text-center text-sm"
                        data-clear
                    {
                        @if is_multi { "Clear filters" } @else { "Clear filter" }
                    }
                }
            }
        }
    }
}
