//! The search box and filter widgets above a table.

use maud::{Markup, html};

use crate::html::{FORM_TEXT_INPUT_STYLE, loading_spinner};

use super::filter::{ColumnFilters, FilterDescriptor, filter_widget};

/// A free text search over the table's rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub text: String,
    pub placeholder: String,
    /// Where to send the search. The query is appended as `q`.
    pub url: String,
}

pub(crate) struct Filters<'a> {
    pub descriptors: Vec<FilterDescriptor>,
    pub state: ColumnFilters,
    pub link: Box<dyn Fn(&ColumnFilters) -> String + 'a>,
}

pub(crate) fn toolbar(
    search: &Search,
    filters: Option<&Filters<'_>>,
    custom_filters: Option<&Markup>,
    loading: bool,
) -> Markup {
    html! {
        div class="flex flex-wrap items-center justify-between gap-2 mb-2" data-toolbar
        {
            div class="flex flex-1 flex-wrap items-center gap-2"
            {
                div class="relative"
                {
                    input
                        type="search"
                        name="q"
                        value=(search.text)
                        placeholder=(search.placeholder)
                        aria-label=(search.placeholder)
                        autocomplete="off"
                        hx-get=(search.url)
                        hx-trigger="keyup changed"
                        hx-sync="this:replace"
                        class={ (FORM_TEXT_INPUT_STYLE) " h-8 w-[150px] lg:w-[250px]" };

                    @if loading {
                        span class="absolute right-2 top-2" { (loading_spinner()) }
                    }
                }

                @if let Some(filters) = filters {
                    div class="flex flex-wrap items-center gap-2" hx-sync="this:replace"
                    {
                        @for descriptor in &filters.descriptors {
                            (filter_widget(descriptor, &filters.state, filters.link.as_ref()))
                        }
                    }
                }
            }

            @if let Some(custom_filters) = custom_filters {
                div class="flex gap-2" { (custom_filters) }
            }
        }
    }
}
