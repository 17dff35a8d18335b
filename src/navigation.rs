//! The navigation bar shown at the top of every page, and at the bottom on small screens.

use maud::{Markup, html};

use crate::endpoints;

/// The sections of the app, in the order they appear in the navigation bar.
const SECTIONS: [(&str, &str); 4] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard"),
    (endpoints::EXPENSES_VIEW, "Expenses"),
    (endpoints::PAYMENTS_VIEW, "Payments"),
    (endpoints::CATEGORIES_VIEW, "Categories"),
];

/// A link to one section of the app.
///
/// A link is current when the page is the section's listing or one of the
/// pages under it, e.g. "/expenses/new" belongs to "/expenses".
#[derive(Debug, Clone, PartialEq)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl<'a> Link<'a> {
    fn new(url: &'a str, title: &'a str, active_endpoint: &str) -> Self {
        let is_current = active_endpoint
            .strip_prefix(url)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));

        Self {
            url,
            title,
            is_current,
        }
    }

    fn into_desktop_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            { (self.title) }
        )
    }

    fn into_mobile_html(self) -> Markup {
        let style = if self.is_current {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            bg-blue-50 px-2.5 py-2 text-xs font-semibold leading-tight \
            text-blue-700 shadow-sm sm:text-sm dark:bg-blue-900/30 dark:text-blue-200"
        } else {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            px-2.5 py-2 text-xs font-semibold leading-tight text-gray-600 sm:text-sm \
            hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300 \
            dark:hover:bg-blue-900/20 dark:hover:text-blue-200"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                span class="truncate" { (self.title) }
            }
        )
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar with the section containing `active_endpoint` highlighted.
    pub fn new(active_endpoint: &str) -> NavBar<'static> {
        let links = SECTIONS
            .iter()
            .map(|&(url, title)| Link::new(url, title, active_endpoint))
            .collect();

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Spendwise"
                        }
                    }

                    div class="flex items-center gap-8"
                    {
                        ul
                            class="hidden lg:flex font-medium flex-row space-x-8 rtl:space-x-reverse"
                        {
                            @for link in self.links.iter().cloned() {
                                li { (link.into_desktop_html()) }
                            }
                        }

                        a
                            href=(endpoints::LOG_OUT)
                            class="text-sm font-medium text-gray-900 hover:text-blue-700
                                dark:text-white dark:hover:text-blue-500"
                        {
                            "Log out"
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    ul
                        class="grid grid-cols-4 gap-2 px-4 py-3 rounded-xl border
                        border-gray-200 bg-white/95 shadow-lg backdrop-blur
                        dark:border-gray-700 dark:bg-gray-900/95"
                        aria-label="Primary"
                    {
                        @for link in self.links {
                            li class="min-w-0" { (link.into_mobile_html()) }
                        }
                    }
                }
            }
        )
    }
}
