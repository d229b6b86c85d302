//! The navigation bar shown at the top of every logged-in page, and along the
//! bottom of the screen on small devices.

use maud::{Markup, html};

use crate::endpoints;

#[derive(Clone, Copy)]
struct NavLink {
    url: &'static str,
    title: &'static str,
}

const NAV_LINKS: [NavLink; 3] = [
    NavLink {
        url: endpoints::COMPLAINTS_VIEW,
        title: "Quejas",
    },
    NavLink {
        url: endpoints::REPORT_VIEW,
        title: "Reporte",
    },
    NavLink {
        url: endpoints::LOG_OUT,
        title: "Cerrar sesión",
    },
];

const DESKTOP_CURRENT_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";
const DESKTOP_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 dark:text-white \
    lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 dark:hover:text-white \
    lg:dark:hover:bg-transparent";
const BOTTOM_CURRENT_STYLE: &str = "flex w-full min-w-0 items-center justify-center \
    rounded-lg bg-blue-50 px-2.5 py-2 text-xs font-semibold text-blue-700 shadow-sm \
    sm:text-sm dark:bg-blue-900/30 dark:text-blue-200";
const BOTTOM_STYLE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2.5 py-2 text-xs font-semibold text-gray-600 sm:text-sm hover:bg-blue-50/70 \
    hover:text-blue-700 dark:text-gray-300 dark:hover:bg-blue-900/20 dark:hover:text-blue-200";

/// The navigation bar with the link for the current page highlighted.
pub struct NavBar<'a> {
    active_endpoint: &'a str,
}

impl NavBar<'_> {
    /// Highlight the link whose URL is `active_endpoint`, if any.
    ///
    /// Log out is never highlighted.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        NavBar { active_endpoint }
    }

    fn is_current(&self, link: &NavLink) -> bool {
        link.url != endpoints::LOG_OUT && link.url == self.active_endpoint
    }

    fn link_html(&self, link: &NavLink, current_style: &str, style: &str) -> Markup {
        let is_current = self.is_current(link);

        html! {
            a
                href=(link.url)
                class=(if is_current { current_style } else { style })
                aria-current=[is_current.then_some("page")]
            {
                (link.title)
            }
        }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html! {
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::COMPLAINTS_VIEW) class="flex items-center space-x-3"
                    {
                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Buzón de Quejas"
                        }
                    }

                    ul class="hidden lg:flex font-medium lg:space-x-8"
                    {
                        @for link in &NAV_LINKS {
                            li { (self.link_html(link, DESKTOP_CURRENT_STYLE, DESKTOP_STYLE)) }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                ul
                    class="mx-4 mb-4 grid grid-cols-3 gap-2 px-4 py-3 rounded-xl border
                    border-gray-200 bg-white/95 shadow-lg dark:border-gray-700 dark:bg-gray-900/95"
                    aria-label="Principal"
                {
                    @for link in &NAV_LINKS {
                        li class="min-w-0" { (self.link_html(link, BOTTOM_CURRENT_STYLE, BOTTOM_STYLE)) }
                    }
                }
            }
        }
    }
}
