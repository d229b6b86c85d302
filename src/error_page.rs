//! Full-page error screens for requests that cannot be answered with a
//! regular page, e.g. unknown routes or a misconfigured server.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{endpoints, html::base};

/// An error page with a big status code, what went wrong and what to do about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPage {
    status: StatusCode,
    title: &'static str,
    description: String,
    fix: String,
}

impl ErrorPage {
    /// The page for a route or complaint that does not exist.
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            title: "No encontrado",
            description: "No encontramos lo que buscaba.".to_owned(),
            fix: "Revise la dirección o vuelva al listado de quejas.".to_owned(),
        }
    }

    /// A generic server-side failure.
    pub fn internal() -> Self {
        Self::internal_with(
            "Lo sentimos, algo salió mal.",
            "Intente más tarde o revise los registros del servidor.",
        )
    }

    /// A server-side failure with a specific explanation.
    pub fn internal_with(description: &str, fix: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            title: "Error interno",
            description: description.to_owned(),
            fix: fix.to_owned(),
        }
    }

    fn markup(&self) -> Markup {
        // Template adapted from https://flowbite.com/blocks/marketing/404/
        let content = html! {
            section class="bg-white dark:bg-gray-900"
            {
                div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
                {
                    div class="mx-auto max-w-screen-sm text-center"
                    {
                        h1
                            class="mb-4 text-7xl lg:text-9xl tracking-tight font-extrabold
                                text-blue-600 dark:text-blue-500"
                        {
                            (self.status.as_u16())
                        }

                        p class="mb-4 text-3xl md:text-4xl font-bold text-gray-900 dark:text-white"
                        {
                            (self.description)
                        }

                        p class="mb-4 text-xl md:text-2xl text-gray-900 dark:text-white"
                        {
                            (self.fix)
                        }

                        a
                            href=(endpoints::COMPLAINTS_VIEW)
                            class="inline-flex my-4 px-5 py-2.5 rounded text-sm font-medium
                                text-white bg-blue-600 hover:bg-blue-800"
                        {
                            "Volver a las quejas"
                        }
                    }
                }
            }
        };

        base(self.title, &[], &content)
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (self.status, Html(self.markup().into_string())).into_response()
    }
}

/// Fallback for routes that do not exist.
pub async fn get_404_not_found() -> Response {
    ErrorPage::not_found().into_response()
}

/// The page htmx requests are redirected to when they fail unexpectedly.
pub async fn get_internal_server_error_page() -> Response {
    ErrorPage::internal().into_response()
}
