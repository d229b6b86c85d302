//! Alert messages for success and error feedback.
//!
//! Alerts are rendered as fragments that htmx swaps into the page's
//! `#alert-container`, or inline when a page needs to show a persistent
//! error such as a failed refresh.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

pub enum Alert {
    Success { message: String, details: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

const SUCCESS_STYLE: &str =
    "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 dark:bg-gray-800 dark:text-green-400";
const ERROR_STYLE: &str =
    "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400";

impl Alert {
    pub fn success(message: &str, details: &str) -> Self {
        Alert::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn error(message: &str, details: &str) -> Self {
        Alert::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, None),
        };

        html! {
            div class=(style) role="alert"
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        span class="font-medium" { (message) }

                        @if let Some(details) = details.filter(|details| !details.is_empty()) {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Cerrar"
                        class="font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }

    /// Render the alert with `status`.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, self.into_html()).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let markup = Alert::error("No se pudo guardar", "Intente de nuevo").into_html();
        let html = Html::parse_fragment(&markup.into_string());

        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("alert missing");
        let text = alert.text().collect::<String>();

        assert!(text.contains("No se pudo guardar"));
        assert!(text.contains("Intente de nuevo"));
    }

    #[test]
    fn success_alert_is_green() {
        let markup = Alert::success("Estatus actualizado", "Q-001").into_html();
        let html = Html::parse_fragment(&markup.into_string());

        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("alert missing");

        assert!(alert.value().attr("class").unwrap().contains("text-green-800"));
        assert!(alert.text().collect::<String>().contains("Estatus actualizado"));
    }

    #[test]
    fn simple_alert_has_no_details_paragraph() {
        let markup = Alert::ErrorSimple {
            message: "Falló".to_owned(),
        }
        .into_html();
        let html = Html::parse_fragment(&markup.into_string());

        assert_eq!(html.select(&Selector::parse("p").unwrap()).count(), 0);
    }

    #[test]
    fn alert_response_defaults_to_server_error() {
        let response = Alert::ErrorSimple {
            message: "Falló".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
