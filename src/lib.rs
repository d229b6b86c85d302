//! Buzón de Quejas is the administration console for a citizen complaint
//! service.
//!
//! This library provides a web server that directly serves HTML pages. The
//! complaints themselves live in a remote API; the server keeps a refreshed
//! copy in memory to filter, chart and export them.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod chart;
mod complaint;
mod endpoints;
mod error_page;
mod gateway;
mod html;
mod logging;
mod navigation;
mod refresh;
mod report;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use complaint::{ComplaintStore, Draft, EditWorkflow, SharedStore, TransitionError};
pub use gateway::{ApiClient, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT, GatewayError};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use refresh::{DEFAULT_REFRESH_INTERVAL, RefreshScheduler};
pub use routing::build_router;

use crate::{alert::Alert, error_page::ErrorPage};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The session cookie is missing from the cookie jar in the request.
    #[error("no session cookie in the cookie jar")]
    CookieMissing,

    /// The session cookie could not be decoded or has expired.
    #[error("the session is invalid: {0}")]
    InvalidSession(String),

    /// A call to the remote complaints API failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The edit workflow was asked to make a transition that its current
    /// state does not allow.
    #[error(transparent)]
    EditWorkflow(#[from] TransitionError),

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a complaint that is not loaded.
    #[error("tried to update complaint {0}, which is not loaded")]
    UpdateMissingComplaint(String),

    /// A date typed into the report window form could not be parsed.
    #[error("invalid date \"{0}\"")]
    InvalidDate(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the lock on the complaint store.
    #[error("could not acquire the complaint store lock")]
    StoreLockError,

    /// The PDF report could not be produced.
    #[error("could not render the PDF report: {0}")]
    PdfError(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => ErrorPage::not_found().into_response(),
            Error::InvalidTimezoneError(timezone) => ErrorPage::internal_with(
                "Zona horaria inválida",
                &format!(
                    "No se pudo obtener la zona horaria \"{timezone}\". Revise la \
                    configuración del servidor y use un nombre canónico de zona horaria."
                ),
            )
            .into_response(),
            Error::Gateway(error) => {
                tracing::error!("Could not reach the complaints API: {error}");
                ErrorPage::internal_with(
                    "No se pudo contactar al servidor de quejas.",
                    "Revise su conexión e intente de nuevo.",
                )
                .into_response()
            }
            Error::StoreLockError => ErrorPage::internal().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::internal().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => Alert::error(
                "Zona horaria inválida",
                &format!(
                    "No se pudo obtener la zona horaria \"{timezone}\". Revise la \
                    configuración del servidor."
                ),
            )
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
            Error::UpdateMissingComplaint(folio) => Alert::error(
                "No se pudo actualizar la queja",
                &format!("No se encontró la queja con folio {folio}."),
            )
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::InvalidDate(text) => Alert::error(
                "Fecha inválida",
                &format!("\"{text}\" no es una fecha válida. Use el formato aaaa-mm-dd."),
            )
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::Gateway(error) => Alert::error(
                "Error de conexión con el servidor",
                &error.to_string(),
            )
            .into_response_with_status(StatusCode::BAD_GATEWAY),
            Error::EditWorkflow(error) => Alert::error(
                "No se pudo guardar la queja",
                &error.to_string(),
            )
            .into_response_with_status(StatusCode::CONFLICT),
            Error::PdfError(_) => Alert::error(
                "No se pudo generar el reporte",
                "Ocurrió un error al generar el PDF. Revise los registros del servidor.",
            )
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
            Error::StoreLockError => Alert::ErrorSimple {
                message: "No se pudieron leer las quejas, intente de nuevo.".to_owned(),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Alert::error(
                "Algo salió mal",
                "Ocurrió un error inesperado, revise los registros del servidor.",
            )
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
