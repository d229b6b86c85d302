//! HTTP client for the remote complaints API.
//!
//! The remote API owns validation and persistence. This module only moves
//! data in and out of it and never retries a failed request.

use std::{fmt, time::Duration};

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::complaint::{Complaint, ComplaintUpdate, Folio};

/// The API used when no other base URL is configured.
pub const DEFAULT_API_URL: &str = "https://api-quejas.onrender.com/api";

/// How long to wait for the remote API before giving up on a request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The ways a call to the remote API can fail.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GatewayError {
    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// The request could not be sent or the response could not be read,
    /// e.g. the connection was refused or timed out.
    #[error("could not reach the complaints API: {0}")]
    Transport(String),

    /// The API answered with a non-success status code.
    #[error("the complaints API responded with status {0}")]
    Status(StatusCode),

    /// The response body was not in the expected shape.
    #[error("could not decode the complaints API response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        GatewayError::Transport(error.to_string())
    }
}

/// The credentials an administrator types into the log-in form.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub usuario: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("usuario", &self.usuario)
            .field("password", &"********")
            .finish()
    }
}

/// The answer of the remote API to a log-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogInOutcome {
    Accepted,
    Rejected,
}

#[derive(Deserialize)]
struct LogInResponse {
    #[serde(default)]
    success: bool,
}

/// A client for the remote complaints API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`, e.g.
    /// "https://api-quejas.onrender.com/api".
    ///
    /// # Errors
    ///
    /// Returns [GatewayError::InvalidUrl] if `base_url` is not an absolute
    /// URL with a path, or [GatewayError::Transport] if the HTTP client cannot
    /// be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let parsed = Url::parse(base_url)
            .map_err(|error| GatewayError::InvalidUrl(format!("{base_url}: {error}")))?;

        if parsed.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_owned()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// The root URL of the remote API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Fetch every complaint.
    ///
    /// # Errors
    ///
    /// Fails if the API cannot be reached, answers with a non-success status,
    /// or sends a body that is not a list of complaints.
    pub async fn fetch_complaints(&self) -> Result<Vec<Complaint>, GatewayError> {
        let url = self.endpoint(&["quejas"])?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GatewayError::Status(response.status()));
        }

        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|error| GatewayError::Decode(error.to_string()))
    }

    /// Send the new status and description of the complaint `folio`.
    ///
    /// Any success status counts as accepted, whatever the body.
    pub async fn update_complaint(
        &self,
        folio: &Folio,
        update: &ComplaintUpdate,
    ) -> Result<(), GatewayError> {
        let url = self.endpoint(&["quejas", folio.as_str()])?;
        let response = self.client.put(url).json(update).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(GatewayError::Status(status)),
        }
    }

    /// Ask the API whether `credentials` belong to an administrator.
    ///
    /// A client error status (4xx) is a rejection. Server errors are
    /// reported as [GatewayError::Status] so they are not mistaken for wrong
    /// credentials.
    pub async fn log_in(&self, credentials: &Credentials) -> Result<LogInOutcome, GatewayError> {
        let url = self.endpoint(&["login"])?;
        let response = self.client.post(url).json(credentials).send().await?;
        let status = response.status();

        if status.is_client_error() {
            return Ok(LogInOutcome::Rejected);
        }

        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }

        let body = response.bytes().await?;
        let body: LogInResponse =
            serde_json::from_slice(&body).map_err(|error| GatewayError::Decode(error.to_string()))?;

        Ok(if body.success {
            LogInOutcome::Accepted
        } else {
            LogInOutcome::Rejected
        })
    }
}
