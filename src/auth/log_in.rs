//! The log-in page and the endpoint its form posts to.
//!
//! Credentials are checked by the remote API. A session cookie is only set
//! once the API has accepted them.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{invalidate_session_cookie, set_session_cookie},
        redirect::normalize_redirect_url,
        session::Session,
    },
    endpoints,
    gateway::{ApiClient, Credentials, LogInOutcome},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_layout, password_input,
    },
};

fn log_in_form(usuario: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#usuario, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            div
            {
                label for="usuario" class=(FORM_LABEL_STYLE) { "Usuario" }

                input
                    type="text"
                    name="usuario"
                    id="usuario"
                    value=(usuario)
                    autocomplete="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus;
            }

            (password_input(error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Iniciar sesión"
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let redirect_url = raw_url.and_then(normalize_redirect_url);

    if let (None, Some(raw_url)) = (&redirect_url, raw_url) {
        tracing::warn!("Invalid redirect URL from {source}: {raw_url}");
    }

    redirect_url
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_layout("Inicie sesión en su cuenta", &log_in_form);
    base("Iniciar sesión", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// The client that checks credentials against the remote API.
    pub gateway: ApiClient,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            gateway: state.gateway.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Credenciales incorrectas";
pub const CONNECTION_ERROR_MSG: &str =
    "No se pudo conectar con el servidor. Intente de nuevo más tarde.";

/// Handler for log-in requests via the POST method.
///
/// The credentials are forwarded to the remote API. If it accepts them, the
/// session cookie is set and the client is redirected to the complaints page
/// (or the page it originally asked for). Otherwise, the form is returned with
/// an error message explaining the problem and no cookie is set.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();
    let usuario = user_data.usuario.trim();

    let credentials = Credentials {
        usuario: usuario.to_owned(),
        password: user_data.password,
    };

    match state.gateway.log_in(&credentials).await {
        Ok(LogInOutcome::Accepted) => {}
        Ok(LogInOutcome::Rejected) => {
            tracing::info!("Log-in rejected for {usuario}");
            return log_in_form(usuario, Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url)
                .into_response();
        }
        Err(error) => {
            tracing::error!("Could not check credentials with the complaints API: {error}");
            return log_in_form(usuario, Some(CONNECTION_ERROR_MSG), redirect_url).into_response();
        }
    }

    let target = redirect_url.unwrap_or(endpoints::COMPLAINTS_VIEW);

    match set_session_cookie(jar.clone(), &Session::new(usuario, state.cookie_duration)) {
        Ok(jar) => (StatusCode::SEE_OTHER, HxRedirect(target.to_owned()), jar).into_response(),
        Err(error) => {
            tracing::error!("Could not set the session cookie for {usuario}: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_session_cookie(jar),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// The raw data entered by the administrator in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    pub usuario: String,

    /// Password entered during log-in. Checked by the remote API only.
    pub password: String,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}
