//! Middleware that only lets requests with a live session through, sliding
//! the session forward on every request it lets through.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState,
    auth::{
        cookie::extend_session_cookie,
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
        session::AccessDecision,
    },
    endpoints,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How far each authorized request pushes the session expiry forward.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How a rejected request is sent to the log-in page.
#[derive(Debug, Clone, Copy)]
enum LogInRedirect {
    /// A 303 redirect for full page loads.
    Browser,
    /// An `HX-Redirect` header, since htmx swaps would otherwise render the
    /// log-in page inside the current one.
    Htmx,
}

impl LogInRedirect {
    fn to(self, url: &str) -> Response {
        match self {
            LogInRedirect::Browser => Redirect::to(url).into_response(),
            LogInRedirect::Htmx => (HxRedirect(url.to_owned()), StatusCode::OK).into_response(),
        }
    }
}

/// Where the log-in page should send the user once they are back in.
fn log_in_url_for(request: &Request) -> String {
    if let Some(url) = build_log_in_redirect_url(request) {
        return url;
    }

    if request.uri().path().starts_with("/api") {
        tracing::warn!("htmx request to {} had no usable HX-Current-URL", request.uri());
    } else {
        tracing::warn!("Could not build a redirect URL from {}", request.uri());
    }

    build_log_in_redirect_url_from_target(endpoints::COMPLAINTS_VIEW)
        .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
}

/// Copy the `Set-Cookie` headers of the slid session onto `response`.
fn attach_session(response: Response, jar: PrivateCookieJar, duration: Duration) -> Response {
    let jar = extend_session_cookie(jar.clone(), duration)
        .inspect_err(|error| tracing::error!("Could not extend session: {error}"))
        .unwrap_or(jar);

    let cookies = jar.into_response();
    let (mut parts, body) = response.into_parts();

    for value in cookies.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.clone());
    }

    Response::from_parts(parts, body)
}

async fn guard(state: AuthState, request: Request, next: Next, reject: LogInRedirect) -> Response {
    let log_in_url = log_in_url_for(&request);

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read the cookie jar: {error:?}");
            return reject.to(&log_in_url);
        }
    };

    match AccessDecision::from_jar(&jar, OffsetDateTime::now_utc()) {
        AccessDecision::Unauthorized => reject.to(&log_in_url),
        AccessDecision::Authorized(_) => {
            let response = next.run(Request::from_parts(parts, body)).await;
            attach_session(response, jar, state.cookie_duration)
        }
    }
}

/// Let the request through if it carries a live session, otherwise redirect
/// to the log-in page with a `redirect_url` back to the requested page.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key` for decrypting and verifying the cookie contents.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, LogInRedirect::Browser).await
}

/// Same as [auth_guard] but for routes called by htmx, which are redirected
/// with `HX-Redirect` back to the page the user was looking at.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, LogInRedirect::Htmx).await
}
