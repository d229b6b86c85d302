//! Log-out route handler that invalidates the session cookie and redirects to the log-in page.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::cookie::invalidate_session_cookie, endpoints};

/// Invalidate the session cookie and redirect the client to the log-in page.
///
/// This always succeeds, whether or not there was a session to end.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_session_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
