//! Reads and writes the session cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::session::Session};

pub(crate) const COOKIE_SESSION: &str = "session";

/// The default duration for which session cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// Add the session cookie to the cookie jar, indicating that an administrator
/// is logged in. The cookie expires with the session.
///
/// # Errors
///
/// Returns [Error::JSONSerializationError] if the session cannot be serialized.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    session: &Session,
) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(session)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_SESSION, value))
            .expires(session.expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the expiry of the session in `jar` to the latest of UTC now plus
/// `duration` and the session's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::CookieMissing] if there is no session cookie.
/// - [Error::InvalidSession] if the session cannot be read or extending it would overflow.
pub(crate) fn extend_session_cookie(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let session = get_session_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidSession("expiry out of range".to_owned()))?;

    let session = Session {
        expires_at: max(session.expires_at, new_expiry),
        ..session
    };

    set_session_cookie(jar, &session)
}

pub(crate) fn get_session_from_cookies(jar: &PrivateCookieJar) -> Result<Session, Error> {
    let cookie = jar.get(COOKIE_SESSION).ok_or(Error::CookieMissing)?;

    serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidSession(error.to_string()))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{Error, auth::session::Session};

    use super::{
        COOKIE_SESSION, extend_session_cookie, get_session_from_cookies,
        invalidate_session_cookie, set_session_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[test]
    fn set_cookie_succeeds() {
        let session = Session::new("admin", Duration::minutes(5));

        let jar = set_session_cookie(get_jar(), &session).unwrap();

        let cookie = jar.get(COOKIE_SESSION).unwrap();
        assert_date_time_close(cookie.expires_datetime().unwrap(), session.expires_at);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(get_session_from_cookies(&jar), Ok(session));
    }

    #[test]
    fn get_session_fails_without_cookie() {
        assert_eq!(get_session_from_cookies(&get_jar()), Err(Error::CookieMissing));
    }

    #[test]
    fn get_session_fails_with_garbage() {
        let jar = get_jar().add(Cookie::new(COOKIE_SESSION, "not json"));

        assert!(matches!(
            get_session_from_cookies(&jar),
            Err(Error::InvalidSession(_))
        ));
    }

    #[test]
    fn extend_pushes_expiry_forward() {
        let session = Session::new("admin", Duration::seconds(5));
        let jar = set_session_cookie(get_jar(), &session).unwrap();

        let jar = extend_session_cookie(jar, Duration::minutes(30)).unwrap();

        let session = get_session_from_cookies(&jar).unwrap();
        assert_date_time_close(
            session.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(30),
        );
        assert_date_time_close(
            jar.get(COOKIE_SESSION).unwrap().expires_datetime().unwrap(),
            session.expires_at,
        );
    }

    #[test]
    fn extend_never_shortens_expiry() {
        let session = Session::new("admin", Duration::days(1));
        let jar = set_session_cookie(get_jar(), &session).unwrap();

        let jar = extend_session_cookie(jar, Duration::minutes(5)).unwrap();

        assert_eq!(
            get_session_from_cookies(&jar).unwrap().expires_at,
            session.expires_at
        );
    }

    #[test]
    fn extend_fails_without_cookie() {
        let result = extend_session_cookie(get_jar(), Duration::minutes(5));

        assert_eq!(result.map(|_| ()), Err(Error::CookieMissing));
    }

    #[test]
    fn invalidate_cookie_expires_it() {
        let session = Session::new("admin", Duration::minutes(5));
        let jar = set_session_cookie(get_jar(), &session).unwrap();

        let jar = invalidate_session_cookie(jar);

        let cookie = jar.get(COOKIE_SESSION).unwrap();
        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
