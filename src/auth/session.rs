//! The administrator session stored in the private session cookie.

use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::auth::cookie::get_session_from_cookies;

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] in a fixed-width format.
    //!
    //! The default serializer for [time::OffsetDateTime] writes
    //! "00:00:00.000000" as "0:00:00.0", which the parser then rejects
    //! because it expects two-digit hours.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Who is logged in and until when.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub usuario: String,

    #[serde(with = "datetime_format")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// A session for `usuario` that expires `duration` from now.
    pub fn new(usuario: &str, duration: Duration) -> Self {
        Self {
            usuario: usuario.to_owned(),
            expires_at: OffsetDateTime::now_utc() + duration,
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Whether a request may see the admin views.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Authorized(Session),
    Unauthorized,
}

impl AccessDecision {
    /// Decide from the session cookie in `jar`.
    ///
    /// A missing, tampered or expired session is unauthorized.
    pub fn from_jar(jar: &PrivateCookieJar, now: OffsetDateTime) -> Self {
        match get_session_from_cookies(jar) {
            Ok(session) if !session.is_expired(now) => AccessDecision::Authorized(session),
            Ok(session) => {
                tracing::debug!("Session for {} expired at {}", session.usuario, session.expires_at);
                AccessDecision::Unauthorized
            }
            Err(error) => {
                tracing::debug!("No valid session: {error}");
                AccessDecision::Unauthorized
            }
        }
    }
}
