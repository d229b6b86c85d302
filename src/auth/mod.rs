//! Administrator sessions: log-in, log-out and the guard for the admin views.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod session;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};

#[cfg(test)]
pub use middleware::AuthState;
