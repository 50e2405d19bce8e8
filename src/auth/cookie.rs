use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Name of the session cookie read by the session layer.
pub const TOKEN_COOKIE: &str = "token";

/// HttpOnly, strict same-site session cookie living one day.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::days(1))
        .build()
}

/// Expired twin of the session cookie; sending it clears the browser copy.
pub fn cleared_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::ZERO)
        .build()
}
