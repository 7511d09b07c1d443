//! Session cookies written by sign-in, refresh and logout, and read back by
//! the session resolver.

use axum::http::{header, HeaderMap, HeaderName};
use axum::response::AppendHeaders;
use cookie::{time::Duration, Cookie, SameSite};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
/// Readable by client script so the UI can tell whether a session exists.
pub const LOGGED_IN_COOKIE: &str = "logged_in";

pub type SetCookies = AppendHeaders<Vec<(HeaderName, String)>>;

/// Cookie lifetimes and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookies {
    access_max_age: i64,
    refresh_max_age: i64,
    secure: bool,
}

impl SessionCookies {
    /// Max-ages are given in minutes.
    pub fn new(access_max_age_minutes: i64, refresh_max_age_minutes: i64, secure: bool) -> Self {
        Self {
            access_max_age: access_max_age_minutes * 60,
            refresh_max_age: refresh_max_age_minutes * 60,
            secure,
        }
    }

    pub fn access_max_age_secs(&self) -> i64 {
        self.access_max_age
    }

    pub fn refresh_max_age_secs(&self) -> i64 {
        self.refresh_max_age
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// All three cookies after a successful sign-in.
    pub fn sign_in(&self, access_token: &str, refresh_token: &str) -> SetCookies {
        set_cookie_headers([
            self.build(ACCESS_COOKIE, access_token, true, self.access_max_age),
            self.build(REFRESH_COOKIE, refresh_token, true, self.refresh_max_age),
            self.build(LOGGED_IN_COOKIE, "true", false, self.access_max_age),
        ])
    }

    /// Renewed access cookie after a refresh; the refresh cookie is untouched.
    pub fn refreshed(&self, access_token: &str) -> SetCookies {
        set_cookie_headers([
            self.build(ACCESS_COOKIE, access_token, true, self.access_max_age),
            self.build(LOGGED_IN_COOKIE, "true", false, self.access_max_age),
        ])
    }

    /// Expires every session cookie immediately.
    pub fn cleared(&self) -> SetCookies {
        set_cookie_headers([
            self.build(ACCESS_COOKIE, "", true, -1),
            self.build(REFRESH_COOKIE, "", true, -1),
            self.build(LOGGED_IN_COOKIE, "", false, -1),
        ])
    }

    fn build(
        &self,
        name: &'static str,
        value: &str,
        http_only: bool,
        max_age: i64,
    ) -> Cookie<'static> {
        Cookie::build((name, value.to_string()))
            .path("/")
            .http_only(http_only)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(max_age))
            .build()
    }
}

fn set_cookie_headers<const N: usize>(cookies: [Cookie<'static>; N]) -> SetCookies {
    AppendHeaders(
        cookies
            .into_iter()
            .map(|c| (header::SET_COOKIE, c.to_string()))
            .collect(),
    )
}

/// Value of the named cookie from the request's `Cookie` headers.
pub fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = value.to_str() else {
            continue;
        };

        for cookie_str in cookie_header.split(';') {
            if let Ok(cookie) = Cookie::parse(cookie_str.trim()) {
                if cookie.name() == cookie_name && !cookie.value().is_empty() {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }

    None
}
