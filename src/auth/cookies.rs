use axum::http::{header, HeaderMap, HeaderValue};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

const FLAGS: &str = "HttpOnly; Secure; Path=/";

/// `Set-Cookie` value for a session cookie.
pub fn session_cookie(name: &str, value: &str) -> anyhow::Result<HeaderValue> {
    Ok(HeaderValue::from_str(&format!("{name}={value}; {FLAGS}"))?)
}

// Same flags as the session cookies, or browsers keep the originals.
const CLEAR_ACCESS: &str = "accessToken=; HttpOnly; Secure; Path=/; Max-Age=0";
const CLEAR_REFRESH: &str = "refreshToken=; HttpOnly; Secure; Path=/; Max-Age=0";

/// Both session cookies, ready to be appended to a response.
pub fn token_cookies(access: &str, refresh: &str) -> anyhow::Result<[(header::HeaderName, HeaderValue); 2]> {
    Ok([
        (header::SET_COOKIE, session_cookie(ACCESS_COOKIE, access)?),
        (header::SET_COOKIE, session_cookie(REFRESH_COOKIE, refresh)?),
    ])
}

pub fn cleared_cookies() -> [(header::HeaderName, HeaderValue); 2] {
    [
        (header::SET_COOKIE, HeaderValue::from_static(CLEAR_ACCESS)),
        (header::SET_COOKIE, HeaderValue::from_static(CLEAR_REFRESH)),
    ]
}

/// Reads a cookie from the request `Cookie` headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}
