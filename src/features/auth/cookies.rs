//! Set-Cookie construction and Cookie header parsing for the auth cookies.

use std::time::Duration;

pub fn session_cookie(name: &str, value: &str, max_age: Duration, secure: bool) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name,
        value,
        max_age.as_secs(),
        if secure { "; Secure" } else { "" }
    )
}

pub fn expired_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", Duration::ZERO, secure)
}

/// Value of `name` in a `Cookie:` header
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}
