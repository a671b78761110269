//! Cookie helpers and session fixtures.

use axum::http::header::SET_COOKIE;
use axum_test::{TestResponse, TestServer};
use room_core::{limits::DEFAULT_COOKIE_NAME, SessionToken};

/// `Cookie` header value carrying a session token.
pub fn cookie(token: &str) -> String {
    format!("{}={}", DEFAULT_COOKIE_NAME, token)
}

/// The waiting room `Set-Cookie` directive on a response, if any.
pub fn set_cookie(response: &TestResponse) -> Option<String> {
    let prefix = format!("{}=", DEFAULT_COOKIE_NAME);
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(str::to_string)
}

/// Session token set by a response. Panics if none was set.
pub fn session_token(response: &TestResponse) -> String {
    let directive = set_cookie(response).expect("Response should set the session cookie");
    let (pair, _) = directive.split_once(';').unwrap_or((directive.as_str(), ""));
    let (_, token) = pair.split_once('=').expect("Cookie should be name=value");
    token.to_string()
}

/// `Max-Age` of the session cookie, in seconds.
pub fn cookie_max_age(response: &TestResponse) -> u64 {
    let directive = set_cookie(response).expect("Response should set the session cookie");
    directive
        .split(';')
        .filter_map(|attr| attr.trim().strip_prefix("Max-Age="))
        .next()
        .and_then(|v| v.parse().ok())
        .expect("Cookie should carry Max-Age")
}

/// Parsed token, for direct store assertions.
pub fn parse_token(raw: &str) -> SessionToken {
    SessionToken::parse(raw).expect("Token should be well formed")
}

/// Sends `n` fresh visitors to `/` and returns their tokens.
pub async fn admit_visitors(server: &TestServer, n: usize) -> Vec<String> {
    let mut tokens = Vec::with_capacity(n);
    for _ in 0..n {
        let response = server.get("/").await;
        response.assert_status_ok();
        tokens.push(session_token(&response));
    }
    tokens
}
