//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use room_core::{extract_token, SessionToken};

use crate::state::AppState;

/// Session token from the waiting room cookie.
///
/// `None` for absent and malformed cookies alike.
#[derive(Debug, Clone)]
pub struct SessionCookie(pub Option<SessionToken>);

impl SessionCookie {
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        // Browsers may split cookies across several headers over HTTP/2
        let token = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| extract_token(Some(value), cookie_name));

        SessionCookie(token)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionCookie {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, &state.room().cookie_name))
    }
}
