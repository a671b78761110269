//! Session identity.
//!
//! A session token is an opaque, unguessable identifier carried in a cookie.
//! It has no embedded meaning: the shared store decides whether it is active,
//! queued, or unknown.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::limits::{TOKEN_LEN, TOKEN_PATTERN};

/// Compiled token regex (lazy initialization).
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("invalid token pattern"));

/// Opaque session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Issue a fresh token.
    ///
    /// Backed by UUID v4 (122 random bits from the OS entropy source).
    /// `uuid` panics if the entropy source fails, which is the fatal case.
    pub fn issue() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse a raw cookie value.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != TOKEN_LEN || !TOKEN_REGEX.is_match(raw) {
            return Err(Error::MalformedToken);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

/// Extract the session token from a `Cookie` header.
///
/// Returns `None` when the cookie is absent or malformed. A malformed token
/// is indistinguishable from no token: the caller starts a fresh admission.
/// With duplicate cookies of the same name, the first well-formed one wins.
pub fn extract_token(cookie_header: Option<&str>, cookie_name: &str) -> Option<SessionToken> {
    let header = cookie_header?;

    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == cookie_name)
        .find_map(|(_, value)| SessionToken::parse(value.trim().trim_matches('"')).ok())
}

/// Render the `Set-Cookie` directive that stores or refreshes a session token.
///
/// `max_age` mirrors the TTL of whichever structure the token now lives in.
pub fn session_cookie(cookie_name: &str, token: &SessionToken, max_age: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        cookie_name,
        token,
        max_age.as_secs()
    )
}
