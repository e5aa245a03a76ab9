//! Authorization header construction.
//!
//! The admin API accepts `Authorization: Bearer <token>` and the older
//! `Authorization: Token <token>`. The scheme is chosen once, in [`crate::Settings`],
//! and every request built by [`crate::ApiClient`] uses it.

use serde::{Deserialize, Serialize};

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    #[default]
    Bearer,
    Token,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "bearer",
            AuthScheme::Token => "token",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::Token => "Token",
        }
    }

    /// The `Authorization` header for `token`, or `None` when there is no
    /// usable token so public reads go out unauthenticated.
    pub fn header(&self, token: Option<&str>) -> Option<(String, String)> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;
        Some((AUTHORIZATION.to_string(), format!("{} {token}", self.prefix())))
    }
}
