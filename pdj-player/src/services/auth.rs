//! Delegated authentication
//!
//! The player never implements an auth protocol. It builds the external
//! service's authorize redirect URL from configuration; the integrator
//! completes the redirect flow out-of-band and hands the resulting bearer
//! token back through the API.

use pdj_common::config::CatalogConfig;
use serde::{Deserialize, Serialize};

/// Bearer token for the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value for the Authorization header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// Build the authorize redirect URL (implicit-grant style: the service
/// redirects back with the token in the fragment).
pub fn authorize_url(config: &CatalogConfig) -> String {
    let mut url = format!("{}/authorize", config.accounts_base_url.trim_end_matches('/'));
    url.push_str(&format!(
        "?client_id={}&response_type=token&redirect_uri={}&scope={}",
        urlencode(&config.client_id),
        urlencode(&config.redirect_uri),
        urlencode(&config.scopes.join(" ")),
    ));
    url
}

/// Percent-encode a query component
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let token = AccessToken::new("abc123");
        assert_eq!(token.bearer(), "Bearer abc123");
    }

    #[test]
    fn test_authorize_url_contains_encoded_params() {
        let config = CatalogConfig {
            api_base_url: "https://api.example.com/v1".to_string(),
            accounts_base_url: "https://accounts.example.com".to_string(),
            client_id: "my-client".to_string(),
            redirect_uri: "http://127.0.0.1:5870/auth/callback".to_string(),
            scopes: vec!["playlist-modify-public".to_string(), "streaming".to_string()],
        };

        let url = authorize_url(&config);
        assert!(url.starts_with("https://accounts.example.com/authorize?"));
        assert!(url.contains("client_id=my-client"));
        assert!(url.contains("response_type=token"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A5870%2Fauth%2Fcallback"));
        assert!(url.contains("scope=playlist-modify-public%20streaming"));
    }

    #[test]
    fn test_urlencode_passes_unreserved() {
        assert_eq!(urlencode("abc-DEF_1.2~"), "abc-DEF_1.2~");
        assert_eq!(urlencode("a b"), "a%20b");
    }
}
