//! WooCommerce REST API HTTP client
//!
//! Uses synchronous HTTP (ureq) so it can be driven from a plain
//! background thread without an async runtime.

use base64::prelude::*;
use log::debug;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{ApiError, ApiResponse, OrdersApi};
use crate::config::StoreCredentials;

/// HTTP client for a single WooCommerce store
///
/// Authenticates with HTTP Basic auth built from the consumer key and
/// secret. TLS certificate verification stays enabled.
pub struct WooCommerceClient {
    agent: ureq::Agent,
    api_root: String,
    auth_header: String,
}

impl WooCommerceClient {
    /// Timeout applied to every request unless overridden
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new client for the given store
    ///
    /// # Arguments
    /// * `credentials` - Store URL, consumer key/secret and API namespace
    /// * `timeout` - Upper bound on a whole request/response round trip
    pub fn new(credentials: &StoreCredentials, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_root: api_root(&credentials.base_url, &credentials.api_version),
            auth_header: basic_auth(&credentials.consumer_key, &credentials.consumer_secret),
        }
    }

    /// Build the full request URL for a resource and its query parameters
    pub fn resource_url(&self, resource: &str, query: &[(String, String)]) -> Result<Url, ApiError> {
        let url = format!("{}/{}", self.api_root, resource.trim_start_matches('/'));
        Ok(Url::parse_with_params(&url, query)?)
    }
}

impl OrdersApi for WooCommerceClient {
    fn get(&self, resource: &str, query: &[(String, String)]) -> Result<ApiResponse, ApiError> {
        let url = self.resource_url(resource, query)?;
        debug!("GET {}", url);

        let mut response = self
            .agent
            .get(url.as_str())
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()?;

        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;

        Ok(ApiResponse::new(status, decode_body(status, &text)?))
    }
}

/// `{base_url}/wp-json/{api_version}` without duplicate slashes
fn api_root(base_url: &str, api_version: &str) -> String {
    format!(
        "{}/wp-json/{}",
        base_url.trim_end_matches('/'),
        api_version.trim_matches('/')
    )
}

fn basic_auth(consumer_key: &str, consumer_secret: &str) -> String {
    let token = BASE64_STANDARD.encode(format!("{}:{}", consumer_key, consumer_secret));
    format!("Basic {}", token)
}

/// Decode a response body
///
/// Empty bodies decode to `None`. A success response whose body is not
/// JSON is a decode error; an error response with a non-JSON body (an HTML
/// error page, say) just has no body.
fn decode_body(status: u16, text: &str) -> Result<Option<Value>, ApiError> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(text) {
        Ok(value) => Ok(Some(value)),
        Err(_) if !(200..300).contains(&status) => Ok(None),
        Err(source) => Err(ApiError::Decode { status, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> WooCommerceClient {
        let creds = StoreCredentials::new(base_url, "ck_key", "cs_secret");
        WooCommerceClient::new(&creds, WooCommerceClient::DEFAULT_TIMEOUT)
    }

    #[test]
    fn test_api_root_trims_slashes() {
        assert_eq!(
            api_root("https://shop.example.com/", "/wc/v3/"),
            "https://shop.example.com/wp-json/wc/v3"
        );
    }

    #[test]
    fn test_resource_url_with_query() {
        let query = vec![
            ("per_page".to_string(), "100".to_string()),
            ("modified_after".to_string(), "2024-05-01T10:00:00+00:00".to_string()),
        ];
        let url = client("https://shop.example.com")
            .resource_url("orders", &query)
            .unwrap();

        assert_eq!(url.path(), "/wp-json/wc/v3/orders");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, query);
    }

    #[test]
    fn test_resource_url_invalid_base() {
        let result = client("not a url").resource_url("orders", &[]);
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_basic_auth_header() {
        // base64("ck_key:cs_secret")
        assert_eq!(basic_auth("ck_key", "cs_secret"), "Basic Y2tfa2V5OmNzX3NlY3JldA==");
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(200, "").unwrap(), None);
        assert_eq!(decode_body(200, "[]").unwrap(), Some(json!([])));
        assert_eq!(
            decode_body(200, r#"[{"id":1}]"#).unwrap(),
            Some(json!([{ "id": 1 }]))
        );
    }

    #[test]
    fn test_decode_body_malformed() {
        assert!(matches!(
            decode_body(200, "<html>oops</html>"),
            Err(ApiError::Decode { status: 200, .. })
        ));
        // Error pages are not a decode failure
        assert_eq!(decode_body(502, "<html>Bad Gateway</html>").unwrap(), None);
    }
}
