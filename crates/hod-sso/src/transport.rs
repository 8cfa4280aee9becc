//! Seams between the flow and its environment.
//!
//! # Design
//! - The flow only sees plain request/response values; cookie handling belongs
//!   to the transport.
//! - Navigation is fire-and-forget: once `assign` is called the flow stops.

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;
use crate::model::HttpMethod;

/// Outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Extra headers, in the order they should be set.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<String>,
    /// Whether cross-origin cookies should be attached.
    pub with_credentials: bool,
}

impl HttpRequest {
    /// `GET` request without headers or body.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            with_credentials: false,
        }
    }

    /// Value of the first header named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body text.
    pub body: String,
}

/// Sends HTTP requests on behalf of the flow.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait HttpTransport: Send + Sync {
    /// Send one request and wait for the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response was received.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Access to the page location.
pub trait Navigator: Send + Sync {
    /// URL of the current page, if it has one.
    fn current_url(&self) -> Option<Url>;

    /// Navigate the page away; nothing else happens in this page afterwards.
    fn assign(&self, target: &Url);
}
