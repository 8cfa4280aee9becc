//! Native transport built on `reqwest`.
//!
//! The client keeps a cookie jar for its whole lifetime, which stands in for the
//! browser sending the SSO session cookie with credentialed requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::error::TransportError;
use crate::model::HttpMethod;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`HttpTransport`] backed by a cookie-keeping `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with a cookie store and the given timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Request {
                url: String::new(),
                detail: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { client })
    }

    /// Wrap an existing client; cookie handling is whatever it was built with.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT).unwrap_or_else(|err| {
            tracing::warn!(
                error = %err,
                "HTTP client without cookie store or timeout; SSO session cookies will not be replayed"
            );
            Self::from_client(Client::new())
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            with_credentials: _,
        } = request;

        let mut builder = self.client.request(to_reqwest_method(method), url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::Request {
                url: url.clone(),
                detail: err.to_string(),
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Request {
                url: url.clone(),
                detail: err.to_string(),
            })?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn send_returns_status_and_body() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/2/authenticate/combined").header("token", "t");
            then.status(204);
        });

        let transport = ReqwestTransport::default();
        let response = transport
            .send(HttpRequest {
                method: HttpMethod::Delete,
                url: server.url("/2/authenticate/combined"),
                headers: vec![("token".into(), "t".into())],
                body: None,
                with_credentials: true,
            })
            .await
            .expect("request should complete");

        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
        mock.assert();
    }

    #[tokio::test]
    async fn cookies_set_by_a_response_are_replayed() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(GET).path("/login");
            then.status(200).header("set-cookie", "session=abc; Path=/");
        });
        let account = server.mock(|when, then| {
            when.method(GET).path("/account").header("cookie", "session=abc");
            then.status(200).body("{}");
        });

        let transport = ReqwestTransport::default();
        transport
            .send(HttpRequest::get(server.url("/login")))
            .await
            .expect("login should complete");
        let response = transport
            .send(HttpRequest::get(server.url("/account")))
            .await
            .expect("account request should complete");

        assert_eq!(response.status, 200);
        login.assert();
        account.assert();
    }

    #[tokio::test]
    async fn invalid_url_is_a_transport_error() {
        let transport = ReqwestTransport::default();
        let error = transport
            .send(HttpRequest::get("not a url"))
            .await
            .expect_err("relative URL cannot be sent");
        assert!(matches!(error, TransportError::Request { .. }));
    }
}
