//! Browser transport and navigator for `wasm32` builds.

use async_trait::async_trait;
use gloo_net::http::{Method, Request};
use url::Url;
use web_sys::RequestCredentials;

use crate::error::TransportError;
use crate::model::HttpMethod;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Navigator};

/// [`HttpTransport`] using the page's `fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTransport;

const fn to_gloo_method(method: HttpMethod) -> Method {
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

#[async_trait(?Send)]
impl HttpTransport for BrowserTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut outbound = Request::new(&request.url).method(to_gloo_method(request.method));
        if request.with_credentials {
            outbound = outbound.credentials(RequestCredentials::Include);
        }
        for (name, value) in &request.headers {
            outbound = outbound.header(name, value);
        }
        if let Some(body) = request.body {
            outbound = outbound.body(body);
        }

        let response = outbound
            .send()
            .await
            .map_err(|err| TransportError::Request {
                url: request.url.clone(),
                detail: err.to_string(),
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|err| TransportError::Request {
            url: request.url.clone(),
            detail: err.to_string(),
        })?;
        Ok(HttpResponse { status, body })
    }
}

/// [`Navigator`] over `window.location`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn current_url(&self) -> Option<Url> {
        web_sys::window()
            .and_then(|window| window.location().href().ok())
            .and_then(|href| Url::parse(&href).ok())
    }

    fn assign(&self, target: &Url) {
        if let Some(window) = web_sys::window()
            && let Err(err) = window.location().set_href(target.as_str())
        {
            tracing::warn!(error = ?err, "failed to navigate to SSO page");
        }
    }
}
