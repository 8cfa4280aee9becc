//! In-memory stand-ins for the network and the page location.
//!
//! # Design
//! - Routes match on method plus URL prefix, so tests can ignore query strings
//!   and then assert on the recorded requests instead.
//! - Unmatched requests answer `404` with an empty body, like an unknown route.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use hod_sso::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, Navigator, TransportError};
use serde_json::Value;
use url::Url;

enum Reply {
    Response(HttpResponse),
    Unreachable,
}

struct Route {
    method: HttpMethod,
    url_prefix: String,
    reply: Reply,
}

/// [`HttpTransport`] answering from a fixed script and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    /// Transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests to `url_prefix` with `status` and a JSON body.
    #[must_use]
    pub fn respond(self, method: HttpMethod, url_prefix: &str, status: u16, body: &Value) -> Self {
        self.respond_text(method, url_prefix, status, &body.to_string())
    }

    /// Answer requests to `url_prefix` with `status` and a raw body.
    #[must_use]
    pub fn respond_text(self, method: HttpMethod, url_prefix: &str, status: u16, body: &str) -> Self {
        self.push(
            method,
            url_prefix,
            Reply::Response(HttpResponse {
                status,
                body: body.to_string(),
            }),
        )
    }

    /// Fail requests to `url_prefix` before any response arrives.
    #[must_use]
    pub fn unreachable(self, method: HttpMethod, url_prefix: &str) -> Self {
        self.push(method, url_prefix, Reply::Unreachable)
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Requests whose URL starts with `url_prefix`.
    #[must_use]
    pub fn requests_to(&self, url_prefix: &str) -> Vec<HttpRequest> {
        lock(&self.requests)
            .iter()
            .filter(|request| request.url.starts_with(url_prefix))
            .cloned()
            .collect()
    }

    fn push(self, method: HttpMethod, url_prefix: &str, reply: Reply) -> Self {
        lock(&self.routes).push(Route {
            method,
            url_prefix: url_prefix.to_string(),
            reply,
        });
        self
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request.clone());
        let routes = lock(&self.routes);
        let route = routes
            .iter()
            .filter(|route| route.method == request.method)
            .filter(|route| request.url.starts_with(&route.url_prefix))
            .max_by_key(|route| route.url_prefix.len());

        match route.map(|route| &route.reply) {
            Some(Reply::Response(response)) => Ok(response.clone()),
            Some(Reply::Unreachable) => Err(TransportError::Request {
                url: request.url,
                detail: "connection refused".to_string(),
            }),
            None => Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// [`Navigator`] with a fixed location that records navigation requests.
pub struct RecordingNavigator {
    current: Option<Url>,
    assigned: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    /// Navigator showing `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not an absolute URL.
    pub fn at(url: &str) -> Result<Self> {
        Ok(Self {
            current: Some(Url::parse(url)?),
            assigned: Mutex::new(Vec::new()),
        })
    }

    /// Navigator without a page URL.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            current: None,
            assigned: Mutex::new(Vec::new()),
        }
    }

    /// URLs the flow navigated to, in order.
    #[must_use]
    pub fn assignments(&self) -> Vec<Url> {
        lock(&self.assigned).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_url(&self) -> Option<Url> {
        self.current.clone()
    }

    fn assign(&self, target: &Url) {
        lock(&self.assigned).push(target.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
