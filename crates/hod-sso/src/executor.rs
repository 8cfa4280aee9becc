//! Signed request execution against HOD and descriptor fetches from the backend.
//!
//! # Design
//! - Both callers share one issue/parse/classify path; they differ only in the
//!   headers they attach and the error kind a non-200 maps to.
//! - A body that is not JSON becomes `null` rather than an error.
//! - A transport failure keeps the caller's error kind with no status.

use serde_json::Value;

use crate::error::{SsoError, SsoErrorKind, SsoResult};
use crate::model::{SignedRequest, UserToken};
use crate::transport::{HttpRequest, HttpTransport};

/// Header carrying the descriptor's signature.
pub const TOKEN_HEADER: &str = "token";
/// Header carrying the user session token recovered from the page URL.
pub const USER_TOKEN_HEADER: &str = "user_token";
/// Content type sent with descriptor bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Replays signed request descriptors against HOD.
#[derive(Clone, Copy)]
pub struct SignedRequestExecutor<'a> {
    transport: &'a dyn HttpTransport,
}

impl<'a> SignedRequestExecutor<'a> {
    /// Executor sending through `transport`.
    #[must_use]
    pub const fn new(transport: &'a dyn HttpTransport) -> Self {
        Self { transport }
    }

    /// Execute `request` once, with cookies and the optional user token attached.
    ///
    /// # Errors
    ///
    /// Returns an [`SsoError`] of `kind` carrying the status and parsed body for
    /// any non-200 response, or without a status when nothing was received.
    pub async fn execute(
        &self,
        request: &SignedRequest,
        user_token: Option<&UserToken>,
        kind: SsoErrorKind,
    ) -> SsoResult<Value> {
        let mut headers = vec![(TOKEN_HEADER.to_string(), request.token.clone())];
        if let Some(user_token) = user_token {
            headers.push((USER_TOKEN_HEADER.to_string(), user_token.header_value()));
        }
        let body = request.body().map(str::to_string);
        if body.is_some() {
            headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
        }

        let outbound = HttpRequest {
            method: request.verb,
            url: request.url.clone(),
            headers,
            body,
            with_credentials: true,
        };
        dispatch(self.transport, outbound, kind).await
    }
}

/// Fetches signed request descriptors from the application backend.
#[derive(Clone, Copy)]
pub struct BackendRequestFetcher<'a> {
    transport: &'a dyn HttpTransport,
}

impl<'a> BackendRequestFetcher<'a> {
    /// Fetcher sending through `transport`.
    #[must_use]
    pub const fn new(transport: &'a dyn HttpTransport) -> Self {
        Self { transport }
    }

    /// `GET` a backend URL and return its JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an `APPLICATION` [`SsoError`] for a non-200 response or a
    /// transport failure.
    pub async fn fetch(&self, url: &str) -> SsoResult<Value> {
        dispatch(self.transport, HttpRequest::get(url), SsoErrorKind::Application).await
    }

    /// `GET` a backend URL and decode the payload as a [`SignedRequest`].
    ///
    /// # Errors
    ///
    /// As [`BackendRequestFetcher::fetch`], plus an `APPLICATION` error carrying
    /// status 200 when the payload is not a descriptor.
    pub async fn fetch_signed_request(&self, url: &str) -> SsoResult<SignedRequest> {
        let payload = self.fetch(url).await?;
        serde_json::from_value(payload.clone()).map_err(|err| {
            tracing::warn!(url, error = %err, "backend returned an invalid signed request");
            SsoError::from_response(SsoErrorKind::Application, 200, payload)
        })
    }
}

async fn dispatch(
    transport: &dyn HttpTransport,
    request: HttpRequest,
    kind: SsoErrorKind,
) -> SsoResult<Value> {
    let method = request.method;
    let url = request.url.clone();
    tracing::debug!(%method, url = %url, "sending request");

    let response = transport.send(request).await.map_err(|err| {
        tracing::warn!(%method, url = %url, error = %err, "request did not complete");
        SsoError::new(kind)
    })?;

    let payload = serde_json::from_str::<Value>(&response.body).unwrap_or(Value::Null);
    if response.status == 200 {
        Ok(payload)
    } else {
        tracing::debug!(%method, url = %url, status = response.status, %kind, "request rejected");
        Err(SsoError::from_response(kind, response.status, payload))
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::http::ReqwestTransport;
    use crate::model::HttpMethod;
    use httpmock::prelude::*;
    use serde_json::json;

    fn signed(server: &MockServer, verb: HttpMethod, body: Option<&str>) -> SignedRequest {
        SignedRequest {
            url: server.url("/2/application"),
            verb,
            token: "signature".into(),
            body: body.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn execute_sends_signing_and_user_tokens() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/2/application")
                .header(TOKEN_HEADER, "signature")
                .header(USER_TOKEN_HEADER, "UNB:id:secret");
            then.status(200).json_body(json!([{"name": "app"}]));
        });

        let transport = ReqwestTransport::default();
        let executor = SignedRequestExecutor::new(&transport);
        let token = UserToken {
            kind: "UNB".into(),
            id: "id".into(),
            secret: "secret".into(),
        };
        let payload = executor
            .execute(
                &signed(&server, HttpMethod::Get, None),
                Some(&token),
                SsoErrorKind::Hod,
            )
            .await
            .expect("signed request should succeed");

        assert_eq!(payload, json!([{"name": "app"}]));
        mock.assert();
    }

    #[tokio::test]
    async fn execute_posts_form_body() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/2/application")
                .header("content-type", FORM_CONTENT_TYPE)
                .body("domain=d&application=a");
            then.status(200).json_body(json!({"token": {"a": "1"}}));
        });

        let transport = ReqwestTransport::default();
        let executor = SignedRequestExecutor::new(&transport);
        executor
            .execute(
                &signed(&server, HttpMethod::Post, Some("domain=d&application=a")),
                None,
                SsoErrorKind::Hod,
            )
            .await
            .expect("signed post should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn execute_classifies_non_200_with_given_kind() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/2/application");
            then.status(401).json_body(json!({"error": 12102}));
        });

        let transport = ReqwestTransport::default();
        let executor = SignedRequestExecutor::new(&transport);
        let error = executor
            .execute(&signed(&server, HttpMethod::Get, None), None, SsoErrorKind::Hod)
            .await
            .expect_err("401 should fail");

        assert_eq!(error.kind, SsoErrorKind::Hod);
        assert_eq!(error.status, Some(401));
        assert_eq!(error.hod_error_code(), Some(12_102));
    }

    #[tokio::test]
    async fn non_json_success_body_yields_null_payload() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/2/application");
            then.status(200).body("<html>ok</html>");
        });

        let transport = ReqwestTransport::default();
        let executor = SignedRequestExecutor::new(&transport);
        let payload = executor
            .execute(&signed(&server, HttpMethod::Get, None), None, SsoErrorKind::Hod)
            .await
            .expect("200 is success regardless of body");
        assert!(payload.is_null());
    }

    #[tokio::test]
    async fn fetcher_classifies_failures_as_application() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/list-application-request");
            then.status(500).body("boom");
        });

        let transport = ReqwestTransport::default();
        let fetcher = BackendRequestFetcher::new(&transport);
        let error = fetcher
            .fetch_signed_request(&server.url("/api/list-application-request"))
            .await
            .expect_err("500 should fail");

        assert_eq!(error.kind, SsoErrorKind::Application);
        assert_eq!(error.status, Some(500));
        assert!(error.body.is_none());
    }

    #[tokio::test]
    async fn fetcher_rejects_payloads_that_are_not_descriptors() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/combined-request");
            then.status(200).json_body(json!({"unexpected": true}));
        });

        let transport = ReqwestTransport::default();
        let fetcher = BackendRequestFetcher::new(&transport);
        let error = fetcher
            .fetch_signed_request(&server.url("/api/combined-request"))
            .await
            .expect_err("payload is not a descriptor");

        assert_eq!(error.kind, SsoErrorKind::Application);
        assert_eq!(error.status, Some(200));
        assert_eq!(error.body, Some(json!({"unexpected": true})));
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_application_error_without_status() {
        let transport = ReqwestTransport::default();
        let fetcher = BackendRequestFetcher::new(&transport);
        let error = fetcher
            .fetch("http://127.0.0.1:9/api/list-application-request")
            .await
            .expect_err("nothing listens on the discard port");

        assert_eq!(error.kind, SsoErrorKind::Application);
        assert!(error.status.is_none());
    }
}
