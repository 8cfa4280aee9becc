//! # Design
//!
//! - One immutable [`SsoError`] ends a failed flow; its [`SsoErrorKind`] is the
//!   taxonomy page glue branches on.
//! - Messages stay constant; status, payload, and provider error text live in fields.
//! - Transport and configuration failures get their own enums so the flow can
//!   fold them into the taxonomy at the step where they happen.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result alias for flow operations.
pub type SsoResult<T> = Result<T, SsoError>;

/// Classification of a failed flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsoErrorKind {
    /// The application backend answered with a non-200 status.
    Application,
    /// HOD answered with a non-200 status that did not warrant a redirect.
    Hod,
    /// The SSO page reported an explicit failure on the redirect URL.
    Sso,
    /// The SSO round trip completed but HOD still saw no session.
    NoUserToken,
    /// The SSO round trip completed but the session cookie never reached HOD,
    /// which points at blocked third-party cookies.
    CrossDomainCookies,
    /// The user is signed in but has no application/user store to use.
    NoUsersAuthorised,
}

impl SsoErrorKind {
    /// Stable upper-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Application => "APPLICATION",
            Self::Hod => "HOD",
            Self::Sso => "SSO",
            Self::NoUserToken => "NO_USER_TOKEN",
            Self::CrossDomainCookies => "CROSS_DOMAIN_COOKIES",
            Self::NoUsersAuthorised => "NO_USERS_AUTHORISED",
        }
    }

    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Application,
        Self::Hod,
        Self::Sso,
        Self::NoUserToken,
        Self::CrossDomainCookies,
        Self::NoUsersAuthorised,
    ];
}

impl Display for SsoErrorKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Terminal error of the combined-token flow.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("single sign-on failed ({kind})")]
pub struct SsoError {
    /// Classification.
    pub kind: SsoErrorKind,
    /// HTTP status of the failed response, when one was received.
    pub status: Option<u16>,
    /// Parsed JSON body of the failed response, when it had one.
    pub body: Option<Value>,
    /// Error text the SSO page put on the redirect URL.
    pub sso_error: Option<String>,
}

impl SsoError {
    /// Error without response details.
    #[must_use]
    pub const fn new(kind: SsoErrorKind) -> Self {
        Self {
            kind,
            status: None,
            body: None,
            sso_error: None,
        }
    }

    /// Error built from a failed HTTP response; a JSON `null` body is dropped.
    #[must_use]
    pub fn from_response(kind: SsoErrorKind, status: u16, body: Value) -> Self {
        Self {
            kind,
            status: Some(status),
            body: (!body.is_null()).then_some(body),
            sso_error: None,
        }
    }

    /// Error reported by the SSO page itself.
    #[must_use]
    pub fn from_sso_page(message: impl Into<String>) -> Self {
        Self {
            sso_error: Some(message.into()),
            ..Self::new(SsoErrorKind::Sso)
        }
    }

    /// Numeric `error` code in the response body, if HOD sent one.
    #[must_use]
    pub fn hod_error_code(&self) -> Option<i64> {
        self.body
            .as_ref()
            .and_then(|body| body.get("error"))
            .and_then(Value::as_i64)
    }

    /// Status code page glue should surface for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if let Some(status) = self.status.filter(|status| *status >= 400) {
            return status;
        }
        match self.kind {
            SsoErrorKind::Sso | SsoErrorKind::NoUserToken | SsoErrorKind::CrossDomainCookies => 401,
            SsoErrorKind::NoUsersAuthorised => 403,
            SsoErrorKind::Application | SsoErrorKind::Hod => 502,
        }
    }
}

/// Network-level failure before any HTTP status was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be built from the descriptor.
    #[error("invalid request")]
    InvalidRequest {
        /// Field that could not be used.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// Request could not be sent or the response could not be read.
    #[error("request failed")]
    Request {
        /// URL of the request.
        url: String,
        /// Underlying client error text.
        detail: String,
    },
}

/// Option validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Required option was missing or blank.
    #[error("missing configuration field")]
    MissingField {
        /// Name of the option.
        field: &'static str,
    },
    /// Option had an unusable value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Name of the option.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_identifiers_match_serde_names() {
        for kind in SsoErrorKind::ALL {
            let encoded = serde_json::to_value(kind).expect("serialize kind");
            assert_eq!(encoded, json!(kind.as_str()));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn from_response_drops_null_bodies() {
        let error = SsoError::from_response(SsoErrorKind::Hod, 500, Value::Null);
        assert_eq!(error.status, Some(500));
        assert!(error.body.is_none());
        assert!(error.hod_error_code().is_none());
    }

    #[test]
    fn hod_error_code_reads_numeric_error_field() {
        let error = SsoError::from_response(SsoErrorKind::Hod, 401, json!({"error": 12102}));
        assert_eq!(error.hod_error_code(), Some(12_102));
        let textual = SsoError::from_response(SsoErrorKind::Hod, 401, json!({"error": "12102"}));
        assert!(textual.hod_error_code().is_none());
    }

    #[test]
    fn status_code_prefers_response_status() {
        let backend = SsoError::from_response(SsoErrorKind::Application, 500, Value::Null);
        assert_eq!(backend.status_code(), 500);
        assert_eq!(SsoError::new(SsoErrorKind::NoUserToken).status_code(), 401);
        assert_eq!(SsoError::new(SsoErrorKind::NoUsersAuthorised).status_code(), 403);
        assert_eq!(SsoError::new(SsoErrorKind::Hod).status_code(), 502);
        let odd_success = SsoError::from_response(SsoErrorKind::Hod, 200, json!([]));
        assert_eq!(odd_success.status_code(), 502);
    }

    #[test]
    fn sso_page_errors_keep_the_message() {
        let error = SsoError::from_sso_page("access_denied");
        assert_eq!(error.kind, SsoErrorKind::Sso);
        assert_eq!(error.sso_error.as_deref(), Some("access_denied"));
        assert_eq!(error.to_string(), "single sign-on failed (SSO)");
    }
}
