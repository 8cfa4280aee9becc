//! Options for the authenticate and logout operations.
//!
//! # Design
//! - Field names follow the camelCase JSON the page configuration blob uses.
//! - Unset options stay `None`; accessors apply the documented defaults.
//! - `validate` reports the first unusable option as a structured [`ConfigError`].

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::model::SignedRequest;

/// HOD domain used when none is configured.
pub const DEFAULT_HOD_DOMAIN: &str = "havenondemand.com";
/// Backend path returning the signed list-applications request.
pub const DEFAULT_LIST_APPLICATION_REQUEST_API: &str = "/api/list-application-request";
/// Backend path returning the signed combined-token request.
pub const DEFAULT_COMBINED_REQUEST_API: &str = "/api/combined-request";
/// Backend path returning the signed combined-token patch request.
pub const DEFAULT_COMBINED_PATCH_REQUEST_API: &str = "/api/combined-patch-request";
/// Path of the combined-token resource on the HOD API endpoint.
pub const COMBINED_TOKEN_PATH: &str = "/2/authenticate/combined";

/// Error kind reported when an SSO round trip finished without a usable session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundTripPolicy {
    /// Report `NO_USER_TOKEN`.
    #[default]
    NoUserToken,
    /// Report `CROSS_DOMAIN_COOKIES`, for providers that drop the session cookie
    /// when third-party cookies are blocked.
    CrossDomainCookies,
}

/// Options for [`crate::authenticate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateOptions {
    /// Root of the application backend, prepended to every backend API path.
    pub application_root: String,
    /// HOD domain; defaults to [`DEFAULT_HOD_DOMAIN`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hod_domain: Option<String>,
    /// SSO page URL; overrides the one derived from the HOD domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_page: Option<String>,
    /// Pre-fetched list-applications request; skips the first backend call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_application_request: Option<SignedRequest>,
    /// Backend path for the list-applications request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_application_request_api: Option<String>,
    /// Backend path for the combined-token request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_request_api: Option<String>,
    /// Backend path for the combined-token patch request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_patch_request_api: Option<String>,
    /// Error kind for a completed round trip that still has no session.
    #[serde(default)]
    pub round_trip_policy: RoundTripPolicy,
}

impl AuthenticateOptions {
    /// Options with defaults for everything but the application root.
    #[must_use]
    pub fn new(application_root: impl Into<String>) -> Self {
        Self {
            application_root: application_root.into(),
            ..Self::default()
        }
    }

    /// Configured HOD domain or the default.
    #[must_use]
    pub fn hod_domain(&self) -> &str {
        self.hod_domain.as_deref().unwrap_or(DEFAULT_HOD_DOMAIN)
    }

    /// SSO page the browser is sent to when HOD reports no session.
    #[must_use]
    pub fn sso_page(&self) -> String {
        self.sso_page
            .clone()
            .unwrap_or_else(|| format!("https://dev.{}/sso.html", self.hod_domain()))
    }

    /// Backend URL returning the signed list-applications request.
    #[must_use]
    pub fn list_application_request_url(&self) -> String {
        self.backend_url(
            self.list_application_request_api
                .as_deref()
                .unwrap_or(DEFAULT_LIST_APPLICATION_REQUEST_API),
        )
    }

    /// Backend URL (without query) returning the signed combined-token request.
    #[must_use]
    pub fn combined_request_url(&self) -> String {
        self.backend_url(
            self.combined_request_api
                .as_deref()
                .unwrap_or(DEFAULT_COMBINED_REQUEST_API),
        )
    }

    /// Backend URL (without query) returning the signed combined-token patch request.
    #[must_use]
    pub fn combined_patch_request_url(&self) -> String {
        self.backend_url(
            self.combined_patch_request_api
                .as_deref()
                .unwrap_or(DEFAULT_COMBINED_PATCH_REQUEST_API),
        )
    }

    /// Check the options before a flow starts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a blank application root or HOD domain, or an
    /// SSO page that is not an absolute URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_root.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "applicationRoot",
            });
        }
        if let Some(domain) = &self.hod_domain {
            require_non_blank("hodDomain", domain)?;
        }
        if let Some(page) = &self.sso_page {
            require_absolute_url("ssoPage", page)?;
        }
        Ok(())
    }

    fn backend_url(&self, api: &str) -> String {
        format!("{}{}", self.application_root.trim_end_matches('/'), api)
    }
}

/// Options for [`crate::logout`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutOptions {
    /// Combined token to invalidate.
    pub combined_token: String,
    /// HOD domain; defaults to [`DEFAULT_HOD_DOMAIN`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hod_domain: Option<String>,
    /// HOD API endpoint; defaults to `https://api.{hodDomain}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hod_endpoint: Option<String>,
    /// Full logout URL; defaults to `{hodEndpoint}/2/authenticate/combined`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_url: Option<String>,
}

impl LogoutOptions {
    /// Options with defaults for everything but the token.
    #[must_use]
    pub fn new(combined_token: impl Into<String>) -> Self {
        Self {
            combined_token: combined_token.into(),
            ..Self::default()
        }
    }

    /// Configured HOD domain or the default.
    #[must_use]
    pub fn hod_domain(&self) -> &str {
        self.hod_domain.as_deref().unwrap_or(DEFAULT_HOD_DOMAIN)
    }

    /// Configured HOD endpoint or the one derived from the domain.
    #[must_use]
    pub fn hod_endpoint(&self) -> String {
        self.hod_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://api.{}", self.hod_domain()))
    }

    /// Most specific logout URL: explicit URL, then endpoint, then domain.
    #[must_use]
    pub fn logout_url(&self) -> String {
        self.logout_url.clone().unwrap_or_else(|| {
            format!(
                "{}{COMBINED_TOKEN_PATH}",
                self.hod_endpoint().trim_end_matches('/')
            )
        })
    }

    /// Check the options before logging out.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a blank token or domain, or an endpoint/logout
    /// URL that is not absolute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.combined_token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "combinedToken",
            });
        }
        if let Some(domain) = &self.hod_domain {
            require_non_blank("hodDomain", domain)?;
        }
        if let Some(endpoint) = &self.hod_endpoint {
            require_absolute_url("hodEndpoint", endpoint)?;
        }
        if let Some(url) = &self.logout_url {
            require_absolute_url("logoutUrl", url)?;
        }
        Ok(())
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field,
            value: value.to_string(),
            reason: "must not be blank",
        });
    }
    Ok(())
}

fn require_absolute_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if url.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidField {
            field,
            value: value.to_string(),
            reason: "must be an absolute URL",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authenticate_defaults_follow_hod_domain() {
        let options = AuthenticateOptions::new("/app/");
        assert_eq!(options.hod_domain(), "havenondemand.com");
        assert_eq!(options.sso_page(), "https://dev.havenondemand.com/sso.html");
        assert_eq!(
            options.list_application_request_url(),
            "/app/api/list-application-request"
        );
        assert_eq!(options.combined_request_url(), "/app/api/combined-request");
        assert_eq!(
            options.combined_patch_request_url(),
            "/app/api/combined-patch-request"
        );
        assert_eq!(options.round_trip_policy, RoundTripPolicy::NoUserToken);

        let custom = AuthenticateOptions {
            hod_domain: Some("example.org".into()),
            ..AuthenticateOptions::new("/app")
        };
        assert_eq!(custom.sso_page(), "https://dev.example.org/sso.html");
    }

    #[test]
    fn authenticate_options_parse_page_config() {
        let options: AuthenticateOptions = serde_json::from_value(json!({
            "applicationRoot": "/find",
            "ssoPage": "https://sso.example.com/sso.html",
            "listApplicationRequest": {
                "url": "https://api.example.com/2/authenticate/combined",
                "verb": "GET",
                "token": "sig"
            },
            "combinedRequestApi": "/custom/combined",
            "roundTripPolicy": "crossDomainCookies"
        }))
        .expect("options");
        assert_eq!(options.sso_page(), "https://sso.example.com/sso.html");
        assert!(options.list_application_request.is_some());
        assert_eq!(options.combined_request_url(), "/find/custom/combined");
        assert_eq!(
            options.round_trip_policy,
            RoundTripPolicy::CrossDomainCookies
        );
        assert!(options.validate().is_ok());
    }

    #[test]
    fn authenticate_validation_reports_field() {
        assert_eq!(
            AuthenticateOptions::new("  ").validate(),
            Err(ConfigError::MissingField {
                field: "applicationRoot"
            })
        );
        let relative_sso = AuthenticateOptions {
            sso_page: Some("/sso.html".into()),
            ..AuthenticateOptions::new("/app")
        };
        assert!(matches!(
            relative_sso.validate(),
            Err(ConfigError::InvalidField {
                field: "ssoPage",
                ..
            })
        ));
        let blank_domain = AuthenticateOptions {
            hod_domain: Some(String::new()),
            ..AuthenticateOptions::new("/app")
        };
        assert!(matches!(
            blank_domain.validate(),
            Err(ConfigError::InvalidField {
                field: "hodDomain",
                ..
            })
        ));
    }

    #[test]
    fn logout_url_prefers_most_specific_option() {
        let by_domain = LogoutOptions {
            hod_domain: Some("example.org".into()),
            ..LogoutOptions::new("token")
        };
        assert_eq!(
            by_domain.logout_url(),
            "https://api.example.org/2/authenticate/combined"
        );

        let by_endpoint = LogoutOptions {
            hod_endpoint: Some("https://int.example.org/".into()),
            ..by_domain.clone()
        };
        assert_eq!(
            by_endpoint.logout_url(),
            "https://int.example.org/2/authenticate/combined"
        );

        let explicit = LogoutOptions {
            logout_url: Some("https://logout.example.org/bye".into()),
            ..by_endpoint
        };
        assert_eq!(explicit.logout_url(), "https://logout.example.org/bye");

        assert_eq!(
            LogoutOptions::new("token").logout_url(),
            "https://api.havenondemand.com/2/authenticate/combined"
        );
    }

    #[test]
    fn logout_validation_requires_token() {
        assert_eq!(
            LogoutOptions::new("").validate(),
            Err(ConfigError::MissingField {
                field: "combinedToken"
            })
        );
        let bad_endpoint = LogoutOptions {
            hod_endpoint: Some("api.example.org".into()),
            ..LogoutOptions::new("token")
        };
        assert!(matches!(
            bad_endpoint.validate(),
            Err(ConfigError::InvalidField {
                field: "hodEndpoint",
                ..
            })
        ));
        assert!(LogoutOptions::new("token").validate().is_ok());
    }
}
