//! Canned payloads for the backend and HOD endpoints.

use serde_json::{Value, json};

/// Page the flow runs on in tests.
pub const PAGE_URL: &str = "https://app.example.com/find/sso";
/// Application root matching [`PAGE_URL`].
pub const APPLICATION_ROOT: &str = "/find";
/// Backend list-applications endpoint for [`APPLICATION_ROOT`].
pub const LIST_REQUEST_URL: &str = "https://app.example.com/find/api/list-application-request";
/// Backend combined-request endpoint for [`APPLICATION_ROOT`], without query.
pub const COMBINED_REQUEST_URL: &str = "https://app.example.com/find/api/combined-request";
/// Backend combined-patch-request endpoint for [`APPLICATION_ROOT`], without query.
pub const COMBINED_PATCH_REQUEST_URL: &str =
    "https://app.example.com/find/api/combined-patch-request";
/// HOD combined-token resource; `GET` lists applications, `POST` issues a token.
pub const HOD_COMBINED_URL: &str = "https://api.havenondemand.com/2/authenticate/combined";

/// Signed request descriptor as the backend returns it.
#[must_use]
pub fn signed_request(url: &str, verb: &str, token: &str, body: Option<&str>) -> Value {
    json!({
        "url": url,
        "verb": verb,
        "token": token,
        "body": body,
    })
}

/// List-applications response with one application and one user store.
#[must_use]
pub fn list_applications_response() -> Value {
    json!([{
        "domain": "d",
        "name": "app",
        "description": "",
        "domainDescription": "",
        "users": [{
            "domain": "ud",
            "userStore": "us",
            "domainDescription": "",
            "accounts": ["acc1"]
        }]
    }])
}

/// List-applications response whose only application has no users.
#[must_use]
pub fn list_applications_without_users() -> Value {
    json!([{
        "domain": "d",
        "name": "app",
        "description": "",
        "domainDescription": "",
        "users": []
    }])
}

/// HOD body reporting a missing SSO session.
#[must_use]
pub fn no_session_error() -> Value {
    json!({"error": 12102, "reason": "No user token"})
}

/// Combined-token response carrying `token`.
#[must_use]
pub fn combined_token_response(token: Value) -> Value {
    json!({"token": token})
}
