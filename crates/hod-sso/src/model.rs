//! Data carried through the combined-token flow.
//!
//! # Design
//! - Wire shapes mirror the JSON the backend and HOD emit (camelCase fields).
//! - Selection results are plain data; the flow owns every decision about them.

use std::fmt::{self, Display, Formatter};

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::query::QueryParameters;

/// HTTP verbs a signed request descriptor may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Canonical upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Pre-authorised description of one HTTP call to HOD, produced by the
/// application backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    /// Absolute URL including any query string.
    pub url: String,
    /// HTTP method to use.
    pub verb: HttpMethod,
    /// HMAC signature sent in the `token` header.
    pub token: String,
    /// Form-encoded body, if the request has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl SignedRequest {
    /// Body to send; an empty string counts as no body.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref().filter(|body| !body.is_empty())
    }
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SignedRequest")
            .field("url", &self.url)
            .field("verb", &self.verb)
            .field("token", &"<redacted>")
            .field("body", &self.body.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// User session credential HOD hands back on the page URL after an SSO round trip.
#[derive(Clone, PartialEq, Eq)]
pub struct UserToken {
    /// Token type.
    pub kind: String,
    /// Token identifier.
    pub id: String,
    /// Token secret.
    pub secret: String,
}

impl UserToken {
    /// Query parameter carrying the token type.
    pub const TYPE_PARAM: &'static str = "type";
    /// Query parameter carrying the token identifier.
    pub const ID_PARAM: &'static str = "id";
    /// Query parameter carrying the token secret.
    pub const SECRET_PARAM: &'static str = "secret";

    /// Read the token from page query parameters; all three parts must be present.
    #[must_use]
    pub fn from_query(parameters: &QueryParameters) -> Option<Self> {
        let part = |name: &str| {
            parameters
                .first(name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            kind: part(Self::TYPE_PARAM)?,
            id: part(Self::ID_PARAM)?,
            secret: part(Self::SECRET_PARAM)?,
        })
    }

    /// Value for the `user_token` request header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}:{}:{}", self.kind, self.id, self.secret)
    }
}

impl fmt::Debug for UserToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UserToken")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Application the combined token is issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Application name.
    pub name: String,
    /// Domain owning the application.
    pub domain: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Description of the owning domain.
    #[serde(default)]
    pub domain_description: String,
}

/// User store the authenticated user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStore {
    /// User store name.
    pub name: String,
    /// Domain owning the user store.
    pub domain: String,
    /// Description of the owning domain.
    #[serde(default)]
    pub domain_description: String,
}

/// Account record passed through untouched from HOD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(pub Value);

/// Entry of the list-applications response; its `users` list is read separately.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEntry {
    /// Application name.
    pub name: String,
    /// Domain owning the application.
    pub domain: String,
    /// Free-text description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Description of the owning domain.
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain_description: String,
}

/// User store membership inside an [`ApplicationEntry`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    /// Domain owning the user store.
    pub domain: String,
    /// User store name.
    pub user_store: String,
    /// Description of the owning domain.
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain_description: String,
    /// Accounts linked to the user.
    #[serde(default, deserialize_with = "null_as_default")]
    pub accounts: Vec<Account>,
}

/// Application, user store, and accounts chosen from the list-applications response.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Selected application.
    pub application: Application,
    /// Selected user store.
    pub user_store: UserStore,
    /// Accounts of the selected user.
    pub accounts: Vec<Account>,
}

impl Selection {
    /// Take the first application of a list-applications payload and its first
    /// user store.
    ///
    /// Only `payload[0]` and its `users[0]` are decoded; later entries are
    /// never looked at. Returns `Ok(None)` when nothing is authorised, which
    /// includes an empty list and a null or missing `users`.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the payload is not a list or the selected
    /// entries are malformed.
    pub fn from_listing(payload: &Value) -> Result<Option<Self>, serde_json::Error> {
        let entries = payload.as_array().ok_or_else(|| {
            <serde_json::Error as de::Error>::custom("expected a list of applications")
        })?;
        let Some(first) = entries.first() else {
            return Ok(None);
        };
        let entry = ApplicationEntry::deserialize(first)?;
        let user = match first.get("users") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(users)) => match users.first() {
                Some(user) => UserEntry::deserialize(user)?,
                None => return Ok(None),
            },
            Some(_) => return Err(de::Error::custom("expected a list of users")),
        };

        Ok(Some(Self {
            application: Application {
                name: entry.name,
                domain: entry.domain,
                description: entry.description,
                domain_description: entry.domain_description,
            },
            user_store: UserStore {
                name: user.user_store,
                domain: user.domain,
                domain_description: user.domain_description,
            },
            accounts: user.accounts,
        }))
    }

    /// Query parameters for the combined-request endpoint.
    #[must_use]
    pub fn combined_request_parameters(&self) -> QueryParameters {
        QueryParameters::new()
            .with("domain", self.application.domain.as_str())
            .with("application", self.application.name.as_str())
            .with("user-store-domain", self.user_store.domain.as_str())
            .with("user-store-name", self.user_store.name.as_str())
    }
}

/// Combined token fields, forwarded verbatim to the origin server.
///
/// Fields keep the order HOD sent them in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CombinedToken(Vec<(String, String)>);

impl CombinedToken {
    /// Build a token from a JSON object. Non-string values keep their JSON text.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(
            object
                .iter()
                .map(|(name, field)| {
                    let text = match field {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    (name.clone(), text)
                })
                .collect(),
        )
    }

    /// Look up one field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over the token fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the token has no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: String, value: String) {
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((name, value)),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for CombinedToken
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut token = Self::default();
        for (name, value) in iter {
            token.insert(name.into(), value.into());
        }
        token
    }
}

impl Serialize for CombinedToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for CombinedToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| de::Error::custom("combined token must be a JSON object"))
    }
}

impl fmt::Debug for CombinedToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_set()
            .entries(self.0.iter().map(|(name, _)| name))
            .finish()
    }
}

/// Successful result of the flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateOutput {
    /// Application the token was issued for.
    pub application: Application,
    /// User store of the authenticated user.
    pub user_store: UserStore,
    /// Accounts linked to the user.
    pub accounts: Vec<Account>,
    /// The combined token.
    pub combined_token: CombinedToken,
}

impl AuthenticateOutput {
    pub(crate) fn new(selection: Selection, combined_token: CombinedToken) -> Self {
        Self {
            application: selection.application,
            user_store: selection.user_store,
            accounts: selection.accounts,
            combined_token,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
