//! Query-string parsing and building.
//!
//! # Design
//! - Repeated keys always accumulate; single-value callers read [`QueryParameters::first`].
//! - Keys keep first-seen order and values keep arrival order so `build` is stable.
//! - Percent sequences that do not decode to UTF-8 are kept literally.

use std::fmt::{self, Display, Formatter};

/// Ordered multi-value view of a URL query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParameters {
    /// Create an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a query string, with or without its leading `?`.
    #[must_use]
    pub fn parse(search: &str) -> Self {
        let trimmed = search.strip_prefix('?').unwrap_or(search);
        let mut parameters = Self::new();
        for segment in trimmed.split('&').filter(|segment| !segment.is_empty()) {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            parameters.append(decode_component(key), decode_component(value));
        }
        parameters
    }

    /// Encode the parameters as `key=value` pairs joined by `&`.
    #[must_use]
    pub fn build(&self) -> String {
        self.entries
            .iter()
            .flat_map(|(key, values)| {
                let key = urlencoding::encode(key);
                values
                    .iter()
                    .map(move |value| format!("{key}={}", urlencoding::encode(value)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append a value, keeping any values already recorded for the key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replace every value of `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Builder-style [`QueryParameters::append`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// All values recorded for `key`, in arrival order.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, values)| values.as_slice())
    }

    /// First value recorded for `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Whether `key` appeared at least once.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of distinct keys.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate keys with their values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

impl Display for QueryParameters {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.build())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Self::new();
        for (key, value) in iter {
            parameters.append(key, value);
        }
        parameters
    }
}

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), std::borrow::Cow::into_owned)
}
