//! Page location inspection and SSO redirect targets.
//!
//! # Design
//! - The page URL is read once per flow and never mutated; the round-trip marker
//!   only ever appears on the outgoing return URL.
//! - A user token on the URL also counts as a finished round trip, since only the
//!   SSO page puts one there.

use url::Url;

use crate::model::UserToken;
use crate::query::QueryParameters;

/// Marker put on the return URL before visiting the SSO page.
pub const ROUND_TRIP_PARAM: &str = "authenticated";
/// Parameter the SSO page sets when it could not sign the user in.
pub const SSO_ERROR_PARAM: &str = "error";
/// SSO page parameter naming where to send the browser back to.
pub const REDIRECT_URL_PARAM: &str = "redirect_url";
/// SSO page parameter carrying the signed patch token.
pub const APP_TOKEN_PARAM: &str = "app_token";
/// Backend parameter naming the return URL for the combined patch request.
pub const PATCH_REDIRECT_PARAM: &str = "redirect-url";

/// What the current page URL says about earlier SSO visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    url: Url,
    parameters: QueryParameters,
    user_token: Option<UserToken>,
}

impl PageContext {
    /// Inspect `url`.
    #[must_use]
    pub fn new(url: Url) -> Self {
        let parameters = QueryParameters::parse(url.query().unwrap_or_default());
        let user_token = UserToken::from_query(&parameters);
        Self {
            url,
            parameters,
            user_token,
        }
    }

    /// The page URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Query parameters of the page URL.
    #[must_use]
    pub const fn parameters(&self) -> &QueryParameters {
        &self.parameters
    }

    /// User token left on the URL by the SSO page.
    #[must_use]
    pub const fn user_token(&self) -> Option<&UserToken> {
        self.user_token.as_ref()
    }

    /// Error text the SSO page reported, if any.
    #[must_use]
    pub fn sso_error(&self) -> Option<&str> {
        self.parameters.first(SSO_ERROR_PARAM)
    }

    /// Whether the browser already came back from the SSO page.
    #[must_use]
    pub fn completed_round_trip(&self) -> bool {
        self.parameters.first(ROUND_TRIP_PARAM) == Some("true") || self.user_token.is_some()
    }

    /// Page URL with the round-trip marker added, used as the SSO return target.
    ///
    /// The page's own query text is kept byte for byte; only an existing marker
    /// pair is replaced, in place.
    #[must_use]
    pub fn return_url(&self) -> Url {
        let marker = format!("{ROUND_TRIP_PARAM}=true");
        let mut segments = Vec::new();
        let mut replaced = false;
        let query = self.url.query().filter(|query| !query.is_empty());
        for segment in query.into_iter().flat_map(|query| query.split('&')) {
            if segment.split('=').next() == Some(ROUND_TRIP_PARAM) {
                if !replaced {
                    segments.push(marker.as_str());
                    replaced = true;
                }
            } else {
                segments.push(segment);
            }
        }
        if !replaced {
            segments.push(marker.as_str());
        }

        let mut url = self.url.clone();
        url.set_query(Some(&segments.join("&")));
        url
    }

    /// Resolve a backend path (or absolute URL) against the page URL.
    ///
    /// # Errors
    ///
    /// Returns the parse error when `target` cannot be resolved.
    pub fn resolve(&self, target: &str) -> Result<Url, url::ParseError> {
        self.url.join(target)
    }
}

/// SSO page URL carrying the patch token and the return URL.
///
/// # Errors
///
/// Returns the parse error when `sso_page` is not an absolute URL.
pub fn sso_redirect_target(
    sso_page: &str,
    app_token: &str,
    return_url: &Url,
) -> Result<Url, url::ParseError> {
    let mut target = Url::parse(sso_page)?;
    let mut parameters = QueryParameters::parse(target.query().unwrap_or_default());
    parameters.append(APP_TOKEN_PARAM, app_token);
    parameters.append(REDIRECT_URL_PARAM, return_url.as_str());
    target.set_query(Some(&parameters.build()));
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageContext {
        PageContext::new(Url::parse(url).expect("valid page URL"))
    }

    #[test]
    fn fresh_page_has_no_round_trip() {
        let context = page("https://app.example.com/find/sso?lang=en");
        assert!(!context.completed_round_trip());
        assert!(context.sso_error().is_none());
        assert!(context.user_token().is_none());
    }

    #[test]
    fn marker_or_user_token_signal_round_trip() {
        assert!(page("https://app.example.com/sso?authenticated=true").completed_round_trip());
        assert!(!page("https://app.example.com/sso?authenticated=false").completed_round_trip());
        let with_token = page("https://app.example.com/sso?type=UNB&id=1&secret=s");
        assert!(with_token.completed_round_trip());
        assert_eq!(
            with_token.user_token().map(UserToken::header_value).as_deref(),
            Some("UNB:1:s")
        );
    }

    #[test]
    fn sso_error_is_read_literally() {
        let context = page("https://app.example.com/sso?error=Access%20denied&authenticated=true");
        assert_eq!(context.sso_error(), Some("Access denied"));
    }

    #[test]
    fn return_url_adds_marker_once() {
        let context = page("https://app.example.com/find/sso?lang=en#top");
        let url = context.return_url();
        assert_eq!(
            url.as_str(),
            "https://app.example.com/find/sso?lang=en&authenticated=true#top"
        );
        assert!(PageContext::new(url).completed_round_trip());
    }

    #[test]
    fn return_url_keeps_page_query_text() {
        let context = page("https://app.example.com/sso?q=a+b&flag&lang=en&path=%2Fx");
        assert_eq!(
            context.return_url().as_str(),
            "https://app.example.com/sso?q=a+b&flag&lang=en&path=%2Fx&authenticated=true"
        );
        assert_eq!(
            page("https://app.example.com/sso").return_url().as_str(),
            "https://app.example.com/sso?authenticated=true"
        );
    }

    #[test]
    fn return_url_replaces_existing_marker_in_place() {
        let context =
            page("https://app.example.com/sso?authenticated=false&q=a+b&authenticated&x=1");
        assert_eq!(
            context.return_url().as_str(),
            "https://app.example.com/sso?authenticated=true&q=a+b&x=1"
        );
    }

    #[test]
    fn resolve_joins_backend_paths() {
        let context = page("https://app.example.com/find/sso");
        assert_eq!(
            context
                .resolve("/find/api/list-application-request")
                .expect("resolvable")
                .as_str(),
            "https://app.example.com/find/api/list-application-request"
        );
    }

    #[test]
    fn redirect_target_puts_token_before_return_url() {
        let return_url =
            Url::parse("https://app.example.com/sso?authenticated=true").expect("valid URL");
        let target = sso_redirect_target(
            "https://dev.havenondemand.com/sso.html",
            "patch-token",
            &return_url,
        )
        .expect("valid SSO page");
        assert_eq!(
            target.as_str(),
            "https://dev.havenondemand.com/sso.html?app_token=patch-token&redirect_url=https%3A%2F%2Fapp.example.com%2Fsso%3Fauthenticated%3Dtrue"
        );
        assert!(sso_redirect_target("/sso.html", "t", &return_url).is_err());
    }
}
