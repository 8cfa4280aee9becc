//! The combined-token authentication state machine.
//!
//! # Design
//! - Each state holds exactly the data the next step needs; [`AuthenticationFlow::step`]
//!   performs one exchange and returns the following state.
//! - Only HOD failures reach the redirect decision; backend failures end the flow as is.
//! - A redirect ends the flow: the navigator is told once and no result is reported.
//! - The round-trip marker on the page URL stops a second visit to the SSO page.

use url::Url;

use crate::NO_USER_TOKEN_CODE;
use crate::config::{AuthenticateOptions, RoundTripPolicy};
use crate::error::{ConfigError, SsoError, SsoErrorKind, SsoResult};
use crate::executor::{BackendRequestFetcher, SignedRequestExecutor};
use crate::model::{AuthenticateOutput, CombinedToken, Selection, SignedRequest};
use crate::page::{PATCH_REDIRECT_PARAM, PageContext, sso_redirect_target};
use crate::query::QueryParameters;
use crate::transport::{HttpTransport, Navigator};

/// Position of a flow in the token-acquisition sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    /// Nothing done yet.
    Start,
    /// Asking the backend for the signed list-applications request.
    FetchingListRequest,
    /// Listing the applications available to the user.
    ExecutingListRequest(SignedRequest),
    /// Asking the backend for the signed combined-token request.
    FetchingCombinedRequest(Selection),
    /// Requesting the combined token from HOD.
    ExecutingCombinedRequest {
        /// Application and user store the token is for.
        selection: Selection,
        /// Signed combined-token request.
        request: SignedRequest,
    },
    /// Token acquired.
    Success(AuthenticateOutput),
    /// Browser must visit the SSO page.
    Redirecting(Url),
    /// Flow ended with an error.
    Failed(SsoError),
}

impl FlowState {
    /// Short state name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FetchingListRequest => "fetching_list_request",
            Self::ExecutingListRequest(_) => "executing_list_request",
            Self::FetchingCombinedRequest(_) => "fetching_combined_request",
            Self::ExecutingCombinedRequest { .. } => "executing_combined_request",
            Self::Success(_) => "success",
            Self::Redirecting(_) => "redirecting",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the flow stops in this state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success(_) | Self::Redirecting(_) | Self::Failed(_)
        )
    }
}

/// How a flow ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// Combined token acquired.
    Authenticated(AuthenticateOutput),
    /// Browser was sent to the SSO page; nothing further happens in this page.
    Redirected(Url),
    /// Flow failed.
    Failed(SsoError),
}

impl FlowOutcome {
    /// Result to hand to a completion callback; `None` after a redirect.
    #[must_use]
    pub fn into_result(self) -> Option<SsoResult<AuthenticateOutput>> {
        match self {
            Self::Authenticated(output) => Some(Ok(output)),
            Self::Failed(error) => Some(Err(error)),
            Self::Redirected(_) => None,
        }
    }
}

/// One combined-token acquisition for one page load.
pub struct AuthenticationFlow<'a> {
    options: AuthenticateOptions,
    page: PageContext,
    transport: &'a dyn HttpTransport,
    navigator: &'a dyn Navigator,
}

impl<'a> AuthenticationFlow<'a> {
    /// Prepare a flow for the page the navigator is currently showing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the options fail validation or the
    /// navigator has no page URL.
    pub fn new(
        options: AuthenticateOptions,
        transport: &'a dyn HttpTransport,
        navigator: &'a dyn Navigator,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        let url = navigator
            .current_url()
            .ok_or(ConfigError::MissingField { field: "location" })?;
        let page = PageContext::new(url);
        Ok(Self {
            options,
            page,
            transport,
            navigator,
        })
    }

    /// Page context captured when the flow was created.
    #[must_use]
    pub const fn page(&self) -> &PageContext {
        &self.page
    }

    /// Drive the flow to a terminal state.
    ///
    /// Navigation for a redirect happens here, exactly once.
    pub async fn run(self) -> FlowOutcome {
        let mut state = FlowState::Start;
        while !state.is_terminal() {
            let from = state.name();
            state = self.step(state).await;
            tracing::debug!(from, to = state.name(), "sso flow transition");
        }

        match state {
            FlowState::Success(output) => {
                tracing::info!(
                    application = %output.application.name,
                    user_store = %output.user_store.name,
                    "combined token acquired"
                );
                FlowOutcome::Authenticated(output)
            }
            FlowState::Redirecting(target) => {
                tracing::info!(
                    sso_host = target.host_str().unwrap_or_default(),
                    "redirecting to SSO page"
                );
                self.navigator.assign(&target);
                FlowOutcome::Redirected(target)
            }
            FlowState::Failed(error) => {
                tracing::warn!(kind = %error.kind, status = ?error.status, "sso flow failed");
                FlowOutcome::Failed(error)
            }
            other => FlowOutcome::Failed(unexpected_state(&other)),
        }
    }

    /// Run the flow and report the result to `callback`.
    ///
    /// The callback is invoked once on success or failure and never after a redirect.
    pub async fn run_with<F>(self, callback: F)
    where
        F: FnOnce(SsoResult<AuthenticateOutput>),
    {
        if let Some(result) = self.run().await.into_result() {
            callback(result);
        }
    }

    /// Perform the exchange for `state` and return the next state.
    ///
    /// Terminal states are returned unchanged.
    pub async fn step(&self, state: FlowState) -> FlowState {
        match state {
            FlowState::Start => self
                .options
                .list_application_request
                .clone()
                .map_or(FlowState::FetchingListRequest, FlowState::ExecutingListRequest),
            FlowState::FetchingListRequest => {
                let url = self.options.list_application_request_url();
                match self.fetch_signed_request(&url).await {
                    Ok(request) => FlowState::ExecutingListRequest(request),
                    Err(error) => FlowState::Failed(error),
                }
            }
            FlowState::ExecutingListRequest(request) => {
                match self.execute(&request).await {
                    Ok(payload) => select_application(payload),
                    Err(error) => self.recover(error).await,
                }
            }
            FlowState::FetchingCombinedRequest(selection) => {
                let url = format!(
                    "{}?{}",
                    self.options.combined_request_url(),
                    selection.combined_request_parameters()
                );
                match self.fetch_signed_request(&url).await {
                    Ok(request) => FlowState::ExecutingCombinedRequest { selection, request },
                    Err(error) => FlowState::Failed(error),
                }
            }
            FlowState::ExecutingCombinedRequest { selection, request } => {
                match self.execute(&request).await {
                    Ok(payload) => match payload.get("token").and_then(CombinedToken::from_json) {
                        Some(token) => FlowState::Success(AuthenticateOutput::new(selection, token)),
                        None => FlowState::Failed(SsoError::from_response(
                            SsoErrorKind::Hod,
                            200,
                            payload,
                        )),
                    },
                    Err(error) => self.recover(error).await,
                }
            }
            terminal => terminal,
        }
    }

    /// Decide between redirecting to the SSO page and failing.
    async fn recover(&self, error: SsoError) -> FlowState {
        if error.hod_error_code() != Some(NO_USER_TOKEN_CODE) {
            return FlowState::Failed(error);
        }

        if let Some(message) = self.page.sso_error() {
            return FlowState::Failed(SsoError {
                kind: SsoErrorKind::Sso,
                sso_error: Some(message.to_string()),
                ..error
            });
        }

        if self.page.completed_round_trip() {
            let kind = match self.options.round_trip_policy {
                RoundTripPolicy::NoUserToken => SsoErrorKind::NoUserToken,
                RoundTripPolicy::CrossDomainCookies => SsoErrorKind::CrossDomainCookies,
            };
            return FlowState::Failed(SsoError { kind, ..error });
        }

        let return_url = self.page.return_url();
        let patch_url = format!(
            "{}?{}",
            self.options.combined_patch_request_url(),
            QueryParameters::new().with(PATCH_REDIRECT_PARAM, return_url.as_str())
        );
        let patch = match self.fetch_signed_request(&patch_url).await {
            Ok(patch) => patch,
            Err(error) => return FlowState::Failed(error),
        };

        match sso_redirect_target(&self.options.sso_page(), &patch.token, &return_url) {
            Ok(target) => FlowState::Redirecting(target),
            Err(err) => {
                tracing::warn!(error = %err, "SSO page is not a valid URL");
                FlowState::Failed(SsoError::new(SsoErrorKind::Application))
            }
        }
    }

    async fn execute(&self, request: &SignedRequest) -> SsoResult<serde_json::Value> {
        SignedRequestExecutor::new(self.transport)
            .execute(request, self.page.user_token(), SsoErrorKind::Hod)
            .await
    }

    async fn fetch_signed_request(&self, backend_url: &str) -> SsoResult<SignedRequest> {
        let url = self.page.resolve(backend_url).map_err(|err| {
            tracing::warn!(error = %err, "backend URL cannot be resolved against the page");
            SsoError::new(SsoErrorKind::Application)
        })?;
        BackendRequestFetcher::new(self.transport)
            .fetch_signed_request(url.as_str())
            .await
    }
}

/// Run one flow and report its result to `callback`.
///
/// `callback` receives exactly one result unless the browser is redirected to
/// the SSO page, in which case it is never called.
///
/// # Errors
///
/// Returns [`ConfigError`] without contacting anything when the options are invalid.
pub async fn authenticate<F>(
    options: AuthenticateOptions,
    transport: &dyn HttpTransport,
    navigator: &dyn Navigator,
    callback: F,
) -> Result<(), ConfigError>
where
    F: FnOnce(SsoResult<AuthenticateOutput>),
{
    AuthenticationFlow::new(options, transport, navigator)?
        .run_with(callback)
        .await;
    Ok(())
}

fn select_application(payload: serde_json::Value) -> FlowState {
    match Selection::from_listing(&payload) {
        Ok(Some(selection)) => FlowState::FetchingCombinedRequest(selection),
        Ok(None) => FlowState::Failed(SsoError::new(SsoErrorKind::NoUsersAuthorised)),
        Err(err) => {
            tracing::warn!(error = %err, "unexpected list-applications payload");
            FlowState::Failed(SsoError::from_response(SsoErrorKind::Hod, 200, payload))
        }
    }
}

fn unexpected_state(state: &FlowState) -> SsoError {
    tracing::error!(state = state.name(), "sso flow stopped in a non-terminal state");
    SsoError::new(SsoErrorKind::Application)
}
