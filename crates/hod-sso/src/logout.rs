//! Combined token invalidation.

use crate::config::LogoutOptions;
use crate::error::{ConfigError, SsoErrorKind, SsoResult};
use crate::executor::SignedRequestExecutor;
use crate::model::{HttpMethod, SignedRequest};
use crate::transport::HttpTransport;

/// Single `DELETE` of the combined token resource.
#[derive(Debug, Clone)]
pub struct LogoutOperation {
    request: SignedRequest,
}

impl LogoutOperation {
    /// Prepare the request described by `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the options fail validation.
    pub fn new(options: &LogoutOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            request: SignedRequest {
                url: options.logout_url(),
                verb: HttpMethod::Delete,
                token: options.combined_token.clone(),
                body: None,
            },
        })
    }

    /// URL the request is sent to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.request.url
    }

    /// Send the request.
    ///
    /// # Errors
    ///
    /// Returns an `HOD` [`crate::SsoError`] for any non-200 response.
    pub async fn execute(&self, transport: &dyn HttpTransport) -> SsoResult<()> {
        SignedRequestExecutor::new(transport)
            .execute(&self.request, None, SsoErrorKind::Hod)
            .await
            .map(|_| {
                tracing::info!(url = %self.request.url, "combined token invalidated");
            })
    }
}

/// Invalidate a combined token and report the result to `callback`.
///
/// # Errors
///
/// Returns [`ConfigError`] without sending anything when the options are invalid.
pub async fn logout<F>(
    options: &LogoutOptions,
    transport: &dyn HttpTransport,
    callback: F,
) -> Result<(), ConfigError>
where
    F: FnOnce(SsoResult<()>),
{
    let operation = LogoutOperation::new(options)?;
    callback(operation.execute(transport).await);
    Ok(())
}
