//! Spans wrapping one CLI command.

use tracing::Span;

use crate::init::build_sha;

/// Root span for `command`, carrying the build SHA.
#[must_use]
pub fn command_span(command: &'static str) -> Span {
    tracing::info_span!("hod_sso", command, build_sha = %build_sha())
}
