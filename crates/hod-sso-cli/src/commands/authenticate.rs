//! `authenticate`: run the combined-token flow for one page URL.

use hod_sso::{AuthenticateOptions, AuthenticationFlow, FlowOutcome, Navigator, RoundTripPolicy};
use serde_json::Value;
use url::Url;

use crate::cli::AuthenticateArgs;
use crate::client::{AppContext, CliError, CliResult, options_from};
use crate::output::{render_authenticated, render_redirect};

/// Page location handed to the flow; redirects are reported, not followed.
struct CommandLineNavigator {
    page: Url,
}

impl Navigator for CommandLineNavigator {
    fn current_url(&self) -> Option<Url> {
        Some(self.page.clone())
    }

    fn assign(&self, target: &Url) {
        tracing::debug!(
            sso_host = target.host_str().unwrap_or_default(),
            "sign-in must continue in a browser"
        );
    }
}

pub(crate) async fn handle_authenticate(ctx: &AppContext, args: AuthenticateArgs) -> CliResult<()> {
    let policy = args
        .round_trip_policy
        .map(RoundTripPolicy::from)
        .map(serde_json::to_value)
        .transpose()
        .map_err(CliError::failure)?;
    let options: AuthenticateOptions = options_from(
        &ctx.config,
        vec![
            ("applicationRoot", args.application_root.map(Value::from)),
            ("hodDomain", args.hod_domain.map(Value::from)),
            ("ssoPage", args.sso_page.map(Value::from)),
            ("roundTripPolicy", policy),
        ],
    )?;

    let navigator = CommandLineNavigator {
        page: args.page_url,
    };
    let flow = AuthenticationFlow::new(options, &ctx.transport, &navigator)?;

    match flow.run().await {
        FlowOutcome::Authenticated(output) => render_authenticated(&output, ctx.output),
        FlowOutcome::Redirected(target) => render_redirect(&target, ctx.output),
        FlowOutcome::Failed(error) => Err(CliError::sso(&error)),
    }
}
