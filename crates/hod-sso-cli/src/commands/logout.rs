//! `logout`: invalidate a combined token.

use hod_sso::LogoutOptions;
use hod_sso::logout::LogoutOperation;
use serde_json::Value;

use crate::cli::LogoutArgs;
use crate::client::{AppContext, CliError, CliResult, options_from};
use crate::output::render_logout;

pub(crate) async fn handle_logout(ctx: &AppContext, args: LogoutArgs) -> CliResult<()> {
    let options: LogoutOptions = options_from(
        &ctx.config,
        vec![
            ("combinedToken", args.combined_token.map(Value::from)),
            ("hodDomain", args.hod_domain.map(Value::from)),
            ("hodEndpoint", args.hod_endpoint.map(Value::from)),
            ("logoutUrl", args.logout_url.map(Value::from)),
        ],
    )?;

    let operation = LogoutOperation::new(&options)?;
    operation
        .execute(&ctx.transport)
        .await
        .map_err(|err| CliError::sso(&err))?;
    render_logout(operation.url(), ctx.output)
}
