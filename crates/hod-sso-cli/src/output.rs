//! Output renderers for command results.

use anyhow::anyhow;
use hod_sso::AuthenticateOutput;
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_authenticated(
    output: &AuthenticateOutput,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "status": "authenticated",
            "result": output,
        })),
        OutputFormat::Table => {
            for line in authenticated_lines(output) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

pub(crate) fn render_redirect(target: &Url, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "status": "redirect",
            "location": target.as_str(),
        })),
        OutputFormat::Table => {
            println!("Sign-in required; open this URL in a browser:");
            println!("{target}");
            Ok(())
        }
    }
}

pub(crate) fn render_logout(url: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "status": "logged_out",
            "url": url,
        })),
        OutputFormat::Table => {
            println!("Combined token invalidated.");
            Ok(())
        }
    }
}

fn authenticated_lines(output: &AuthenticateOutput) -> Vec<String> {
    let mut lines = vec![
        format!(
            "application: {} ({})",
            output.application.name, output.application.domain
        ),
        format!(
            "user store: {} ({})",
            output.user_store.name, output.user_store.domain
        ),
        format!("accounts: {}", output.accounts.len()),
    ];
    lines.extend(
        output
            .combined_token
            .iter()
            .map(|(name, value)| format!("token.{name}: {value}")),
    );
    lines
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hod_sso::{Account, Application, CombinedToken, UserStore};

    fn output() -> AuthenticateOutput {
        AuthenticateOutput {
            application: Application {
                name: "app".into(),
                domain: "d".into(),
                description: String::new(),
                domain_description: String::new(),
            },
            user_store: UserStore {
                name: "us".into(),
                domain: "ud".into(),
                domain_description: String::new(),
            },
            accounts: vec![Account(json!("acc1"))],
            combined_token: [("expiry", "1700000000"), ("type", "CMB")]
                .into_iter()
                .collect::<CombinedToken>(),
        }
    }

    #[test]
    fn table_lists_selection_and_token_fields() {
        assert_eq!(
            authenticated_lines(&output()),
            vec![
                "application: app (d)",
                "user store: us (ud)",
                "accounts: 1",
                "token.expiry: 1700000000",
                "token.type: CMB",
            ]
        );
    }

    #[test]
    fn renderers_accept_both_formats() {
        let target = Url::parse("https://dev.havenondemand.com/sso.html?app_token=t")
            .expect("valid URL");
        for format in [OutputFormat::Json, OutputFormat::Table] {
            render_authenticated(&output(), format).expect("render output");
            render_redirect(&target, format).expect("render redirect");
            render_logout("https://api.havenondemand.com/2/authenticate/combined", format)
                .expect("render logout");
        }
    }
}
