//! Evaluate a request target against the gateway allowlist without
//! sending anything anywhere.
//!
//! Exit status: 0 allowed, 1 denied, 2 usage or configuration error.

use std::path::PathBuf;
use std::process::ExitCode;

use axum::http::{Method, Uri};
use clap::Parser;
use serde_json::json;

use authz_proxy::authz::{query_param_names, Authorizer};
use authz_proxy::config::resolve_config;

#[derive(Parser)]
#[command(name = "policy-check")]
#[command(about = "Check whether the gateway would forward a request", long_about = None)]
struct Cli {
    /// TOML configuration file; the built-in allowlist is used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP method, e.g. GET.
    method: String,

    /// Path and query, e.g. "/api/v0/hosts?status=working".
    target: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match check(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn check(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = resolve_config(cli.config.as_deref())?;
    let authorizer = Authorizer::from_config(&config.rules)?;

    let method = Method::from_bytes(cli.method.to_ascii_uppercase().as_bytes())?;
    let uri: Uri = cli.target.parse()?;
    let params = query_param_names(&uri);

    let decision = authorizer.evaluate(&method, uri.path(), &params);
    let report = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "params": params,
        "allowed": decision.is_allowed(),
        "rule": decision.rule(),
        "decision": decision.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(decision.is_allowed())
}
