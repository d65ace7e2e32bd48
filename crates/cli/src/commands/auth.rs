use std::time::Duration;

use anyhow::{Result, anyhow};
use fh::{AuthCredentials, Fh};
use tracing::{info, warn};

use crate::output;

/// Authenticates against `policy`.
///
/// A best-effort init runs first so the request carries the environment of
/// the cloud app. Browser redirects are bounded by `timeout_secs`.
pub async fn execute(fh: &Fh, policy: &str, credentials: Option<AuthCredentials>, timeout_secs: u64) -> Result<bool> {
	let init = fh.init().await;
	if let Some(err) = init.error() {
		warn!(target: "fh.cli", error = %err, "init failed, authenticating without environment");
	}

	info!(target: "fh.cli", policy, "authenticating");
	let response = tokio::time::timeout(Duration::from_secs(timeout_secs), fh.auth(policy, credentials))
		.await
		.map_err(|_| anyhow!("no completed redirect within {timeout_secs}s"))?;

	if let Some(token) = fh.context().session_token() {
		info!(target: "fh.cli", token_len = token.len(), "session token stored");
	}
	output::print_response(&response)
}
