mod auth;
mod cloud;
mod init;
mod status;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::setup;
use crate::terminal::TerminalRedirect;

/// Runs the selected command. `Ok(false)` means the SDK reported a failure
/// that has already been printed.
pub async fn dispatch(cli: Cli) -> Result<bool> {
	match &cli.command {
		Commands::Init => init::execute(&setup::build_client(&cli, None)?).await,
		Commands::Cloud { path, method, data, headers } => {
			let fh = setup::build_client(&cli, None)?;
			cloud::execute(&fh, path, *method, data.as_deref(), headers).await
		}
		Commands::Auth {
			policy,
			user,
			password,
			timeout,
		} => {
			let fh = setup::build_client(&cli, Some(Arc::new(TerminalRedirect::new())))?;
			let credentials = match (user, password) {
				(Some(user), Some(password)) => Some(fh::AuthCredentials::new(user.as_str(), password.as_str())),
				_ => None,
			};
			auth::execute(&fh, policy, credentials, *timeout).await
		}
		Commands::Status => status::execute(&cli),
	}
}
