use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fh::HttpMethod;
use fh::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(name = "fh")]
#[command(about = "fh platform client - init handshake, auth policies and cloud calls")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// App configuration descriptor
	#[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
	pub config: PathBuf,

	/// Persistent store for device id, session token and cached handshake
	#[arg(long, global = true, value_name = "FILE")]
	pub store: Option<PathBuf>,

	/// Override the platform host from the descriptor
	#[arg(long, global = true, value_name = "URL")]
	pub host: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run the init handshake and print the routing properties
	Init,

	/// Call a cloud endpoint (runs init first)
	Cloud {
		/// Endpoint path relative to the cloud host
		path: String,

		/// HTTP method
		#[arg(short = 'X', long, default_value = "POST")]
		method: HttpMethod,

		/// JSON arguments (body for POST/PUT, query otherwise)
		#[arg(short = 'd', long = "data", value_name = "JSON")]
		data: Option<String>,

		/// Extra header, repeatable
		#[arg(short = 'H', long = "header", value_name = "KEY:VALUE")]
		headers: Vec<String>,
	},

	/// Authenticate against an auth policy
	Auth {
		/// Auth policy id
		policy: String,

		#[arg(long, requires = "password")]
		user: Option<String>,

		#[arg(long, requires = "user")]
		password: Option<String>,

		/// Seconds to wait for a browser redirect to complete
		#[arg(long, default_value = "300")]
		timeout: u64,
	},

	/// Show the locally stored session state without touching the network
	Status,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cloud_defaults_to_post() {
		let cli = Cli::try_parse_from(["fh", "cloud", "hello"]).unwrap();
		match cli.command {
			Commands::Cloud { path, method, data, headers } => {
				assert_eq!(path, "hello");
				assert_eq!(method, HttpMethod::Post);
				assert!(data.is_none());
				assert!(headers.is_empty());
			}
			other => panic!("unexpected command {other:?}"),
		}
		assert_eq!(cli.config, PathBuf::from("fhconfig.json"));
	}

	#[test]
	fn cloud_accepts_curl_style_flags() {
		let cli = Cli::try_parse_from([
			"fh", "cloud", "search", "-X", "get", "-d", r#"{"q":"x"}"#, "-H", "x-a: 1", "-H", "x-b:2", "-vv",
		])
		.unwrap();
		assert_eq!(cli.verbose, 2);
		let Commands::Cloud { method, data, headers, .. } = cli.command else {
			panic!("expected cloud command");
		};
		assert_eq!(method, HttpMethod::Get);
		assert_eq!(data.as_deref(), Some(r#"{"q":"x"}"#));
		assert_eq!(headers, vec!["x-a: 1".to_string(), "x-b:2".to_string()]);
	}

	#[test]
	fn unknown_method_is_rejected() {
		assert!(Cli::try_parse_from(["fh", "cloud", "x", "-X", "PATCH"]).is_err());
	}

	#[test]
	fn auth_user_requires_password() {
		assert!(Cli::try_parse_from(["fh", "auth", "ldap", "--user", "alice"]).is_err());
		let cli = Cli::try_parse_from(["fh", "--host", "https://h", "auth", "ldap", "--user", "alice", "--password", "pw"]).unwrap();
		assert_eq!(cli.host.as_deref(), Some("https://h"));
	}
}
