use clap::Parser;
use fh_cli::cli::Cli;
use fh_cli::{commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let code = match commands::dispatch(cli).await {
		Ok(true) => 0,
		Ok(false) => 1,
		Err(err) => {
			error!(target: "fh.cli", error = %format!("{err:#}"), "command failed");
			eprintln!("error: {err:#}");
			1
		}
	};
	// Exit directly: the terminal redirect may still be blocked reading stdin.
	std::process::exit(code);
}
