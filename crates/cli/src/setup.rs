//! Builds an [`Fh`] client from command-line settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use fh::{Config, Fh};
use fh_runtime::{FileStore, ProbeReachability, Reachability, RedirectSurface, StaticReachability};
use tracing::{debug, info};
use url::Url;

use crate::cli::Cli;

/// Where the persistent store lives when `--store` is not given.
pub fn default_store_path() -> PathBuf {
	dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("fh").join("store.json")
}

/// Loads the descriptor and applies `--host`.
///
/// A missing descriptor is tolerated when `--host` is given.
pub fn load_config(path: &Path, host: Option<&str>) -> Result<Config> {
	let config = if path.exists() {
		Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
	} else if host.is_some() {
		debug!(target: "fh.cli", path = %path.display(), "no config descriptor, using --host only");
		Config::new()
	} else {
		bail!("config descriptor {} not found (pass --config or --host)", path.display());
	};

	Ok(match host {
		Some(host) => config.with_overrides([("host", host)]),
		None => config,
	})
}

/// `host:port` to probe for reachability, derived from the platform URL.
pub fn probe_addr(host: &str) -> Option<String> {
	let url = Url::parse(host).ok()?;
	let name = url.host_str()?;
	let port = url.port_or_known_default()?;
	Some(format!("{name}:{port}"))
}

pub fn store_path(cli: &Cli) -> PathBuf {
	cli.store.clone().unwrap_or_else(default_store_path)
}

pub fn build_client(cli: &Cli, redirect: Option<Arc<dyn RedirectSurface>>) -> Result<Fh> {
	let config = load_config(&cli.config, cli.host.as_deref())?;

	let reachability: Arc<dyn Reachability> = match config.get("host").and_then(probe_addr) {
		Some(addr) => Arc::new(ProbeReachability::new(addr, ProbeReachability::DEFAULT_INTERVAL)),
		None => Arc::new(StaticReachability::online()),
	};

	let store_path = store_path(cli);
	info!(target: "fh.cli", store = %store_path.display(), "opening store");

	let mut builder = Fh::builder(config)
		.store(Arc::new(FileStore::open(store_path)))
		.reachability(reachability);
	if let Some(surface) = redirect {
		builder = builder.redirect_surface(surface);
	}
	Ok(builder.build()?)
}
