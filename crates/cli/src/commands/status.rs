use anyhow::Result;
use fh::RoutingProperties;
use fh::context::keys;
use fh_runtime::{FileStore, KeyValueStore};
use serde_json::{Value, json};

use crate::cli::Cli;
use crate::{output, setup};

/// Summarises what the store holds. Never touches the network.
pub fn status_report(cli: &Cli, store: &dyn KeyValueStore) -> Value {
	let config = setup::load_config(&cli.config, cli.host.as_deref()).ok();
	let cached = store.get_object(keys::HANDSHAKE_CACHE).and_then(|body| RoutingProperties::from_json(&body));

	json!({
		"config": {
			"path": cli.config.display().to_string(),
			"host": config.as_ref().and_then(|config| config.get("host").map(str::to_string)),
			"appid": config.as_ref().and_then(|config| config.get("appid").map(str::to_string)),
		},
		"device_id": store.get_string(keys::DEVICE_ID),
		"track_id": store.get_string(keys::TRACK_ID),
		"session_token": store.get_string(keys::SESSION_TOKEN).is_some(),
		"cached_cloud_host": cached.map(|props| props.cloud_host),
	})
}

pub fn execute(cli: &Cli) -> Result<bool> {
	let path = setup::store_path(cli);
	let store = FileStore::open(&path);
	let mut report = status_report(cli, &store);
	report["store"] = json!(path.display().to_string());
	output::print_json(&report)?;
	Ok(true)
}
