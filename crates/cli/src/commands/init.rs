use anyhow::Result;
use fh::Fh;
use serde_json::json;
use tracing::info;

use crate::output;

pub async fn execute(fh: &Fh) -> Result<bool> {
	let response = fh.init().await;
	info!(target: "fh.cli", state = %fh.state(), "init finished");

	if !response.is_success() {
		return output::print_response(&response);
	}

	let mut value = output::envelope(&response);
	if let Some(routing) = fh.context().routing() {
		value["routing"] = json!({
			"state": fh.state().as_str(),
			"cloud_host": routing.cloud_host,
			"environment": routing.environment,
			"track_id": routing.track_id,
		});
	}
	output::print_json(&value)?;
	Ok(true)
}
