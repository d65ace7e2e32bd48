//! Successful handshake response body.
//!
//! ```json
//! {
//!   "hosts": { "url": "https://app-dev.example.net", "environment": "dev" },
//!   "init": { "trackId": "eVtZFmW5NAbyEIJ8aecE2jJJ" },
//!   "status": "ok"
//! }
//! ```
//!
//! Only the fields below are required; everything else the platform sends is
//! kept verbatim by the SDK as the raw property map.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeBody {
	pub hosts: Hosts,
	pub init: InitInfo,
	/// Session token handed back by the platform, when it issues one at init.
	#[serde(rename = "sessionToken", default, skip_serializing_if = "Option::is_none")]
	pub session_token: Option<Value>,
}

impl HandshakeBody {
	pub fn session_token(&self) -> Option<&str> {
		self.session_token.as_ref().and_then(Value::as_str)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hosts {
	pub url: String,
	/// Kept loose: a non-string environment is treated as absent rather than
	/// rejecting the whole body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub environment: Option<Value>,
}

impl Hosts {
	pub fn environment(&self) -> Option<&str> {
		self.environment.as_ref().and_then(Value::as_str)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitInfo {
	#[serde(rename = "trackId")]
	pub track_id: String,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn parses_minimal_body() {
		let body: HandshakeBody = serde_json::from_value(json!({
			"hosts": { "url": "https://cloud" },
			"init": { "trackId": "T1" }
		}))
		.unwrap();
		assert_eq!(body.hosts.url, "https://cloud");
		assert_eq!(body.hosts.environment(), None);
		assert_eq!(body.init.track_id, "T1");
	}

	#[test]
	fn non_string_environment_reads_as_absent() {
		let body: HandshakeBody = serde_json::from_value(json!({
			"hosts": { "url": "https://cloud", "environment": 7 },
			"init": { "trackId": "T1" }
		}))
		.unwrap();
		assert_eq!(body.hosts.environment(), None);
	}

	#[test]
	fn missing_track_id_is_rejected() {
		let body = serde_json::from_value::<HandshakeBody>(json!({
			"hosts": { "url": "https://cloud" },
			"init": {}
		}));
		assert!(body.is_err());
	}
}
