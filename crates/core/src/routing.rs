//! Cloud routing properties derived from a handshake body.

use fh_protocol::HandshakeBody;
use serde_json::{Map, Value};

/// Validated result of a handshake. Gates every cloud call.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingProperties {
	/// Cloud app URL, always ending with exactly one `/`.
	pub cloud_host: String,
	pub environment: Option<String>,
	/// Handshake correlation id.
	pub track_id: String,
	/// Everything the handshake returned.
	pub raw: Map<String, Value>,
	session_token: Option<String>,
}

impl RoutingProperties {
	/// Builds properties from a handshake body.
	///
	/// Returns `None` unless `body` is an object with a string `hosts.url` and
	/// a string `init.trackId`.
	pub fn from_json(body: &Value) -> Option<Self> {
		let raw = body.as_object()?.clone();
		let handshake: HandshakeBody = serde_json::from_value(body.clone()).ok()?;
		let session_token = handshake.session_token().filter(|token| !token.is_empty()).map(str::to_string);

		Some(Self {
			cloud_host: format!("{}/", handshake.hosts.url.trim_end_matches('/')),
			environment: handshake.hosts.environment().map(str::to_string),
			track_id: handshake.init.track_id,
			raw,
			session_token,
		})
	}

	/// Session token the platform issued with the handshake, if any.
	pub fn session_token(&self) -> Option<&str> {
		self.session_token.as_deref()
	}
}
