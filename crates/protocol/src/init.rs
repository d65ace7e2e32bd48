//! Parameter bag sent with the init handshake.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label for the device-generated identifier in `cuidMap`.
pub const CUID_SOURCE_GENERATED: &str = "CFUUID";

/// Label for the platform vendor identifier in `cuidMap`.
pub const CUID_SOURCE_VENDOR: &str = "vendorIdentifier";

/// One identifier source reported to the platform.
///
/// The vendor entry is always sent, even when the platform has no vendor id,
/// in which case `cuid` is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuidEntry {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cuid: Option<String>,
}

impl CuidEntry {
	pub fn new(name: impl Into<String>, cuid: Option<String>) -> Self {
		Self { name: name.into(), cuid }
	}
}

/// Body of `POST /box/srv/1.1/app/init`.
///
/// Absent configuration values are omitted from the JSON rather than sent as
/// `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitParams {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub appid: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub appkey: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub projectid: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connectiontag: Option<String>,
	pub sdk_version: String,
	pub destination: String,
	pub cuid: String,
	#[serde(rename = "cuidMap")]
	pub cuid_map: Vec<CuidEntry>,
	#[serde(rename = "sessionToken", default, skip_serializing_if = "Option::is_none")]
	pub session_token: Option<String>,
}

impl InitParams {
	/// Returns the parameters as a JSON object keyed by wire name.
	pub fn to_map(&self) -> Map<String, Value> {
		match serde_json::to_value(self) {
			Ok(Value::Object(map)) => map,
			_ => Map::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn params(vendor: Option<&str>) -> InitParams {
		InitParams {
			appid: Some("app".into()),
			appkey: None,
			projectid: Some("proj".into()),
			connectiontag: None,
			sdk_version: "FH_RUST_SDK/0.0.0".into(),
			destination: "native".into(),
			cuid: "DEVICE".into(),
			cuid_map: vec![
				CuidEntry::new(CUID_SOURCE_GENERATED, Some("DEVICE".into())),
				CuidEntry::new(CUID_SOURCE_VENDOR, vendor.map(str::to_string)),
			],
			session_token: None,
		}
	}

	#[test]
	fn absent_values_are_omitted() {
		let map = params(None).to_map();
		assert_eq!(map["appid"], "app");
		assert!(!map.contains_key("appkey"));
		assert!(!map.contains_key("connectiontag"));
		assert!(!map.contains_key("sessionToken"));
	}

	#[test]
	fn vendor_entry_keeps_label_without_id() {
		let map = params(None).to_map();
		let cuid_map = map["cuidMap"].as_array().unwrap();
		assert_eq!(cuid_map.len(), 2);
		assert_eq!(cuid_map[1]["name"], CUID_SOURCE_VENDOR);
		assert!(cuid_map[1].get("cuid").is_none());
	}

	#[test]
	fn vendor_entry_carries_id_when_known() {
		let map = params(Some("VENDOR")).to_map();
		assert_eq!(map["cuidMap"][1]["cuid"], "VENDOR");
	}
}
