//! Application configuration (`fhconfig.json`).
//!
//! The descriptor is a flat JSON object created with the project, typically:
//!
//! ```json
//! {
//!   "host": "https://myDomain.example.com",
//!   "appid": "fXPFgWSN94DxoFoqgml6WeES",
//!   "appkey": "3a8c1e3b...",
//!   "projectid": "fXPFgYTB2YdzwKvqEpv6hnBr",
//!   "connectiontag": "0.0.1"
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fh_protocol::{CUID_SOURCE_GENERATED, CUID_SOURCE_VENDOR, CuidEntry, InitParams};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identity::DeviceIdentity;

pub const DEFAULT_CONFIG_FILE: &str = "fhconfig.json";

/// Value sent as `destination` in the init parameters.
pub const DESTINATION: &str = "native";

/// Value sent as `sdk_version` in the init parameters.
pub const SDK_VERSION: &str = concat!("FH_RUST_SDK/", env!("CARGO_PKG_VERSION"));

/// String properties keyed by name. Empty values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
	properties: BTreeMap<String, String>,
}

impl Config {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_properties<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			properties: properties.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}

	/// Parses a JSON object descriptor. Numbers and booleans are kept in their
	/// textual form, `null` entries are dropped.
	pub fn from_json_str(content: &str) -> Result<Self> {
		let object: Map<String, Value> =
			serde_json::from_str(content).map_err(|err| Error::Precondition(format!("config descriptor is not a JSON object: {err}")))?;

		let mut properties = BTreeMap::new();
		for (key, value) in object {
			let value = match value {
				Value::String(s) => s,
				Value::Number(n) => n.to_string(),
				Value::Bool(b) => b.to_string(),
				Value::Null => continue,
				other => {
					return Err(Error::Precondition(format!("config property '{key}' must be a string, got {other}")));
				}
			};
			properties.insert(key, value);
		}
		Ok(Self { properties })
	}

	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = fs::read_to_string(path).map_err(|err| Error::Precondition(format!("cannot read config {}: {err}", path.display())))?;
		Self::from_json_str(&content)
	}

	/// Applies programmatic overrides on top of the descriptor.
	pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.properties.extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
		self
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.properties.get(key).map(String::as_str).filter(|value| !value.is_empty())
	}

	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.properties.insert(key.into(), value.into());
	}

	/// Platform host every handshake and auth call targets.
	pub fn host(&self) -> Result<&str> {
		self.get("host")
			.ok_or_else(|| Error::Precondition("configuration must define 'host' before any network call".into()))
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Builds the parameter bag sent with the init handshake and mirrored as
	/// `x-fh-*` headers on cloud calls.
	///
	/// Reads the device id, which persists a new one on first use.
	pub fn compute_init_params(&self, identity: &DeviceIdentity, session_token: Option<String>) -> InitParams {
		let cuid = identity.device_id();
		InitParams {
			appid: self.get("appid").map(str::to_string),
			appkey: self.get("appkey").map(str::to_string),
			projectid: self.get("projectid").map(str::to_string),
			connectiontag: self.get("connectiontag").map(str::to_string),
			sdk_version: SDK_VERSION.to_string(),
			destination: DESTINATION.to_string(),
			cuid_map: vec![
				CuidEntry::new(CUID_SOURCE_GENERATED, Some(cuid.clone())),
				CuidEntry::new(CUID_SOURCE_VENDOR, identity.vendor_id().map(str::to_string)),
			],
			cuid,
			session_token,
		}
	}
}
