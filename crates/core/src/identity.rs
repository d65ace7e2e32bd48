//! Stable per-install device identifier.

use std::sync::Arc;

use fh_runtime::KeyValueStore;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::keys;

/// Device id generated once and persisted under [`keys::DEVICE_ID`].
pub struct DeviceIdentity {
	store: Arc<dyn KeyValueStore>,
	vendor_id: Option<String>,
	cached: Mutex<Option<String>>,
}

impl DeviceIdentity {
	pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
		Self {
			store,
			vendor_id: None,
			cached: Mutex::new(None),
		}
	}

	/// Sets the platform vendor identifier, when the host has one.
	pub fn with_vendor_id(mut self, vendor_id: Option<String>) -> Self {
		self.vendor_id = vendor_id.filter(|id| !id.is_empty());
		self
	}

	/// Returns the device id, generating and persisting it on first use.
	pub fn device_id(&self) -> String {
		let mut cached = self.cached.lock();
		if let Some(id) = cached.as_ref() {
			return id.clone();
		}

		let id = match self.store.get_string(keys::DEVICE_ID).filter(|id| !id.is_empty()) {
			Some(id) => id,
			None => {
				let id = Uuid::new_v4().hyphenated().to_string().to_uppercase();
				if let Err(err) = self.store.set_string(keys::DEVICE_ID, &id) {
					warn!(target: "fh.store", error = %err, "device id not persisted");
				}
				debug!(target: "fh.store", device = %id, "generated device id");
				id
			}
		};
		*cached = Some(id.clone());
		id
	}

	pub fn vendor_id(&self) -> Option<&str> {
		self.vendor_id.as_deref()
	}
}

impl std::fmt::Debug for DeviceIdentity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DeviceIdentity")
			.field("vendor_id", &self.vendor_id)
			.field("cached", &*self.cached.lock())
			.finish()
	}
}
