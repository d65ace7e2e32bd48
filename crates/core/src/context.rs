//! Process-wide session state, injected into every component.
//!
//! One [`SessionContext`] models one logical session. Components share it
//! through `Arc`; nothing in the SDK reaches for globals, so tests build a
//! fresh context per case.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fh_protocol::InitParams;
use fh_runtime::{KeyValueStore, Reachability};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Error;
use crate::identity::DeviceIdentity;
use crate::response::Response;
use crate::routing::RoutingProperties;
use crate::session::SessionState;

/// Storage keys shared with other SDKs of the platform.
pub mod keys {
	pub const DEVICE_ID: &str = "FHUUID";
	pub const SESSION_TOKEN: &str = "sessionToken";
	/// Last good handshake body, used as fallback.
	pub const HANDSHAKE_CACHE: &str = "hosts";
	pub const TRACK_ID: &str = "init";
}

pub struct SessionContext {
	config: RwLock<Config>,
	store: Arc<dyn KeyValueStore>,
	identity: DeviceIdentity,
	reachability: Arc<dyn Reachability>,
	routing: RwLock<Option<Arc<RoutingProperties>>>,
	state: Mutex<SessionState>,
	last_error: Mutex<Option<Error>>,
	watcher_started: AtomicBool,
}

impl SessionContext {
	pub fn new(config: Config, store: Arc<dyn KeyValueStore>, reachability: Arc<dyn Reachability>) -> Self {
		Self {
			config: RwLock::new(config),
			identity: DeviceIdentity::new(Arc::clone(&store)),
			store,
			reachability,
			routing: RwLock::new(None),
			state: Mutex::new(SessionState::Uninitialized),
			last_error: Mutex::new(None),
			watcher_started: AtomicBool::new(false),
		}
	}

	/// Sets the platform vendor identifier reported in `cuidMap`.
	pub fn with_vendor_id(mut self, vendor_id: Option<String>) -> Self {
		self.identity = self.identity.with_vendor_id(vendor_id);
		self
	}

	pub fn config(&self) -> RwLockReadGuard<'_, Config> {
		self.config.read()
	}

	pub fn set_config(&self, key: impl Into<String>, value: impl Into<String>) {
		self.config.write().set(key, value);
	}

	pub fn store(&self) -> &Arc<dyn KeyValueStore> {
		&self.store
	}

	pub fn identity(&self) -> &DeviceIdentity {
		&self.identity
	}

	pub fn reachability(&self) -> &Arc<dyn Reachability> {
		&self.reachability
	}

	/// Current routing properties; `None` until a handshake (or cache
	/// fallback) succeeds.
	pub fn routing(&self) -> Option<Arc<RoutingProperties>> {
		self.routing.read().clone()
	}

	/// Whether requests should short-circuit as offline. Before the first
	/// handshake the transport is always attempted.
	pub fn is_offline(&self) -> bool {
		self.routing.read().is_some() && !self.reachability.is_online()
	}

	pub fn state(&self) -> SessionState {
		*self.state.lock()
	}

	pub(crate) fn set_state(&self, state: SessionState) {
		*self.state.lock() = state;
	}

	/// Installs fresh routing properties and persists their track id.
	pub(crate) fn install_routing(&self, props: RoutingProperties) {
		if let Err(err) = self.store.set_string(keys::TRACK_ID, &props.track_id) {
			warn!(target: "fh.store", error = %err, "track id not persisted");
		}
		if let Some(token) = props.session_token() {
			self.store_session_token(token);
		}
		debug!(target: "fh.session", cloud_host = %props.cloud_host, track_id = %props.track_id, "routing properties installed");
		*self.routing.write() = Some(Arc::new(props));
	}

	pub(crate) fn cache_handshake(&self, body: &Value) {
		if let Err(err) = self.store.set_object(keys::HANDSHAKE_CACHE, body) {
			warn!(target: "fh.store", error = %err, "handshake cache not persisted");
		}
	}

	pub(crate) fn cached_handshake(&self) -> Option<Value> {
		self.store.get_object(keys::HANDSHAKE_CACHE)
	}

	pub fn track_id(&self) -> Option<String> {
		self.store.get_string(keys::TRACK_ID)
	}

	pub fn session_token(&self) -> Option<String> {
		self.store.get_string(keys::SESSION_TOKEN).filter(|token| !token.is_empty())
	}

	pub(crate) fn store_session_token(&self, token: &str) {
		match self.store.set_string(keys::SESSION_TOKEN, token) {
			Ok(()) => debug!(target: "fh.auth", "session token stored"),
			Err(err) => warn!(target: "fh.store", error = %err, "session token not persisted"),
		}
	}

	/// Parameter bag for the handshake and cloud headers.
	pub fn init_params(&self) -> InitParams {
		self.config.read().compute_init_params(&self.identity, self.session_token())
	}

	/// Most recent error reported by any operation on this session.
	pub fn last_error(&self) -> Option<Error> {
		self.last_error.lock().clone()
	}

	/// Retains the response's error, if it has one.
	pub(crate) fn record(&self, response: &Response) {
		if let Some(err) = response.error() {
			*self.last_error.lock() = Some(err.clone());
		}
	}

	pub(crate) fn watcher_started(&self) -> bool {
		self.watcher_started.load(Ordering::SeqCst)
	}

	pub(crate) fn mark_watcher_started(&self) {
		self.watcher_started.store(true, Ordering::SeqCst);
	}
}

impl std::fmt::Debug for SessionContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionContext")
			.field("config", &*self.config.read())
			.field("routing", &*self.routing.read())
			.field("state", &self.state())
			.field("last_error", &*self.last_error.lock())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use fh_runtime::{MemoryStore, StaticReachability};
	use serde_json::json;

	use super::*;

	fn context(reach: Arc<StaticReachability>) -> SessionContext {
		SessionContext::new(Config::from_properties([("host", "https://platform")]), Arc::new(MemoryStore::new()), reach)
	}

	fn props() -> RoutingProperties {
		RoutingProperties::from_json(&json!({
			"hosts": { "url": "https://cloud" },
			"init": { "trackId": "T1" }
		}))
		.unwrap()
	}

	#[test]
	fn offline_only_after_first_handshake() {
		let reach = Arc::new(StaticReachability::offline());
		let ctx = context(reach.clone());
		assert!(!ctx.is_offline());

		ctx.install_routing(props());
		assert!(ctx.is_offline());

		reach.set_online(true);
		assert!(!ctx.is_offline());
	}

	#[test]
	fn install_routing_persists_track_id() {
		let ctx = context(Arc::new(StaticReachability::online()));
		ctx.install_routing(props());
		assert_eq!(ctx.track_id().as_deref(), Some("T1"));
		assert_eq!(ctx.routing().unwrap().cloud_host, "https://cloud/");
	}

	#[test]
	fn record_keeps_last_error_only() {
		let ctx = context(Arc::new(StaticReachability::online()));
		ctx.record(&Response::from_error(Error::Offline));
		ctx.record(&Response::success(Some(200), Vec::new(), json!({})));
		assert!(ctx.last_error().unwrap().is_offline());
	}

	#[test]
	fn init_params_pick_up_stored_token() {
		let ctx = context(Arc::new(StaticReachability::online()));
		assert_eq!(ctx.init_params().session_token, None);
		ctx.store_session_token("TOKEN");
		assert_eq!(ctx.init_params().session_token.as_deref(), Some("TOKEN"));
	}
}
