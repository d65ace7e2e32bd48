//! Init handshake and routing-property lifecycle.

use std::sync::Arc;

use fh_protocol::INIT_PATH;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::context::SessionContext;
use crate::error::{Error, ErrorKind};
use crate::executor::RequestExecutor;
use crate::response::Response;
use crate::routing::RoutingProperties;
use crate::transport::{Headers, HttpMethod};

/// Where the session stands after the most recent `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
	#[default]
	Uninitialized,
	Handshaking,
	/// Routing properties from a fresh handshake.
	Ready,
	/// Routing properties restored from the cached handshake after a failure.
	Degraded,
	Failed,
}

impl SessionState {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Uninitialized => "uninitialized",
			Self::Handshaking => "handshaking",
			Self::Ready => "ready",
			Self::Degraded => "degraded",
			Self::Failed => "failed",
		}
	}
}

impl std::fmt::Display for SessionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Runs the init handshake.
///
/// Concurrent `init` calls queue behind each other; each performs its own
/// handshake once the previous one has settled.
pub struct SessionManager {
	executor: RequestExecutor,
	flight: AsyncMutex<()>,
}

impl SessionManager {
	pub fn new(executor: RequestExecutor) -> Self {
		Self {
			executor,
			flight: AsyncMutex::new(()),
		}
	}

	pub fn context(&self) -> &Arc<SessionContext> {
		self.executor.context()
	}

	pub fn state(&self) -> SessionState {
		self.context().state()
	}

	/// Performs the handshake against `<host>/box/srv/1.1/app/init`.
	///
	/// On failure other than HTTP 400 the last cached handshake is used if one
	/// exists. The reachability watcher is started after the first attempt
	/// that reached the pipeline.
	pub async fn init(&self) -> Response {
		let _flight = self.flight.lock().await;
		let ctx = self.context();

		let host = ctx.config().host().map(str::to_string);
		let host = match host {
			Ok(host) => host,
			Err(err) => {
				warn!(target: "fh.session", error = %err, "init refused");
				let response = Response::from_error(err);
				ctx.record(&response);
				return response;
			}
		};

		let mut guard = HandshakeGuard::enter(ctx);
		let params = Value::Object(ctx.init_params().to_map());
		info!(target: "fh.session", host = %host, "init handshake");

		let response = self.executor.execute(HttpMethod::Post, &host, INIT_PATH, Some(&params), &Headers::new()).await;
		if response.error().is_some_and(Error::is_precondition) {
			ctx.record(&response);
			return response;
		}

		let response = self.settle(response);
		guard.settled();
		let response = self.ensure_watcher(response);
		ctx.record(&response);
		response
	}

	fn settle(&self, response: Response) -> Response {
		let ctx = self.context();
		match response.parsed().map(RoutingProperties::from_json) {
			Some(Some(props)) => {
				ctx.cache_handshake(&Value::Object(props.raw.clone()));
				ctx.install_routing(props);
				ctx.set_state(SessionState::Ready);
				info!(target: "fh.session", status = ?response.status_code(), "init complete");
				response
			}
			Some(None) => {
				ctx.set_state(SessionState::Failed);
				warn!(target: "fh.session", "handshake body lacks hosts.url or init.trackId");
				response.into_failure(Error::InvalidResponse("handshake body lacks hosts.url or init.trackId".into()))
			}
			None if response.error().is_some_and(|err| err.kind() == ErrorKind::InvalidResponseFormat) => {
				ctx.set_state(SessionState::Failed);
				warn!(target: "fh.session", status = ?response.status_code(), "handshake body is not JSON");
				response
			}
			None => self.fall_back(response),
		}
	}

	/// Replaces a failed handshake with the cached one, unless the platform
	/// rejected the request outright.
	fn fall_back(&self, response: Response) -> Response {
		let ctx = self.context();
		let status = response.status_code();
		if status == Some(400) {
			ctx.set_state(SessionState::Failed);
			return response;
		}

		let cached = ctx
			.cached_handshake()
			.and_then(|body| RoutingProperties::from_json(&body).map(|props| (body, props)));
		let Some((body, props)) = cached else {
			ctx.set_state(SessionState::Failed);
			return response;
		};

		if let Some(err) = response.error() {
			warn!(target: "fh.session", error = %err, status = ?status, "init failed, using cached handshake");
		}
		ctx.install_routing(props);
		ctx.set_state(SessionState::Degraded);
		Response::synthetic(status, body)
	}

	fn ensure_watcher(&self, response: Response) -> Response {
		let ctx = self.context();
		if ctx.watcher_started() {
			return response;
		}
		match ctx.reachability().start_watching() {
			Ok(()) => {
				ctx.mark_watcher_started();
				debug!(target: "fh.reach", "reachability watcher started");
				response
			}
			Err(err) => {
				warn!(target: "fh.reach", error = %err, "reachability watcher failed to start");
				// A failed handshake keeps its own error.
				if response.is_success() {
					response.into_failure(err.into())
				} else {
					response
				}
			}
		}
	}
}

/// Restores the pre-handshake state unless the handshake settled, so a
/// dropped `init` future never leaves the session `Handshaking`.
struct HandshakeGuard<'a> {
	ctx: &'a SessionContext,
	previous: SessionState,
	settled: bool,
}

impl<'a> HandshakeGuard<'a> {
	fn enter(ctx: &'a SessionContext) -> Self {
		let previous = ctx.state();
		ctx.set_state(SessionState::Handshaking);
		Self {
			ctx,
			previous,
			settled: false,
		}
	}

	fn settled(&mut self) {
		self.settled = true;
	}
}

impl Drop for HandshakeGuard<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.ctx.set_state(self.previous);
		}
	}
}

impl std::fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionManager").field("state", &self.state()).finish_non_exhaustive()
	}
}
