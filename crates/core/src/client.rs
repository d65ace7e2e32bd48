//! Entry point wiring the session, auth and cloud components together.

use std::sync::Arc;

use fh_protocol::AuthCredentials;
use fh_runtime::{KeyValueStore, MemoryStore, Reachability, RedirectSurface, StaticReachability};
use serde_json::Value;

use crate::auth::{AuthFlow, AuthState};
use crate::cloud::CloudCaller;
use crate::config::Config;
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::executor::RequestExecutor;
use crate::response::Response;
use crate::session::{SessionManager, SessionState};
use crate::transport::{Headers, HttpMethod, ReqwestTransport, Transport};

/// Builder for [`Fh`].
///
/// Defaults: in-memory storage, always-online reachability, `reqwest`
/// transport, no redirect surface.
pub struct FhBuilder {
	config: Config,
	store: Option<Arc<dyn KeyValueStore>>,
	reachability: Option<Arc<dyn Reachability>>,
	transport: Option<Arc<dyn Transport>>,
	redirect: Option<Arc<dyn RedirectSurface>>,
	vendor_id: Option<String>,
}

impl FhBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			store: None,
			reachability: None,
			transport: None,
			redirect: None,
			vendor_id: None,
		}
	}

	pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn reachability(mut self, reachability: Arc<dyn Reachability>) -> Self {
		self.reachability = Some(reachability);
		self
	}

	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn redirect_surface(mut self, surface: Arc<dyn RedirectSurface>) -> Self {
		self.redirect = Some(surface);
		self
	}

	pub fn vendor_id(mut self, vendor_id: impl Into<String>) -> Self {
		self.vendor_id = Some(vendor_id.into());
		self
	}

	pub fn build(self) -> Result<Fh> {
		let transport = match self.transport {
			Some(transport) => transport,
			None => Arc::new(ReqwestTransport::new().map_err(|err| Error::Transport(err.message))?),
		};
		let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));
		let reachability = self.reachability.unwrap_or_else(|| Arc::new(StaticReachability::online()));

		let ctx = Arc::new(SessionContext::new(self.config, store, reachability).with_vendor_id(self.vendor_id));
		let executor = RequestExecutor::new(Arc::clone(&ctx), transport);

		let mut auth = AuthFlow::new(executor.clone());
		if let Some(surface) = self.redirect {
			auth = auth.with_redirect_surface(surface);
		}

		Ok(Fh {
			session: SessionManager::new(executor.clone()),
			cloud: CloudCaller::new(executor),
			auth,
			ctx,
		})
	}
}

/// One SDK session.
///
/// ```ignore
/// let fh = Fh::builder(Config::from_file("fhconfig.json")?).build()?;
/// fh.init().await.into_result()?;
/// let hello = fh.cloud("hello", HttpMethod::Post, Some(&json!({ "hello": "world" })), &Headers::new()).await;
/// ```
pub struct Fh {
	ctx: Arc<SessionContext>,
	session: SessionManager,
	auth: AuthFlow,
	cloud: CloudCaller,
}

impl Fh {
	pub fn builder(config: Config) -> FhBuilder {
		FhBuilder::new(config)
	}

	/// Runs the init handshake. Required before [`Fh::cloud`].
	pub async fn init(&self) -> Response {
		self.session.init().await
	}

	pub async fn auth(&self, policy_id: &str, credentials: Option<AuthCredentials>) -> Response {
		self.auth.authenticate(policy_id, credentials).await
	}

	pub async fn cloud(&self, path: &str, method: HttpMethod, args: Option<&Value>, headers: &Headers) -> Response {
		self.cloud.call(path, method, args, headers).await
	}

	/// Headers a cloud call would carry with no overrides.
	pub fn cloud_headers(&self) -> Headers {
		self.cloud.headers(&Headers::new())
	}

	pub fn context(&self) -> &Arc<SessionContext> {
		&self.ctx
	}

	pub fn state(&self) -> SessionState {
		self.session.state()
	}

	pub fn auth_state(&self) -> AuthState {
		self.auth.state()
	}
}

impl std::fmt::Debug for Fh {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Fh")
			.field("ctx", &self.ctx)
			.field("auth", &self.auth)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::transport::fake::FakeTransportBuilder;

	#[tokio::test]
	async fn init_then_cloud() {
		let (transport, controller) = FakeTransportBuilder::new()
			.with_json(200, json!({ "hosts": { "url": "https://cloud" }, "init": { "trackId": "T" } }))
			.with_json(200, json!({ "msg": "Hello World" }))
			.build();
		let fh = Fh::builder(Config::from_properties([("host", "https://platform"), ("appid", "APP")]))
			.transport(Arc::new(transport))
			.vendor_id("VENDOR")
			.build()
			.unwrap();

		assert!(fh.init().await.is_success());
		assert_eq!(fh.state(), SessionState::Ready);

		let hello = fh.cloud("hello", HttpMethod::Get, None, &Headers::new()).await;
		assert_eq!(hello.into_result().unwrap()["msg"], "Hello World");

		let sent = controller.take_sent();
		let cuid_map = &sent[0].json_body().unwrap()["cuidMap"];
		assert_eq!(cuid_map[1], json!({ "name": "vendorIdentifier", "cuid": "VENDOR" }));
		assert_eq!(sent[1].headers["x-fh-appid"], "APP");
	}

	#[tokio::test]
	async fn cloud_before_init_fails() {
		let (transport, _controller) = FakeTransportBuilder::new().build();
		let fh = Fh::builder(Config::new()).transport(Arc::new(transport)).build().unwrap();

		let response = fh.cloud("hello", HttpMethod::Get, None, &Headers::new()).await;
		assert!(response.error().unwrap().is_precondition());
		assert!(fh.context().last_error().unwrap().is_precondition());
		assert_eq!(fh.auth_state(), AuthState::Idle);
	}
}
