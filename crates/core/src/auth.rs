//! Auth-policy authentication.
//!
//! Credential policies answer with a session token directly. OAuth policies
//! answer with a URL instead; when a [`RedirectSurface`] is installed the flow
//! presents it and completes from the first navigation carrying
//! `status=complete`.

use std::sync::Arc;

use fh_protocol::{AUTH_PATH, AuthCredentials, AuthRequestBody, AuthResponse};
use fh_runtime::RedirectSurface;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::executor::RequestExecutor;
use crate::redirect;
use crate::response::Response;
use crate::transport::{Headers, HttpMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthState {
	#[default]
	Idle,
	Requesting,
	/// Waiting on the redirect surface, or handed the URL back to the host.
	RedirectRequired,
	Complete,
	Failed,
}

pub struct AuthFlow {
	executor: RequestExecutor,
	surface: Option<Arc<dyn RedirectSurface>>,
	state: Mutex<AuthState>,
}

impl AuthFlow {
	pub fn new(executor: RequestExecutor) -> Self {
		Self {
			executor,
			surface: None,
			state: Mutex::new(AuthState::Idle),
		}
	}

	pub fn with_redirect_surface(mut self, surface: Arc<dyn RedirectSurface>) -> Self {
		self.surface = Some(surface);
		self
	}

	pub fn context(&self) -> &Arc<SessionContext> {
		self.executor.context()
	}

	pub fn state(&self) -> AuthState {
		*self.state.lock()
	}

	fn set_state(&self, state: AuthState) {
		*self.state.lock() = state;
	}

	/// Builds the auth request for `policy_id`. Requires `appid`.
	pub fn request_body(&self, policy_id: &str, credentials: Option<AuthCredentials>) -> Result<AuthRequestBody> {
		let ctx = self.context();
		let client_token = ctx
			.config()
			.get("appid")
			.map(str::to_string)
			.ok_or_else(|| Error::Precondition("configuration must define 'appid' to authenticate".into()))?;

		Ok(AuthRequestBody {
			policy_id: policy_id.to_string(),
			device: ctx.identity().device_id(),
			client_token,
			params: credentials,
			environment: ctx.routing().and_then(|routing| routing.environment.clone()),
		})
	}

	/// Authenticates against `policy_id`.
	///
	/// The returned future does not resolve while a redirect is pending; if the
	/// surface stops reporting without completing, it never resolves. Wrap it in
	/// a timeout where that matters.
	pub async fn authenticate(&self, policy_id: &str, credentials: Option<AuthCredentials>) -> Response {
		let response = self.run(policy_id, credentials).await;
		self.context().record(&response);
		response
	}

	async fn run(&self, policy_id: &str, credentials: Option<AuthCredentials>) -> Response {
		let host = self.context().config().host().map(str::to_string);
		let prepared = host.and_then(|host| Ok((host, self.request_body(policy_id, credentials)?)));
		let (host, body) = match prepared {
			Ok(prepared) => prepared,
			Err(err) => {
				warn!(target: "fh.auth", policy = policy_id, error = %err, "auth refused");
				return Response::from_error(err);
			}
		};
		let body = match serde_json::to_value(&body) {
			Ok(body) => body,
			Err(err) => return Response::from_error(Error::Precondition(format!("auth request not serializable: {err}"))),
		};

		self.set_state(AuthState::Requesting);
		info!(target: "fh.auth", policy = policy_id, "authenticating");
		let response = self.executor.execute(HttpMethod::Post, &host, AUTH_PATH, Some(&body), &Headers::new()).await;

		let reply = match response.parsed() {
			Some(parsed) => serde_json::from_value::<AuthResponse>(parsed.clone()),
			None => {
				self.set_state(AuthState::Failed);
				return response;
			}
		};

		match reply {
			Ok(AuthResponse::Ok { url: Some(url), .. }) => self.redirect(response, &url).await,
			Ok(AuthResponse::Ok { session_token, .. }) => {
				if let Some(token) = session_token.as_deref().filter(|token| !token.is_empty()) {
					self.context().store_session_token(token);
				}
				self.set_state(AuthState::Complete);
				info!(target: "fh.auth", policy = policy_id, "authenticated");
				response
			}
			Ok(AuthResponse::Error { message }) => {
				self.set_state(AuthState::Failed);
				let message = message.unwrap_or_else(|| "auth policy rejected the request".into());
				warn!(target: "fh.auth", policy = policy_id, %message, "auth policy error");
				response.into_failure(Error::AuthPolicy(message))
			}
			Err(err) => {
				self.set_state(AuthState::Failed);
				response.into_failure(Error::InvalidResponse(format!("unexpected auth reply: {err}")))
			}
		}
	}

	async fn redirect(&self, response: Response, url: &str) -> Response {
		if let Err(err) = Url::parse(url) {
			self.set_state(AuthState::Failed);
			return response.into_failure(Error::InvalidResponse(format!("invalid auth redirect URL {url}: {err}")));
		}
		self.set_state(AuthState::RedirectRequired);

		let Some(surface) = self.surface.as_ref() else {
			warn!(target: "fh.auth", url, "auth needs a redirect but no surface is installed");
			return response;
		};

		debug!(target: "fh.auth", url, "presenting redirect");
		let mut navigations = surface.present(url);
		while let Some(navigation) = navigations.recv().await {
			let Some(result) = redirect::completion_from_url(&navigation) else {
				continue;
			};
			surface.dismiss();
			if let Some(token) = result.get("sessionToken").and_then(Value::as_str).filter(|token| !token.is_empty()) {
				self.context().store_session_token(token);
			}
			self.set_state(AuthState::Complete);
			info!(target: "fh.auth", "redirect complete");
			return Response::synthetic(None, Value::Object(result));
		}

		debug!(target: "fh.auth", "redirect surface closed without completing");
		std::future::pending().await
	}
}

impl std::fmt::Debug for AuthFlow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthFlow")
			.field("state", &self.state())
			.field("redirect_surface", &self.surface.is_some())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use fh_runtime::{ChannelRedirect, MemoryStore, StaticReachability};
	use serde_json::json;

	use super::*;
	use crate::config::Config;
	use crate::error::ErrorKind;
	use crate::routing::RoutingProperties;
	use crate::transport::fake::{FakeTransportBuilder, FakeTransportController};

	fn flow(config: Config) -> (AuthFlow, FakeTransportController) {
		let ctx = Arc::new(SessionContext::new(config, Arc::new(MemoryStore::new()), Arc::new(StaticReachability::online())));
		let (transport, controller) = FakeTransportBuilder::new().build();
		(AuthFlow::new(RequestExecutor::new(ctx, Arc::new(transport))), controller)
	}

	fn config() -> Config {
		Config::from_properties([("host", "https://platform"), ("appid", "APP")])
	}

	#[tokio::test]
	async fn token_reply_is_persisted() {
		let (auth, controller) = flow(config());
		controller.respond_json(200, json!({ "status": "ok", "sessionToken": "abc" }));

		let response = auth.authenticate("LdapPolicy", Some(AuthCredentials::new("u", "p"))).await;
		assert!(response.is_success());
		assert_eq!(auth.state(), AuthState::Complete);
		assert_eq!(auth.context().session_token().as_deref(), Some("abc"));

		let sent = controller.take_sent();
		assert_eq!(sent[0].url, "https://platform/box/srv/1.1/admin/authpolicy/auth");
		let body = sent[0].json_body().unwrap();
		assert_eq!(body["policyId"], "LdapPolicy");
		assert_eq!(body["clientToken"], "APP");
		assert_eq!(body["params"], json!({ "userId": "u", "password": "p" }));
		assert!(body.get("environment").is_none());
	}

	#[tokio::test]
	async fn error_reply_carries_message() {
		let (auth, controller) = flow(config());
		controller.respond_json(200, json!({ "status": "error", "message": "bad creds" }));

		let response = auth.authenticate("LdapPolicy", None).await;
		let err = response.error().unwrap();
		assert_eq!(err.kind(), ErrorKind::AuthPolicyError);
		assert_eq!(err.to_string(), "bad creds");
		assert_eq!(response.status_code(), Some(200));
		assert_eq!(auth.state(), AuthState::Failed);
	}

	#[tokio::test]
	async fn unknown_status_is_invalid() {
		let (auth, controller) = flow(config());
		controller.respond_json(200, json!({ "status": "maybe" }));

		let response = auth.authenticate("P", None).await;
		assert_eq!(response.error().unwrap().kind(), ErrorKind::InvalidResponseFormat);
	}

	#[tokio::test]
	async fn http_failure_propagates() {
		let (auth, controller) = flow(config());
		controller.respond_json(500, json!({ "status": "error" }));

		let response = auth.authenticate("P", None).await;
		assert_eq!(response.error().unwrap().status(), Some(500));
		assert_eq!(auth.state(), AuthState::Failed);
	}

	#[tokio::test]
	async fn missing_appid_is_a_precondition() {
		let (auth, controller) = flow(Config::from_properties([("host", "https://platform")]));

		let response = auth.authenticate("P", None).await;
		assert!(response.error().unwrap().is_precondition());
		assert_eq!(controller.sent_count(), 0);
		assert_eq!(auth.state(), AuthState::Idle);
	}

	#[tokio::test]
	async fn environment_comes_from_routing() {
		let (auth, controller) = flow(config());
		auth.context().install_routing(
			RoutingProperties::from_json(&json!({ "hosts": { "url": "https://c", "environment": "dev" }, "init": { "trackId": "T" } })).unwrap(),
		);
		controller.respond_json(200, json!({ "status": "ok" }));

		auth.authenticate("P", None).await;
		assert_eq!(controller.take_sent()[0].json_body().unwrap()["environment"], "dev");
	}

	#[tokio::test]
	async fn url_without_surface_returns_reply() {
		let (auth, controller) = flow(config());
		controller.respond_json(200, json!({ "status": "ok", "url": "https://accounts.example/auth" }));

		let response = auth.authenticate("Google", None).await;
		assert_eq!(response.parsed().unwrap()["url"], "https://accounts.example/auth");
		assert_eq!(auth.state(), AuthState::RedirectRequired);
	}

	#[tokio::test]
	async fn redirect_completes_once_on_marker() {
		let (auth, controller) = flow(config());
		let (surface, redirect) = ChannelRedirect::new();
		let auth = auth.with_redirect_surface(Arc::new(surface));
		controller.respond_json(200, json!({ "status": "ok", "url": "https://accounts.example/auth" }));

		redirect.navigate("https://app.example/cb?status=pending");
		redirect.navigate("https://app.example/cb?a=1&status=complete&sessionToken=S&authResponse=%7B%22x%22%3A1%7D");
		redirect.navigate("https://app.example/cb?status=complete&b=2");

		let response = auth.authenticate("Google", None).await;
		let result = response.parsed().unwrap();
		assert_eq!(result["a"], "1");
		assert_eq!(result["authResponse"], json!({ "x": 1 }));
		assert!(result.get("b").is_none());
		assert_eq!(response.status_code(), None);

		assert_eq!(redirect.presented(), vec!["https://accounts.example/auth".to_string()]);
		assert_eq!(redirect.dismissals(), 1);
		assert_eq!(auth.state(), AuthState::Complete);
		assert_eq!(auth.context().session_token().as_deref(), Some("S"));
	}

	#[tokio::test]
	async fn redirect_without_marker_never_completes() {
		let (auth, controller) = flow(config());
		let (surface, redirect) = ChannelRedirect::new();
		let auth = auth.with_redirect_surface(Arc::new(surface));
		controller.respond_json(200, json!({ "status": "ok", "url": "https://accounts.example/auth" }));

		redirect.navigate("https://app.example/cb?status=pending");
		let pending = tokio::time::timeout(Duration::from_millis(100), auth.authenticate("Google", None)).await;
		assert!(pending.is_err());
		assert_eq!(redirect.dismissals(), 0);
		assert_eq!(auth.state(), AuthState::RedirectRequired);
	}

	#[tokio::test]
	async fn invalid_redirect_url_is_rejected() {
		let (auth, controller) = flow(config());
		controller.respond_json(200, json!({ "status": "ok", "url": "::not a url" }));

		let response = auth.authenticate("Google", None).await;
		assert_eq!(response.error().unwrap().kind(), ErrorKind::InvalidResponseFormat);
		assert_eq!(auth.state(), AuthState::Failed);
	}
}
