//! Calls to the cloud app discovered by the handshake.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::SessionContext;
use crate::error::Error;
use crate::executor::RequestExecutor;
use crate::response::Response;
use crate::transport::{Headers, HttpMethod};

pub const SESSION_TOKEN_HEADER: &str = "x-fh-sessionToken";

/// Prefix for the init parameters mirrored onto cloud requests.
pub const HEADER_PREFIX: &str = "x-fh-";

pub struct CloudCaller {
	executor: RequestExecutor,
}

impl CloudCaller {
	pub fn new(executor: RequestExecutor) -> Self {
		Self { executor }
	}

	pub fn context(&self) -> &Arc<SessionContext> {
		self.executor.context()
	}

	/// Headers attached to a cloud call: session token, then one `x-fh-<key>`
	/// per init parameter, then `overrides`.
	pub fn headers(&self, overrides: &Headers) -> Headers {
		let ctx = self.context();
		let mut headers = Headers::new();
		if let Some(token) = ctx.session_token() {
			headers.insert(SESSION_TOKEN_HEADER.to_string(), token);
		}
		for (key, value) in ctx.init_params().to_map() {
			let value = match value {
				Value::String(text) => text,
				other => other.to_string(),
			};
			headers.insert(format!("{HEADER_PREFIX}{key}"), value);
		}
		headers.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
		headers
	}

	/// Calls `path` on the cloud host. Requires a completed `init`.
	pub async fn call(&self, path: &str, method: HttpMethod, args: Option<&Value>, headers: &Headers) -> Response {
		let ctx = self.context();
		let Some(routing) = ctx.routing() else {
			warn!(target: "fh.cloud", path, "cloud call before init");
			let response = Response::from_error(Error::Precondition("cloud calls require a successful init".into()));
			ctx.record(&response);
			return response;
		};

		debug!(target: "fh.cloud", %method, path, host = %routing.cloud_host, "cloud call");
		let response = self
			.executor
			.execute(method, &routing.cloud_host, path, args, &self.headers(headers))
			.await;
		ctx.record(&response);
		response
	}
}

impl std::fmt::Debug for CloudCaller {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CloudCaller").finish_non_exhaustive()
	}
}
