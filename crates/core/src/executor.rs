//! Single HTTP call with JSON framing and response normalization.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::response::Response;
use crate::transport::{Headers, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, TransportResult};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Issues requests on behalf of the session, auth and cloud components.
///
/// Never retries. The returned future resolves in the caller's task.
#[derive(Clone)]
pub struct RequestExecutor {
	ctx: Arc<SessionContext>,
	transport: Arc<dyn Transport>,
}

impl RequestExecutor {
	pub fn new(ctx: Arc<SessionContext>, transport: Arc<dyn Transport>) -> Self {
		Self { ctx, transport }
	}

	pub fn context(&self) -> &Arc<SessionContext> {
		&self.ctx
	}

	/// Sends `method host/path` and folds every outcome into a [`Response`].
	///
	/// Short-circuits with [`Error::Offline`] once routing properties exist and
	/// the device is offline; before the first handshake the transport is
	/// always attempted.
	pub async fn execute(&self, method: HttpMethod, host: &str, path: &str, args: Option<&Value>, headers: &Headers) -> Response {
		if self.ctx.is_offline() {
			debug!(target: "fh.http", %method, path, "offline, request not sent");
			return Response::from_error(Error::Offline);
		}

		let request = match build_request(method, host, path, args, headers) {
			Ok(request) => request,
			Err(err) => return Response::from_error(err),
		};

		debug!(target: "fh.http", %method, url = %request.url, "sending request");
		let response = normalize(self.transport.send(request).await);
		match response.error() {
			None => debug!(target: "fh.http", %method, path, status = ?response.status_code(), "request succeeded"),
			Some(err) => warn!(target: "fh.http", %method, path, status = ?response.status_code(), error = %err, "request failed"),
		}
		response
	}
}

impl std::fmt::Debug for RequestExecutor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RequestExecutor").finish_non_exhaustive()
	}
}

/// Joins `host` and `path` with exactly one `/` between them.
pub fn join_url(host: &str, path: &str) -> String {
	format!("{}/{}", host.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn build_request(method: HttpMethod, host: &str, path: &str, args: Option<&Value>, headers: &Headers) -> Result<HttpRequest> {
	let joined = join_url(host, path);
	let mut url = Url::parse(&joined).map_err(|err| Error::Precondition(format!("invalid URL {joined}: {err}")))?;

	let mut body = None;
	match args {
		None | Some(Value::Null) => {}
		Some(args) if method.carries_body() => {
			body = Some(serde_json::to_vec(args).map_err(|err| Error::Precondition(format!("arguments not serializable: {err}")))?);
		}
		Some(Value::Object(args)) if args.is_empty() => {}
		Some(Value::Object(args)) => {
			let mut query = url.query_pairs_mut();
			for (key, value) in args {
				match value {
					Value::String(text) => query.append_pair(key, text),
					other => query.append_pair(key, &other.to_string()),
				};
			}
		}
		Some(_) => return Err(Error::Precondition(format!("{method} arguments must be a JSON object"))),
	}

	let mut all_headers = Headers::new();
	all_headers.insert("Content-Type".into(), JSON_CONTENT_TYPE.into());
	all_headers.insert("Accept".into(), JSON_CONTENT_TYPE.into());
	all_headers.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));

	Ok(HttpRequest {
		method,
		url: url.into(),
		headers: all_headers,
		body,
	})
}

/// Empty bodies read as `null`; anything else must be JSON.
fn parse_body(body: &[u8]) -> Option<Value> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Some(Value::Null);
	}
	serde_json::from_slice(body).ok()
}

/// Message of a failed response: payload `msg`, then `message`, then the
/// status reason phrase.
fn failure_message(status: u16, payload: Option<&Value>) -> String {
	let from_payload = payload.and_then(|payload| {
		["msg", "message"]
			.iter()
			.find_map(|key| payload.get(key).and_then(Value::as_str))
			.map(str::to_string)
	});
	from_payload.unwrap_or_else(|| {
		StatusCode::from_u16(status)
			.ok()
			.and_then(|code| code.canonical_reason())
			.map_or_else(|| format!("HTTP {status}"), str::to_string)
	})
}

/// Maps whatever the transport produced onto an envelope.
pub(crate) fn normalize(result: TransportResult) -> Response {
	match result {
		Ok(HttpResponse { status, body }) => {
			let parsed = parse_body(&body);
			if (200..300).contains(&status) {
				return match parsed {
					Some(value) => Response::success(Some(status), body, value),
					None => Response::failure(Some(status), body, Error::InvalidResponse("response body is not JSON".into())),
				};
			}
			let payload = parsed.filter(|value| !value.is_null());
			let error = Error::HttpStatus {
				status,
				message: failure_message(status, payload.as_ref()),
				payload,
			};
			Response::failure(Some(status), body, error)
		}
		Err(err) => normalize_transport_error(err),
	}
}

fn normalize_transport_error(err: TransportError) -> Response {
	let raw = err.payload.as_ref().and_then(|payload| serde_json::to_vec(payload).ok()).unwrap_or_default();
	match err.status {
		Some(status) => {
			let error = Error::HttpStatus {
				status,
				message: failure_message(status, err.payload.as_ref()),
				payload: err.payload,
			};
			Response::failure(Some(status), raw, error)
		}
		None => {
			let message = err
				.payload
				.as_ref()
				.and_then(|payload| ["msg", "message"].iter().find_map(|key| payload.get(key).and_then(Value::as_str)))
				.map_or(err.message.clone(), str::to_string);
			Response::failure(None, raw, Error::Transport(message))
		}
	}
}
