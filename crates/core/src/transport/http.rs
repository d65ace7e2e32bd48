//! `reqwest`-backed transport.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, Method};
use tracing::trace;

use super::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, TransportResult};

/// Production transport. Non-2xx statuses are returned as responses, never as
/// errors; only connection-level failures become [`TransportError`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

	pub fn new() -> Result<Self, TransportError> {
		Self::with_timeout(Self::DEFAULT_TIMEOUT)
	}

	pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|err| TransportError::new(format!("failed to build HTTP client: {err}")))?;
		Ok(Self { client })
	}

	pub fn from_client(client: Client) -> Self {
		Self { client }
	}
}

fn method(method: HttpMethod) -> Method {
	match method {
		HttpMethod::Get => Method::GET,
		HttpMethod::Head => Method::HEAD,
		HttpMethod::Delete => Method::DELETE,
		HttpMethod::Post => Method::POST,
		HttpMethod::Put => Method::PUT,
	}
}

fn transport_error(err: reqwest::Error) -> TransportError {
	let error = TransportError::new(err.to_string());
	match err.status() {
		Some(status) => error.with_status(status.as_u16()),
		None => error,
	}
}

impl Transport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> Pin<Box<dyn Future<Output = TransportResult> + Send + '_>> {
		Box::pin(async move {
			let mut builder = self.client.request(method(request.method), &request.url);
			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(transport_error)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(transport_error)?.to_vec();
			trace!(target: "fh.http", status, bytes = body.len(), "response received");
			Ok(HttpResponse { status, body })
		})
	}
}
