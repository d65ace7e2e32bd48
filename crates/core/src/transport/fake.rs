//! Fake transport for unit testing the request pipeline.
//!
//! Responses are scripted in order through a [`FakeTransportController`];
//! every request the SDK sends is captured for inspection.
//!
//! # Example
//!
//! ```ignore
//! let (transport, controller) = FakeTransportBuilder::new().build();
//! controller.respond_json(200, json!({ "hosts": { "url": "https://cloud" }, "init": { "trackId": "T" } }));
//!
//! let session = SessionManager::new(ctx, Arc::new(transport));
//! let response = session.init().await;
//!
//! let sent = controller.take_sent();
//! assert_eq!(sent[0].url, "https://platform/box/srv/1.1/app/init");
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value as JsonValue;

use super::{HttpRequest, HttpResponse, Transport, TransportError, TransportResult};

/// Builder for creating fake transport instances.
#[derive(Default)]
pub struct FakeTransportBuilder {
	script: Vec<TransportResult>,
}

impl FakeTransportBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pre-loads a response before the transport is shared.
	pub fn with_json(mut self, status: u16, body: JsonValue) -> Self {
		self.script.push(Ok(json_response(status, &body)));
		self
	}

	/// Build the fake transport and its controller.
	pub fn build(self) -> (FakeTransport, FakeTransportController) {
		let shared = Arc::new(Mutex::new(FakeState {
			script: self.script.into(),
			sent: Vec::new(),
		}));
		(
			FakeTransport {
				shared: Arc::clone(&shared),
			},
			FakeTransportController { shared },
		)
	}
}

struct FakeState {
	script: VecDeque<TransportResult>,
	sent: Vec<HttpRequest>,
}

/// In-memory [`Transport`] answering from a script.
///
/// Once the script runs dry every request fails with a transport error.
pub struct FakeTransport {
	shared: Arc<Mutex<FakeState>>,
}

/// Controller for scripting responses and inspecting sent requests.
#[derive(Clone)]
pub struct FakeTransportController {
	shared: Arc<Mutex<FakeState>>,
}

fn json_response(status: u16, body: &JsonValue) -> HttpResponse {
	HttpResponse {
		status,
		body: serde_json::to_vec(body).unwrap_or_default(),
	}
}

impl FakeTransportController {
	/// Queue a JSON response.
	pub fn respond_json(&self, status: u16, body: JsonValue) {
		self.push(Ok(json_response(status, &body)));
	}

	/// Queue a response with an arbitrary body.
	pub fn respond_raw(&self, status: u16, body: impl Into<Vec<u8>>) {
		self.push(Ok(HttpResponse { status, body: body.into() }));
	}

	/// Queue a transport failure.
	pub fn fail(&self, error: TransportError) {
		self.push(Err(error));
	}

	fn push(&self, result: TransportResult) {
		self.shared.lock().script.push_back(result);
	}

	/// Take all sent requests, clearing the buffer.
	pub fn take_sent(&self) -> Vec<HttpRequest> {
		std::mem::take(&mut self.shared.lock().sent)
	}

	pub fn sent_count(&self) -> usize {
		self.shared.lock().sent.len()
	}
}

impl Transport for FakeTransport {
	fn send(&self, request: HttpRequest) -> Pin<Box<dyn Future<Output = TransportResult> + Send + '_>> {
		let result = {
			let mut state = self.shared.lock();
			state.sent.push(request);
			state.script.pop_front()
		};
		Box::pin(async move { result.unwrap_or_else(|| Err(TransportError::new("fake transport: no scripted response"))) })
	}
}
