//! HTTP transport seam.
//!
//! The SDK issues every call through [`Transport`]. [`ReqwestTransport`] is the
//! production implementation; [`fake::FakeTransport`] scripts responses for
//! tests without a network.

pub mod fake;
mod http;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

pub use http::ReqwestTransport;

use crate::error::Error;

/// Header map sent with a request. Later inserts replace earlier ones.
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	Get,
	Head,
	Delete,
	Post,
	Put,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Head => "HEAD",
			Self::Delete => "DELETE",
			Self::Post => "POST",
			Self::Put => "PUT",
		}
	}

	/// Whether arguments travel as a JSON body rather than as query parameters.
	pub fn carries_body(&self) -> bool {
		matches!(self, Self::Post | Self::Put)
	}
}

impl fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for HttpMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"HEAD" => Ok(Self::Head),
			"DELETE" => Ok(Self::Delete),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			_ => Err(Error::Precondition(format!("unsupported HTTP method: {s}"))),
		}
	}
}

/// Fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
	pub method: HttpMethod,
	pub url: String,
	pub headers: Headers,
	pub body: Option<Vec<u8>>,
}

impl HttpRequest {
	/// Parses the body as JSON. Test helper for inspecting captured requests.
	pub fn json_body(&self) -> Option<Value> {
		self.body.as_deref().and_then(|body| serde_json::from_slice(body).ok())
	}
}

/// Whatever the server answered, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: Vec<u8>,
}

/// Transport-level failure.
///
/// Some HTTP stacks report failing statuses as errors and attach the status
/// and the decoded error body as metadata; those travel in `status` and
/// `payload` so the executor can still classify the failure by status.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct TransportError {
	pub message: String,
	pub status: Option<u16>,
	pub payload: Option<Value>,
}

impl TransportError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			status: None,
			payload: None,
		}
	}

	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);
		self
	}

	pub fn with_payload(mut self, payload: Value) -> Self {
		self.payload = Some(payload);
		self
	}
}

pub type TransportResult = Result<HttpResponse, TransportError>;

/// Sends one HTTP request.
pub trait Transport: Send + Sync {
	fn send(&self, request: HttpRequest) -> Pin<Box<dyn Future<Output = TransportResult> + Send + '_>>;
}
