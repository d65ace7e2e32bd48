//! Error taxonomy shared by every SDK operation.
//!
//! Errors travel inside a [`Response`](crate::Response) rather than being
//! returned on their own, so they are `Clone` to allow the session context to
//! retain the most recent one.

use fh_runtime::ReachabilityError;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
	/// Caller error: missing configuration or an operation issued too early.
	/// Never retried.
	#[error("precondition violated: {0}")]
	Precondition(String),

	/// Network, DNS or TLS failure before any HTTP status was available.
	#[error("transport failure: {0}")]
	Transport(String),

	/// Non-2xx response. `message` comes from the diagnostic payload when the
	/// server sent one, otherwise it is the status reason phrase.
	#[error("{message}")]
	HttpStatus {
		status: u16,
		message: String,
		payload: Option<Value>,
	},

	/// 2xx response whose body is not JSON, or lacks required fields.
	#[error("Invalid response format: {0}")]
	InvalidResponse(String),

	/// Short-circuited locally: the device is offline.
	#[error("Offline mode")]
	Offline,

	/// Explicit `status: "error"` from the auth-policy endpoint.
	#[error("{0}")]
	AuthPolicy(String),

	/// The reachability watcher could not be registered.
	#[error("{0}")]
	ReachabilityWatcher(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	PreconditionViolation,
	TransportFailure,
	HttpStatusFailure,
	InvalidResponseFormat,
	NetworkOffline,
	AuthPolicyError,
	ReachabilityWatcher,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Precondition(_) => ErrorKind::PreconditionViolation,
			Self::Transport(_) => ErrorKind::TransportFailure,
			Self::HttpStatus { .. } => ErrorKind::HttpStatusFailure,
			Self::InvalidResponse(_) => ErrorKind::InvalidResponseFormat,
			Self::Offline => ErrorKind::NetworkOffline,
			Self::AuthPolicy(_) => ErrorKind::AuthPolicyError,
			Self::ReachabilityWatcher(_) => ErrorKind::ReachabilityWatcher,
		}
	}

	/// HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::HttpStatus { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Structured diagnostic payload sent by the server with a failure.
	pub fn payload(&self) -> Option<&Value> {
		match self {
			Self::HttpStatus { payload, .. } => payload.as_ref(),
			_ => None,
		}
	}

	pub fn is_offline(&self) -> bool {
		matches!(self, Self::Offline)
	}

	pub fn is_precondition(&self) -> bool {
		matches!(self, Self::Precondition(_))
	}
}

impl From<ReachabilityError> for Error {
	fn from(err: ReachabilityError) -> Self {
		Self::ReachabilityWatcher(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn http_status_displays_server_message() {
		let err = Error::HttpStatus {
			status: 500,
			message: "db down".into(),
			payload: Some(json!({ "msg": "db down" })),
		};
		assert_eq!(err.to_string(), "db down");
		assert_eq!(err.status(), Some(500));
		assert_eq!(err.kind(), ErrorKind::HttpStatusFailure);
		assert_eq!(err.payload().unwrap()["msg"], "db down");
	}

	#[test]
	fn reachability_error_converts() {
		let err: Error = ReachabilityError::Unavailable("no runtime".into()).into();
		assert_eq!(err.kind(), ErrorKind::ReachabilityWatcher);
		assert!(err.to_string().contains("Reachability notifier"));
	}

	#[test]
	fn offline_has_no_status() {
		assert!(Error::Offline.is_offline());
		assert_eq!(Error::Offline.status(), None);
		assert_eq!(Error::Offline.to_string(), "Offline mode");
	}
}
