//! The uniform result of every network operation.

use std::borrow::Cow;

use serde_json::Value;

use crate::error::{Error, Result};

/// Logical state of a [`Response`]: exactly one of parsed JSON or an error.
#[derive(Debug, Clone)]
pub enum Outcome {
	Success(Value),
	Failure(Error),
}

/// Envelope returned by init, auth and cloud calls.
///
/// `status_code` is absent when no HTTP status was ever observed (transport
/// failure, offline short-circuit, precondition violation, redirect
/// completion). The raw body is kept for both outcomes.
#[derive(Debug, Clone)]
pub struct Response {
	status_code: Option<u16>,
	raw: Vec<u8>,
	outcome: Outcome,
}

impl Response {
	pub fn success(status_code: Option<u16>, raw: Vec<u8>, parsed: Value) -> Self {
		Self {
			status_code,
			raw,
			outcome: Outcome::Success(parsed),
		}
	}

	pub fn failure(status_code: Option<u16>, raw: Vec<u8>, error: Error) -> Self {
		Self {
			status_code,
			raw,
			outcome: Outcome::Failure(error),
		}
	}

	/// Failure with neither status nor body.
	pub fn from_error(error: Error) -> Self {
		Self::failure(None, Vec::new(), error)
	}

	/// Success built from a JSON value, with the pretty-printed value as raw body.
	pub(crate) fn synthetic(status_code: Option<u16>, parsed: Value) -> Self {
		let raw = serde_json::to_vec_pretty(&parsed).unwrap_or_default();
		Self::success(status_code, raw, parsed)
	}

	/// Replaces the outcome with `error`, keeping status and raw body.
	pub(crate) fn into_failure(self, error: Error) -> Self {
		Self {
			outcome: Outcome::Failure(error),
			..self
		}
	}

	pub fn status_code(&self) -> Option<u16> {
		self.status_code
	}

	pub fn raw(&self) -> &[u8] {
		&self.raw
	}

	/// Raw body decoded as UTF-8, invalid sequences replaced.
	pub fn raw_text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.raw)
	}

	pub fn outcome(&self) -> &Outcome {
		&self.outcome
	}

	pub fn parsed(&self) -> Option<&Value> {
		match &self.outcome {
			Outcome::Success(value) => Some(value),
			Outcome::Failure(_) => None,
		}
	}

	pub fn error(&self) -> Option<&Error> {
		match &self.outcome {
			Outcome::Success(_) => None,
			Outcome::Failure(err) => Some(err),
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self.outcome, Outcome::Success(_))
	}

	pub fn into_result(self) -> Result<Value> {
		match self.outcome {
			Outcome::Success(value) => Ok(value),
			Outcome::Failure(err) => Err(err),
		}
	}
}
