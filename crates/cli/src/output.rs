//! JSON rendering of SDK responses.

use fh::{Outcome, Response};
use serde_json::{Value, json};

/// `{ok, status, data}` on success, `{ok, status, error}` on failure.
pub fn envelope(response: &Response) -> Value {
	match response.outcome() {
		Outcome::Success(data) => json!({
			"ok": true,
			"status": response.status_code(),
			"data": data,
		}),
		Outcome::Failure(err) => json!({
			"ok": false,
			"status": response.status_code(),
			"error": {
				"kind": format!("{:?}", err.kind()),
				"message": err.to_string(),
				"payload": err.payload(),
			},
		}),
	}
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json(value: &Value) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

/// Prints the envelope of `response` and reports whether it succeeded.
pub fn print_response(response: &Response) -> anyhow::Result<bool> {
	print_json(&envelope(response))?;
	Ok(response.is_success())
}

#[cfg(test)]
mod tests {
	use fh::Error;

	use super::*;

	#[test]
	fn success_envelope() {
		let response = Response::success(Some(200), b"{}".to_vec(), json!({ "msg": "hi" }));
		assert_eq!(envelope(&response), json!({ "ok": true, "status": 200, "data": { "msg": "hi" } }));
	}

	#[test]
	fn failure_envelope() {
		let response = Response::failure(
			Some(500),
			Vec::new(),
			Error::HttpStatus {
				status: 500,
				message: "db down".into(),
				payload: Some(json!({ "msg": "db down" })),
			},
		);
		let value = envelope(&response);
		assert_eq!(value["ok"], false);
		assert_eq!(value["status"], 500);
		assert_eq!(value["error"]["kind"], "HttpStatusFailure");
		assert_eq!(value["error"]["message"], "db down");
		assert_eq!(value["error"]["payload"]["msg"], "db down");
	}

	#[test]
	fn offline_envelope_has_null_status() {
		let value = envelope(&Response::from_error(Error::Offline));
		assert_eq!(value["status"], Value::Null);
		assert_eq!(value["error"]["message"], "Offline mode");
	}
}
