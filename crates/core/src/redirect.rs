//! Completion detection for browser-based auth redirects.
//!
//! The platform ends an OAuth flow by navigating to a URL whose query carries
//! `status=complete`, e.g.
//! `https://app/?status=complete&sessionToken=S&authResponse=%7B...%7D`.

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Query pair marking the end of the flow.
pub const COMPLETION_KEY: &str = "status";
pub const COMPLETION_VALUE: &str = "complete";

/// Query key whose value is JSON-decoded rather than kept as text.
pub const AUTH_RESPONSE_KEY: &str = "authResponse";

/// Parses a query string into the completion result.
///
/// Returns `Ok(None)` when the query lacks the completion marker. Every pair
/// is percent-decoded; `authResponse` must hold JSON.
pub fn parse_completion(query: &str) -> Result<Option<Map<String, Value>>> {
	let mut result = Map::new();
	let mut complete = false;

	for pair in query.split('&').filter(|pair| !pair.is_empty()) {
		let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
		let key = decode(key)?;
		let value = decode(value)?;

		if key == COMPLETION_KEY && value == COMPLETION_VALUE {
			complete = true;
		}
		let value = if key == AUTH_RESPONSE_KEY {
			serde_json::from_str(&value).map_err(|err| Error::InvalidResponse(format!("{AUTH_RESPONSE_KEY} is not JSON: {err}")))?
		} else {
			Value::String(value)
		};
		result.insert(key, value);
	}

	Ok(complete.then_some(result))
}

/// Completion result carried by a navigated URL, if it marks the end of the
/// flow. Unparseable URLs and malformed results are skipped.
pub fn completion_from_url(url: &str) -> Option<Map<String, Value>> {
	let parsed = match Url::parse(url) {
		Ok(parsed) => parsed,
		Err(err) => {
			debug!(target: "fh.auth", url, error = %err, "ignoring unparseable navigation");
			return None;
		}
	};
	let query = parsed.query()?;
	match parse_completion(query) {
		Ok(result) => result,
		Err(err) => {
			warn!(target: "fh.auth", error = %err, "skipping malformed redirect result");
			None
		}
	}
}

fn decode(text: &str) -> Result<String> {
	urlencoding::decode(text)
		.map(|decoded| decoded.into_owned())
		.map_err(|err| Error::InvalidResponse(format!("redirect query is not valid UTF-8: {err}")))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn completes_with_decoded_auth_response() {
		let result = parse_completion("a=1&status=complete&authResponse=%7B%22x%22%3A1%7D").unwrap().unwrap();
		assert_eq!(result["a"], "1");
		assert_eq!(result["status"], "complete");
		assert_eq!(result["authResponse"], json!({ "x": 1 }));
	}

	#[test]
	fn query_without_marker_is_not_complete() {
		assert!(parse_completion("status=pending&a=1").unwrap().is_none());
		assert!(parse_completion("").unwrap().is_none());
		assert!(parse_completion("complete=status").unwrap().is_none());
	}

	#[test]
	fn values_keep_everything_after_first_equals() {
		let result = parse_completion("status=complete&token=a%3Db=c").unwrap().unwrap();
		assert_eq!(result["token"], "a=b=c");
	}

	#[test]
	fn non_json_auth_response_is_rejected() {
		let err = parse_completion("status=complete&authResponse=nope").unwrap_err();
		assert!(err.to_string().contains("authResponse"));
	}

	#[test]
	fn completion_from_url_reads_query() {
		let result = completion_from_url("https://app.example/cb?status=complete&sessionToken=S").unwrap();
		assert_eq!(result["sessionToken"], "S");
		assert!(completion_from_url("https://app.example/cb").is_none());
		assert!(completion_from_url("not a url").is_none());
		assert!(completion_from_url("https://app.example/cb?status=complete&authResponse=%7B").is_none());
	}
}
