use anyhow::{Context, Result, bail};
use fh::{Fh, Headers, HttpMethod};
use serde_json::Value;
use tracing::{debug, info};

use crate::output;

/// Parses `-H key:value` arguments.
pub fn parse_headers(raw: &[String]) -> Result<Headers> {
	let mut headers = Headers::new();
	for entry in raw {
		let Some((name, value)) = entry.split_once(':') else {
			bail!("header '{entry}' must look like KEY:VALUE");
		};
		let name = name.trim();
		if name.is_empty() {
			bail!("header '{entry}' has an empty name");
		}
		headers.insert(name.to_string(), value.trim().to_string());
	}
	Ok(headers)
}

pub async fn execute(fh: &Fh, path: &str, method: HttpMethod, data: Option<&str>, raw_headers: &[String]) -> Result<bool> {
	let args = data
		.map(serde_json::from_str::<Value>)
		.transpose()
		.context("--data is not valid JSON")?;
	let headers = parse_headers(raw_headers)?;

	let init = fh.init().await;
	if !init.is_success() {
		debug!(target: "fh.cli", "init failed, cloud call skipped");
		return output::print_response(&init);
	}

	info!(target: "fh.cli", %method, path, "cloud call");
	let response = fh.cloud(path, method, args.as_ref(), &headers).await;
	output::print_response(&response)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn headers_split_on_first_colon() {
		let headers = parse_headers(&["x-a: 1".into(), "x-url:https://h:8080".into()]).unwrap();
		assert_eq!(headers["x-a"], "1");
		assert_eq!(headers["x-url"], "https://h:8080");
	}

	#[test]
	fn malformed_headers_are_rejected() {
		assert!(parse_headers(&["no-colon".into()]).is_err());
		assert!(parse_headers(&[": value".into()]).is_err());
	}
}
