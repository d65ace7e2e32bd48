//! Auth-policy request and response shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Username/password pair forwarded to credential-based policies.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCredentials {
	pub user_id: String,
	pub password: String,
}

impl AuthCredentials {
	pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for AuthCredentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthCredentials")
			.field("user_id", &self.user_id)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Body of `POST /box/srv/1.1/admin/authpolicy/auth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequestBody {
	pub policy_id: String,
	pub device: String,
	pub client_token: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<AuthCredentials>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub environment: Option<String>,
}

/// Auth endpoint reply, discriminated by its `status` field.
///
/// ```json
/// { "status": "ok", "sessionToken": "abc" }
/// { "status": "ok", "url": "https://accounts.example.com/o/oauth2/auth?..." }
/// { "status": "error", "message": "bad creds" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuthResponse {
	Ok {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		url: Option<String>,
		#[serde(rename = "sessionToken", default, skip_serializing_if = "Option::is_none")]
		session_token: Option<String>,
	},
	Error {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		message: Option<String>,
	},
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn request_omits_missing_params_and_environment() {
		let body = AuthRequestBody {
			policy_id: "Google".into(),
			device: "DEVICE".into(),
			client_token: "app".into(),
			params: None,
			environment: None,
		};
		assert_eq!(
			serde_json::to_value(&body).unwrap(),
			json!({ "policyId": "Google", "device": "DEVICE", "clientToken": "app" })
		);
	}

	#[test]
	fn request_nests_credentials_under_params() {
		let body = AuthRequestBody {
			policy_id: "ldap".into(),
			device: "DEVICE".into(),
			client_token: "app".into(),
			params: Some(AuthCredentials::new("Henrik", "secret")),
			environment: Some("ENV".into()),
		};
		let value = serde_json::to_value(&body).unwrap();
		assert_eq!(value["params"], json!({ "userId": "Henrik", "password": "secret" }));
		assert_eq!(value["environment"], "ENV");
	}

	#[test]
	fn response_variants_follow_status() {
		let ok: AuthResponse = serde_json::from_value(json!({ "status": "ok", "sessionToken": "T", "cachekey": "x" })).unwrap();
		assert_eq!(
			ok,
			AuthResponse::Ok {
				url: None,
				session_token: Some("T".into())
			}
		);

		let err: AuthResponse = serde_json::from_value(json!({ "status": "error", "message": "bad creds" })).unwrap();
		assert_eq!(
			err,
			AuthResponse::Error {
				message: Some("bad creds".into())
			}
		);

		assert!(serde_json::from_value::<AuthResponse>(json!({ "status": "pending" })).is_err());
	}

	#[test]
	fn credentials_debug_hides_password() {
		let rendered = format!("{:?}", AuthCredentials::new("u", "hunter2"));
		assert!(!rendered.contains("hunter2"));
	}
}
