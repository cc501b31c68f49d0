//! Session configuration and token endpoint payloads.

use serde::{Deserialize, Serialize};

/// Engine bootstrap configuration.
///
/// Deserializes from a partial object; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOptions {
	/// Engine UI language. Default `"en"`.
	pub language: String,
	/// Engine script version segment. Default `"5.x.x"`.
	pub version: String,
	/// Optional engine libraries loaded after the runtime script.
	pub libraries: Vec<String>,
	/// Total token fetch attempts. Default 3.
	pub token_fetch_retries: u32,
	/// Delay between token fetch attempts in milliseconds. Default 2000.
	pub token_fetch_retry_delay: u64,
	/// Total script load attempts per resource. Default 3.
	pub script_load_retries: u32,
	/// Delay between script load attempts in milliseconds. Default 2000.
	pub script_load_retry_delay: u64,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			language: "en".to_string(),
			version: "5.x.x".to_string(),
			libraries: Vec::new(),
			token_fetch_retries: 3,
			token_fetch_retry_delay: 2000,
			script_load_retries: 3,
			script_load_retry_delay: 2000,
		}
	}
}

/// Body returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
	pub token: String,
	/// Expiry as unix seconds.
	pub expires_at: i64,
}
