//! Wire-level token and token-key payloads returned by the UAA server.

// self
use crate::_prelude::*;

/// Access token issued by the `client_credentials` grant.
///
/// Values are immutable once decoded; the only way to obtain one is a successful token response
/// (or a cached copy of one).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Opaque bearer credential.
	pub access_token: TokenSecret,
	/// Lifetime in seconds, relative to issuance, as reported by the server.
	pub expires_in: i64,
}
impl Token {
	/// Decodes a token endpoint response body.
	pub fn from_slice(body: &[u8]) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Lifetime reported by the server.
	pub fn lifetime(&self) -> Duration {
		Duration::seconds(self.expires_in)
	}
}

/// Redacted token secret wrapper keeping bearer credentials out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Verification key published at `/token_key`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenKey {
	/// Signing algorithm advertised alongside the key.
	#[serde(default)]
	pub alg: Option<String>,
	/// Key material; empty when the server omits the field.
	#[serde(default)]
	pub value: String,
}
impl TokenKey {
	/// Decodes a key endpoint response body.
	pub fn from_slice(body: &[u8]) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
	}
}
