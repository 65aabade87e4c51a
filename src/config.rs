//! Client configuration as supplied by an external loader, plus its validated form.

// std
use std::path::PathBuf;
// crates.io
use oauth2::{ClientId, ClientSecret};
use serde::{Deserializer, de::Error as _};
// self
use crate::{_prelude::*, error::ConfigError, obs, retry::RetryPolicy};

/// Expiration buffer applied when the configured value is negative.
pub const DEFAULT_EXPIRATION_BUFFER_IN_SEC: i64 = 30;

/// Raw client settings.
///
/// The struct deserializes from any serde format; every field is optional on the wire and falls
/// back to [`ClientConfig::default`]. `retry_interval` is read from `retry_interval_ms`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Base address of the UAA server (e.g. `https://uaa.service.internal:8443`).
	pub uaa_endpoint: String,
	/// OAuth client identifier used for HTTP Basic authentication.
	pub client_name: String,
	/// OAuth client secret used for HTTP Basic authentication.
	pub client_secret: String,
	/// Retries allowed after the first token request; `0` disables retrying.
	pub max_number_of_retries: u32,
	/// Fixed delay between token request attempts.
	#[serde(rename = "retry_interval_ms", deserialize_with = "deserialize_millis")]
	pub retry_interval: Duration,
	/// Seconds subtracted from a token's lifetime before it is considered due for renewal.
	pub expiration_buffer_in_sec: i64,
	/// TLS material forwarded to the HTTP transport.
	pub tls: TlsConfig,
}
impl ClientConfig {
	/// Checks required fields and derives endpoint URLs.
	///
	/// A negative expiration buffer is replaced by [`DEFAULT_EXPIRATION_BUFFER_IN_SEC`]; the
	/// substitution is logged and reported by [`ValidatedConfig::expiration_buffer_defaulted`].
	pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
		if self.client_name.is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}
		if self.uaa_endpoint.is_empty() {
			return Err(ConfigError::MissingEndpoint);
		}

		let base = self.uaa_endpoint.trim_end_matches('/');
		let token_url = endpoint_url(base, "oauth/token")?;
		let key_url = endpoint_url(base, "token_key")?;
		let expiration_buffer_defaulted = self.expiration_buffer_in_sec < 0;
		let buffer_secs = if expiration_buffer_defaulted {
			obs::record_expiration_buffer_defaulted(
				self.expiration_buffer_in_sec,
				DEFAULT_EXPIRATION_BUFFER_IN_SEC,
			);

			DEFAULT_EXPIRATION_BUFFER_IN_SEC
		} else {
			self.expiration_buffer_in_sec
		};

		Ok(ValidatedConfig {
			token_url,
			key_url,
			client_id: ClientId::new(self.client_name),
			client_secret: ClientSecret::new(self.client_secret),
			retry: RetryPolicy::new(self.max_number_of_retries, self.retry_interval),
			expiration_buffer: Duration::seconds(buffer_secs),
			expiration_buffer_defaulted,
			tls: self.tls,
		})
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			uaa_endpoint: String::new(),
			client_name: String::new(),
			client_secret: String::new(),
			max_number_of_retries: 0,
			retry_interval: Duration::ZERO,
			expiration_buffer_in_sec: DEFAULT_EXPIRATION_BUFFER_IN_SEC,
			tls: TlsConfig::default(),
		}
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("uaa_endpoint", &self.uaa_endpoint)
			.field("client_name", &self.client_name)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("max_number_of_retries", &self.max_number_of_retries)
			.field("retry_interval", &self.retry_interval)
			.field("expiration_buffer_in_sec", &self.expiration_buffer_in_sec)
			.field("tls", &self.tls)
			.finish()
	}
}

/// TLS parameters consumed by [`ReqwestHttpClient::from_tls`](crate::http::ReqwestHttpClient).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
	/// PEM client certificate presented for mutual TLS.
	pub client_cert_file: Option<PathBuf>,
	/// PEM private key matching `client_cert_file`.
	pub client_key_file: Option<PathBuf>,
	/// PEM bundle of additional trusted CA certificates.
	pub ca_cert_file: Option<PathBuf>,
	/// Disables server certificate and hostname verification.
	pub skip_verification: bool,
}

/// Immutable settings owned by a constructed client.
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
	/// `{endpoint}/oauth/token`.
	pub token_url: Url,
	/// `{endpoint}/token_key`.
	pub key_url: Url,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret.
	pub client_secret: ClientSecret,
	/// Token request retry budget and pacing.
	pub retry: RetryPolicy,
	/// Safety margin subtracted from token lifetimes.
	pub expiration_buffer: Duration,
	/// TLS material forwarded to the transport.
	pub tls: TlsConfig,
	expiration_buffer_defaulted: bool,
}
impl ValidatedConfig {
	/// Whether a negative expiration buffer was replaced by the default.
	pub fn expiration_buffer_defaulted(&self) -> bool {
		self.expiration_buffer_defaulted
	}
}

fn endpoint_url(base: &str, path: &str) -> Result<Url, ConfigError> {
	let raw = format!("{base}/{path}");

	Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint: raw, source })
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: Deserializer<'de>,
{
	let millis = u64::deserialize(deserializer)?;
	let millis = i64::try_from(millis).map_err(D::Error::custom)?;

	Ok(Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_config;

	#[test]
	fn validation_rejects_missing_credentials_and_endpoint() {
		let err = ClientConfig { client_name: String::new(), ..test_config() }
			.validate()
			.expect_err("Empty client id should be rejected.");

		assert!(matches!(err, ConfigError::MissingClientId));
		assert_eq!(err.to_string(), "OAuth Client ID cannot be empty.");

		let err = ClientConfig { client_secret: String::new(), ..test_config() }
			.validate()
			.expect_err("Empty client secret should be rejected.");

		assert!(matches!(err, ConfigError::MissingClientSecret));

		let err = ClientConfig { uaa_endpoint: String::new(), ..test_config() }
			.validate()
			.expect_err("Empty endpoint should be rejected.");

		assert!(matches!(err, ConfigError::MissingEndpoint));
	}

	#[test]
	fn validation_rejects_unparseable_endpoint() {
		let err = ClientConfig { uaa_endpoint: "not a url".into(), ..test_config() }
			.validate()
			.expect_err("Relative endpoint should be rejected.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
	}

	#[test]
	fn negative_buffer_falls_back_to_default() {
		let validated = ClientConfig { expiration_buffer_in_sec: -1, ..test_config() }
			.validate()
			.expect("Negative buffer should not fail validation.");

		assert!(validated.expiration_buffer_defaulted());
		assert_eq!(
			validated.expiration_buffer,
			Duration::seconds(DEFAULT_EXPIRATION_BUFFER_IN_SEC)
		);
	}

	#[test]
	fn zero_retries_and_explicit_buffer_are_kept() {
		let validated =
			ClientConfig { max_number_of_retries: 0, expiration_buffer_in_sec: 5, ..test_config() }
				.validate()
				.expect("Zero retries should be accepted.");

		assert!(!validated.expiration_buffer_defaulted());
		assert_eq!(validated.expiration_buffer, Duration::seconds(5));
		assert_eq!(validated.retry.max_retries(), 0);
	}

	#[test]
	fn endpoints_derive_from_base_with_or_without_trailing_slash() {
		for base in ["https://uaa.example.com:8443", "https://uaa.example.com:8443/"] {
			let validated = ClientConfig { uaa_endpoint: base.into(), ..test_config() }
				.validate()
				.expect("Endpoint should parse.");

			assert_eq!(validated.token_url.as_str(), "https://uaa.example.com:8443/oauth/token");
			assert_eq!(validated.key_url.as_str(), "https://uaa.example.com:8443/token_key");
		}

		let validated =
			ClientConfig { uaa_endpoint: "https://example.com/uaa".into(), ..test_config() }
				.validate()
				.expect("Endpoint with a path should parse.");

		assert_eq!(validated.token_url.path(), "/uaa/oauth/token");
	}

	#[test]
	fn config_deserializes_with_defaults() {
		let config: ClientConfig = serde_json::from_str(
			r#"{
				"uaa_endpoint": "https://uaa.service.internal:8443",
				"client_name": "gorouter",
				"client_secret": "gorouter-secret",
				"max_number_of_retries": 3,
				"retry_interval_ms": 15000,
				"tls": { "skip_verification": true }
			}"#,
		)
		.expect("Config JSON should deserialize.");

		assert_eq!(config.max_number_of_retries, 3);
		assert_eq!(config.retry_interval, Duration::seconds(15));
		assert_eq!(config.expiration_buffer_in_sec, DEFAULT_EXPIRATION_BUFFER_IN_SEC);
		assert!(config.tls.skip_verification);
		assert_eq!(config.tls.ca_cert_file, None);
	}

	#[test]
	fn debug_output_hides_secret() {
		let rendered = format!("{:?}", test_config());

		assert!(!rendered.contains("client-secret"));
		assert!(rendered.contains("client_secret_set: true"));
	}
}
