//! UAA client: token acquisition with caching and retries, plus token-key retrieval.

mod key;
mod token;

// crates.io
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, HeaderName},
};
// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	clock::Clock,
	config::{ClientConfig, ValidatedConfig},
	error::ConfigError,
	http::{HttpRequest, TokenHttpClient},
	token::Token,
};
#[cfg(feature = "reqwest")] use crate::{clock::SystemClock, http::ReqwestHttpClient};

const ACCEPT_JSON: &str = "application/json; charset=utf-8";

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestUaaClient = UaaClient<ReqwestHttpClient>;

/// Fetches client-credentials tokens and token keys from one UAA server.
///
/// The client owns its token cache. [`UaaClient::fetch_token`] holds the cache lock for the whole
/// call, retries and sleeps included, so concurrent callers racing on a stale cache produce a
/// single outbound request and all observe its result. [`UaaClient::fetch_key`] takes no lock
/// and caches nothing; concurrent key fetches each reach the server.
///
/// Share a client between tasks behind an [`Arc`].
pub struct UaaClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Time source for cache expiry and retry pacing.
	pub clock: Arc<dyn Clock>,
	config: ValidatedConfig,
	cache: AsyncMutex<TokenCache>,
}
impl<C> UaaClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Validates `config` and creates a client over the caller-provided transport and clock.
	///
	/// Fails with [`Error::Config`] when the client id, secret, or endpoint is empty or the
	/// endpoint does not parse.
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		Ok(Self::from_parts(config.validate()?, http_client.into(), clock))
	}

	fn from_parts(config: ValidatedConfig, http_client: Arc<C>, clock: Arc<dyn Clock>) -> Self {
		Self { http_client, clock, config, cache: AsyncMutex::new(TokenCache::default()) }
	}

	/// Settings the client was built with.
	pub fn config(&self) -> &ValidatedConfig {
		&self.config
	}

	/// Returns the cached token without checking freshness or touching the network.
	///
	/// Waits for any in-flight [`UaaClient::fetch_token`] call to finish.
	pub async fn cached_token(&self) -> Option<Token> {
		self.cache.lock().await.entry().map(|entry| entry.token.clone())
	}

	fn build_request(
		&self,
		method: Method,
		url: &Url,
		headers: &[(HeaderName, String)],
		body: Vec<u8>,
	) -> Result<HttpRequest> {
		let mut builder =
			Request::builder().method(method).uri(url.as_str()).header(ACCEPT, ACCEPT_JSON);

		for (name, value) in headers {
			builder = builder.header(name, value);
		}

		builder.body(body).map_err(|e| ConfigError::from(e).into())
	}
}
#[cfg(feature = "reqwest")]
impl UaaClient<ReqwestHttpClient> {
	/// Creates a client with a reqwest transport built from `config.tls` and the system clock.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let config = config.validate()?;
		let http_client = ReqwestHttpClient::from_tls(&config.tls)?;

		Ok(Self::from_parts(config, Arc::new(http_client), Arc::new(SystemClock)))
	}
}
impl<C> Debug for UaaClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UaaClient")
			.field("token_url", &self.config.token_url.as_str())
			.field("key_url", &self.config.key_url.as_str())
			.field("client_id", &self.config.client_id.as_str())
			.field("retry", &self.config.retry)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn construction_fails_without_required_settings() {
		for (config, expected) in [
			(ClientConfig { client_name: String::new(), ..test_config() }, "OAuth Client ID"),
			(ClientConfig { client_secret: String::new(), ..test_config() }, "OAuth Client Secret"),
			(ClientConfig { uaa_endpoint: String::new(), ..test_config() }, "UAA endpoint"),
		] {
			let err = ScriptedTestClient::with_http_client(
				config,
				ScriptedHttpClient::default(),
				Arc::new(crate::clock::SystemClock),
			)
			.expect_err("Invalid configuration should not build a client.");

			assert!(matches!(err, Error::Config(_)));
			assert!(err.to_string().contains(expected), "unexpected message: {err}");
		}
	}

	#[test]
	fn negative_buffer_is_defaulted_at_construction() {
		let (client, _, _) = build_scripted_client(
			ClientConfig { expiration_buffer_in_sec: -5, ..test_config() },
			vec![],
		);

		assert!(client.config().expiration_buffer_defaulted());
		assert_eq!(client.config().expiration_buffer, Duration::seconds(30));
	}

	#[test]
	fn debug_output_omits_secret() {
		let (client, _, _) = build_scripted_client(test_config(), vec![]);
		let rendered = format!("{client:?}");

		assert!(rendered.contains("client-name"));
		assert!(!rendered.contains("client-secret"));
	}

	#[tokio::test]
	async fn cached_token_is_empty_before_first_fetch() {
		let (client, http_client, _) = build_scripted_client(test_config(), vec![]);

		assert!(client.cached_token().await.is_none());
		assert_eq!(http_client.calls(), 0);
	}

	#[test]
	fn invalid_endpoint_is_a_config_error() {
		let err = ScriptedTestClient::with_http_client(
			ClientConfig { uaa_endpoint: "::".into(), ..test_config() },
			ScriptedHttpClient::default(),
			Arc::new(crate::clock::SystemClock),
		)
		.expect_err("Unparseable endpoint should fail.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidEndpoint { .. })));
	}
}
