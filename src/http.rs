//! Transport primitives for UAA requests.
//!
//! [`TokenHttpClient`] is the client's only dependency on an HTTP stack. Requests and responses
//! use the `oauth2` crate's `http` aliases so custom transports never see reqwest types.

// std
#[cfg(feature = "reqwest")] use std::{ops::Deref, path::Path};
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::TlsConfig, error::ConfigError};

pub use oauth2::{HttpRequest, HttpResponse};

/// Boxed future returned by [`TokenHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to reach the UAA server.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by every
/// caller of a client. Any failure before a full response (status, headers, and body) is in hand
/// must be reported as a [`TransportError`]; status codes are never interpreted here.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the complete response.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Redirects are not followed: a 3xx from the token endpoint must surface to the caller as a
/// rejected request. Configure any custom [`ReqwestClient`] passed to
/// [`ReqwestHttpClient::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client from TLS settings.
	///
	/// `client_cert_file` and `client_key_file` are only used when both are set; the CA bundle is
	/// added on top of the built-in roots.
	pub fn from_tls(tls: &TlsConfig) -> Result<Self, ConfigError> {
		let mut builder = no_redirect_builder();

		if let (Some(cert), Some(key)) = (&tls.client_cert_file, &tls.client_key_file) {
			let mut pem = read_pem(cert)?;

			pem.push(b'\n');
			pem.extend(read_pem(key)?);

			let identity = reqwest::Identity::from_pem(&pem)
				.map_err(|e| ConfigError::tls_material(cert.display().to_string(), e))?;

			builder = builder.identity(identity);
		}
		if let Some(ca) = &tls.ca_cert_file {
			let bundle = reqwest::Certificate::from_pem_bundle(&read_pem(ca)?)
				.map_err(|e| ConfigError::tls_material(ca.display().to_string(), e))?;

			for certificate in bundle {
				builder = builder.add_root_certificate(certificate);
			}
		}
		if tls.skip_verification {
			builder = builder.danger_accept_invalid_certs(true);
		}

		Ok(Self(builder.build().map_err(ConfigError::http_client_build)?))
	}
}
#[cfg(feature = "reqwest")]
impl Default for ReqwestHttpClient {
	fn default() -> Self {
		// The builder only fails where `ReqwestClient::default` panics, so the fallback is never
		// reached with a redirect-following client.
		Self(no_redirect_builder().build().unwrap_or_default())
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = self.0.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok::<_, TransportError>(response_new)
		})
	}
}

#[cfg(feature = "reqwest")]
fn no_redirect_builder() -> reqwest::ClientBuilder {
	ReqwestClient::builder().redirect(reqwest::redirect::Policy::none())
}

#[cfg(feature = "reqwest")]
fn read_pem(path: &Path) -> Result<Vec<u8>, ConfigError> {
	std::fs::read(path).map_err(|e| ConfigError::tls_material(path.display().to_string(), e))
}
