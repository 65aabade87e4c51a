//! Client-level error types shared by token acquisition, key retrieval, and configuration.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem detected while constructing the client.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, body read) while calling the token endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint answered with a 5xx status; safe to retry.
	#[error("status code: {status}, body: {body}")]
	Unavailable {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Token endpoint answered with a non-200 status below 500 (redirects, client errors).
	#[error("status code: {status}, body: {body}")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// Token endpoint answered `200 OK` with a body that is not a token.
	#[error("Token endpoint returned a malformed token response.")]
	MalformedResponse {
		/// HTTP status code of the offending response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},

	/// Token key could not be retrieved.
	#[error(transparent)]
	KeyFetch(#[from] KeyFetchError),
	/// Token key response could not be decoded.
	#[error("Failed to unmarshal the token key response.")]
	KeyUnmarshal {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
}
impl Error {
	/// Returns `true` when another token request attempt may succeed.
	///
	/// Only transport failures and 5xx responses qualify; every other failure is fatal.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::Unavailable { .. })
	}

	/// HTTP status code attached to the failure, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Unavailable { status, .. }
			| Self::Rejected { status, .. }
			| Self::MalformedResponse { status, .. } => Some(*status),
			Self::KeyFetch(KeyFetchError::Status { status }) => Some(*status),
			_ => None,
		}
	}

	/// Classifies a non-200 token endpoint response.
	pub(crate) fn from_status(status: u16, body: String) -> Self {
		if status >= 500 { Self::Unavailable { status, body } } else { Self::Rejected { status, body } }
	}
}

/// Configuration and validation failures raised while constructing a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Client identifier is empty.
	#[error("OAuth Client ID cannot be empty.")]
	MissingClientId,
	/// Client secret is empty.
	#[error("OAuth Client Secret cannot be empty.")]
	MissingClientSecret,
	/// Authorization server address is empty.
	#[error("UAA endpoint cannot be empty.")]
	MissingEndpoint,
	/// Authorization server address cannot be parsed.
	#[error("UAA endpoint `{endpoint}` is not a valid URL.")]
	InvalidEndpoint {
		/// Offending endpoint string.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// TLS certificate or key material could not be loaded.
	#[error("TLS material at `{path}` could not be loaded.")]
	TlsMaterial {
		/// File path that failed to load.
		path: String,
		/// Underlying read or parse failure.
		#[source]
		source: BoxError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a failure to load TLS material from `path`.
	pub fn tls_material(
		path: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::TlsMaterial { path: path.into(), source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the UAA server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the UAA server.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures retrieving the token key; never retried.
#[derive(Debug, ThisError)]
pub enum KeyFetchError {
	/// Key endpoint could not be reached.
	#[error("Failed to fetch the token key.")]
	Transport(#[source] TransportError),
	/// Key endpoint answered with a non-200 status.
	#[error("Failed to fetch the token key: status code {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
}
