//! Optional observability helpers for token and key fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `uaa_client.fetch` with the `fetch` (token or
//!   key) and `stage` (call site) fields, plus debug events for each request/response/retry.
//! - Enable `metrics` to increment the `uaa_client_fetch_total` counter for every
//!   attempt/cache hit/retry/success/failure, labeled by `fetch` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Fetch operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchKind {
	/// `client_credentials` token acquisition.
	Token,
	/// Token-key retrieval.
	Key,
}
impl FetchKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchKind::Token => "token",
			FetchKind::Key => "key",
		}
	}
}
impl Display for FetchKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
	/// Entry to a fetch helper.
	Attempt,
	/// Served from the token cache without network I/O.
	CacheHit,
	/// A retryable failure scheduled another request.
	Retry,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchOutcome::Attempt => "attempt",
			FetchOutcome::CacheHit => "cache_hit",
			FetchOutcome::Retry => "retry",
			FetchOutcome::Success => "success",
			FetchOutcome::Failure => "failure",
		}
	}
}
impl Display for FetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
