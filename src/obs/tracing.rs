// self
use crate::{_prelude::*, obs::FetchKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFetch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFetch<F> = F;

/// A span builder used by client fetches.
#[derive(Clone, Debug)]
pub struct FetchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FetchSpan {
	/// Creates a new span tagged with the provided fetch kind + stage.
	pub fn new(kind: FetchKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("uaa_client.fetch", fetch = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFetch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits `fetching-token` when a token fetch starts.
pub fn trace_fetch_started(force_refresh: bool) {
	#[cfg(feature = "tracing")]
	tracing::debug!(force_refresh, "fetching-token");
	#[cfg(not(feature = "tracing"))]
	let _ = force_refresh;
}

/// Emits `return-cached-token` when the cache satisfies a fetch.
pub fn trace_cache_hit(refetch_after: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%refetch_after, "return-cached-token");
	#[cfg(not(feature = "tracing"))]
	let _ = refetch_after;
}

/// Emits `http-request` before a request is handed to the transport.
pub fn trace_http_request(kind: FetchKind, endpoint: &Url) {
	#[cfg(feature = "tracing")]
	tracing::debug!(fetch = kind.as_str(), endpoint = %endpoint, "http-request");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, endpoint);
}

/// Emits `http-response` once a status code is known.
pub fn trace_http_response(kind: FetchKind, status: u16) {
	#[cfg(feature = "tracing")]
	tracing::debug!(fetch = kind.as_str(), status_code = status, "http-response");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, status);
}

/// Emits `retry-fetching-token` before sleeping between attempts.
pub fn trace_retry(retry_count: u32, interval: Duration, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::debug!(retry_count, %interval, %error, "retry-fetching-token");
	#[cfg(not(feature = "tracing"))]
	let _ = (retry_count, interval, error);
}

/// Emits `caching-token` after the cache is replaced.
pub fn trace_token_cached(refetch_after: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%refetch_after, "caching-token");
	#[cfg(not(feature = "tracing"))]
	let _ = refetch_after;
}

/// Emits `fetch-key-successful` after a key was decoded.
pub fn trace_key_fetched() {
	#[cfg(feature = "tracing")]
	tracing::debug!("fetch-key-successful");
}

/// Emits a failure event named `event` carrying the error.
///
/// Token fetches use `failed-getting-token`; key fetches distinguish `error-in-fetching-key`,
/// `http-error-fetching-key`, and `error-in-unmarshaling-key`.
pub fn trace_failure(kind: FetchKind, event: &'static str, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::debug!(fetch = kind.as_str(), %error, "{event}");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, event, error);
}

/// Records that a negative expiration buffer was replaced by `default`.
pub fn record_expiration_buffer_defaulted(configured: i64, default: i64) {
	#[cfg(feature = "tracing")]
	tracing::info!(configured, value = default, "expiration-buffer-defaulted");
	#[cfg(not(feature = "tracing"))]
	let _ = (configured, default);
}
