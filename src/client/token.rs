//! `client_credentials` token acquisition with caching, serialization, and bounded retries.
//!
//! [`UaaClient::fetch_token`] holds the cache lock for the entire call. A caller that finds a
//! fresh token returns it without network I/O; otherwise it drives the [`FetchState`] machine
//! until a token arrives, a fatal failure occurs, or the retry budget runs out. Callers queued
//! behind it then see the freshly cached token. A failed refresh leaves the previous entry in
//! place.

// crates.io
use base64::{Engine, prelude::BASE64_STANDARD};
use oauth2::http::{
	Method,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	client::UaaClient,
	http::{HttpRequest, TokenHttpClient},
	obs::{self, FetchKind, FetchOutcome, FetchSpan},
	retry::{AttemptOutcome, FetchState},
	token::Token,
};

const KIND: FetchKind = FetchKind::Token;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

impl<C> UaaClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Returns a usable access token, fetching a new one when the cache is empty, due for
	/// renewal, or `force_refresh` is set.
	///
	/// Transport failures and 5xx responses are retried up to the configured budget with a fixed
	/// delay; the last failure is returned once the budget is spent. Any other non-200 status and
	/// undecodable 200 bodies fail immediately.
	pub async fn fetch_token(&self, force_refresh: bool) -> Result<Token> {
		let span = FetchSpan::new(KIND, "fetch_token");

		obs::record_fetch_outcome(KIND, FetchOutcome::Attempt);
		obs::trace_fetch_started(force_refresh);

		let result = span.instrument(self.fetch_token_locked(force_refresh)).await;

		match &result {
			Ok(_) => obs::record_fetch_outcome(KIND, FetchOutcome::Success),
			Err(e) => {
				obs::trace_failure(KIND, "failed-getting-token", e);
				obs::record_fetch_outcome(KIND, FetchOutcome::Failure);
			},
		}

		result
	}

	async fn fetch_token_locked(&self, force_refresh: bool) -> Result<Token> {
		let mut cache = self.cache.lock().await;
		let policy = self.config.retry;
		let mut state = FetchState::CheckCache;

		loop {
			state = match state {
				FetchState::CheckCache => {
					let now = self.clock.now();

					match cache.entry().filter(|entry| !force_refresh && entry.is_fresh_at(now)) {
						Some(entry) => {
							obs::trace_cache_hit(entry.refetch_after);
							obs::record_fetch_outcome(KIND, FetchOutcome::CacheHit);

							return Ok(entry.token.clone());
						},
						None => FetchState::Attempt { retries_done: 0 },
					}
				},
				FetchState::Attempt { retries_done } => policy.transition(
					retries_done,
					AttemptOutcome::classify(self.request_token().await),
				),
				FetchState::RetryWait { retries_done, last_error } => {
					obs::trace_retry(retries_done, policy.interval(), &last_error);
					obs::record_fetch_outcome(KIND, FetchOutcome::Retry);
					self.clock.sleep(policy.interval()).await;

					FetchState::Attempt { retries_done: retries_done + 1 }
				},
				FetchState::Success(token) => {
					let refetch_after =
						cache.replace(token.clone(), self.clock.now(), self.config.expiration_buffer);

					obs::trace_token_cached(refetch_after);

					return Ok(token);
				},
				FetchState::FatalFailure(e) | FetchState::Exhausted(e) => return Err(e),
			};
		}
	}

	async fn request_token(&self) -> Result<Token> {
		let request = self.token_request()?;

		obs::trace_http_request(KIND, &self.config.token_url);

		let response = self.http_client.execute(request).await?;
		let status = response.status().as_u16();

		obs::trace_http_response(KIND, status);

		if status != 200 {
			return Err(Error::from_status(status, String::from_utf8_lossy(response.body()).into()));
		}

		Token::from_slice(response.body())
			.map_err(|source| Error::MalformedResponse { status, source })
	}

	fn token_request(&self) -> Result<HttpRequest> {
		let body = url::form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", "client_credentials")
			.finish();
		let credentials = BASE64_STANDARD.encode(format!(
			"{}:{}",
			self.config.client_id.as_str(),
			self.config.client_secret.secret()
		));

		self.build_request(
			Method::POST,
			&self.config.token_url,
			&[
				(AUTHORIZATION, format!("Basic {credentials}")),
				(CONTENT_TYPE, FORM_CONTENT_TYPE.to_owned()),
			],
			body.into_bytes(),
		)
	}
}
