//! Token-key retrieval: one unauthenticated GET, never cached, never retried.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	client::UaaClient,
	error::KeyFetchError,
	http::TokenHttpClient,
	obs::{self, FetchKind, FetchOutcome, FetchSpan},
	token::TokenKey,
};

const KIND: FetchKind = FetchKind::Key;

impl<C> UaaClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Returns the key material published at `/token_key`.
	pub async fn fetch_key(&self) -> Result<String> {
		Ok(self.fetch_token_key().await?.value)
	}

	/// Returns the full `/token_key` document.
	///
	/// Transport failures and non-200 statuses map to [`Error::KeyFetch`]; undecodable 200 bodies
	/// map to [`Error::KeyUnmarshal`]. Nothing is retried.
	pub async fn fetch_token_key(&self) -> Result<TokenKey> {
		let span = FetchSpan::new(KIND, "fetch_token_key");

		obs::record_fetch_outcome(KIND, FetchOutcome::Attempt);

		let result = span.instrument(self.request_token_key()).await;

		match &result {
			Ok(_) => {
				obs::trace_key_fetched();
				obs::record_fetch_outcome(KIND, FetchOutcome::Success);
			},
			Err(_) => obs::record_fetch_outcome(KIND, FetchOutcome::Failure),
		}

		result
	}

	async fn request_token_key(&self) -> Result<TokenKey> {
		let request = self.build_request(Method::GET, &self.config.key_url, &[], Vec::new())?;

		obs::trace_http_request(KIND, &self.config.key_url);

		let response = self.http_client.execute(request).await.map_err(|e| {
			let err = Error::from(KeyFetchError::Transport(e));

			obs::trace_failure(KIND, "error-in-fetching-key", &err);

			err
		})?;
		let status = response.status().as_u16();

		obs::trace_http_response(KIND, status);

		if status != 200 {
			let err = Error::from(KeyFetchError::Status { status });

			obs::trace_failure(KIND, "http-error-fetching-key", &err);

			return Err(err);
		}

		TokenKey::from_slice(response.body()).map_err(|source| {
			let err = Error::KeyUnmarshal { source };

			obs::trace_failure(KIND, "error-in-unmarshaling-key", &err);

			err
		})
	}
}
