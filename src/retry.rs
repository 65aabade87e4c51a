//! Bounded retry control for token requests.
//!
//! A token fetch walks the [`FetchState`] machine:
//!
//! ```text
//! CheckCache ──fresh──────────────────────────────────────▶ (cached token)
//!     │ stale / forced
//!     ▼
//! Attempt(n) ──Success────────────────────────────────────▶ Success
//!     │ ──Fatal───────────────────────────────────────────▶ FatalFailure
//!     │ ──Retryable && n < max_retries──▶ RetryWait(n) ──▶ Attempt(n + 1)
//!     └ ──Retryable && n == max_retries───────────────────▶ Exhausted
//! ```
//!
//! Sleeping only happens in `RetryWait`, so the final attempt is never followed by a delay.

// self
use crate::{_prelude::*, token::Token};

/// Retry budget and fixed pacing for token requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	max_retries: u32,
	interval: Duration,
}
impl RetryPolicy {
	/// Creates a policy allowing `max_retries` retries after the first attempt.
	pub fn new(max_retries: u32, interval: Duration) -> Self {
		Self { max_retries, interval }
	}

	/// Retries allowed after the first attempt.
	pub fn max_retries(&self) -> u32 {
		self.max_retries
	}

	/// Total attempts the policy permits.
	pub fn max_attempts(&self) -> u64 {
		u64::from(self.max_retries) + 1
	}

	/// Fixed delay between attempts.
	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Returns `true` when another attempt fits in the budget after `retries_done` retries.
	pub fn allows_retry(&self, retries_done: u32) -> bool {
		retries_done < self.max_retries
	}

	/// Computes the state that follows an attempt made after `retries_done` retries.
	pub fn transition(&self, retries_done: u32, outcome: AttemptOutcome) -> FetchState {
		match outcome {
			AttemptOutcome::Success(token) => FetchState::Success(token),
			AttemptOutcome::Fatal(err) => FetchState::FatalFailure(err),
			AttemptOutcome::Retryable(err) if self.allows_retry(retries_done) =>
				FetchState::RetryWait { retries_done, last_error: err },
			AttemptOutcome::Retryable(err) => FetchState::Exhausted(err),
		}
	}
}

/// Classified result of one token request attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
	/// Server issued a token.
	Success(Token),
	/// Failure that another attempt may fix (transport failure, 5xx).
	Retryable(Error),
	/// Failure that ends the fetch regardless of remaining budget.
	Fatal(Error),
}
impl AttemptOutcome {
	/// Classifies an attempt result using [`Error::is_retryable`].
	pub fn classify(result: Result<Token>) -> Self {
		match result {
			Ok(token) => Self::Success(token),
			Err(err) if err.is_retryable() => Self::Retryable(err),
			Err(err) => Self::Fatal(err),
		}
	}
}

/// States of a single `fetch_token` call.
#[derive(Debug)]
pub enum FetchState {
	/// Decide whether the cached token can be returned.
	CheckCache,
	/// Issue a token request.
	Attempt {
		/// Retries already spent before this attempt.
		retries_done: u32,
	},
	/// Wait out the retry interval before the next attempt.
	RetryWait {
		/// Retries already spent before the failed attempt.
		retries_done: u32,
		/// Failure that triggered the wait.
		last_error: Error,
	},
	/// Fresh token obtained.
	Success(Token),
	/// Fatal failure; no further attempts.
	FatalFailure(Error),
	/// Budget spent while the last failure was still retryable.
	Exhausted(Error),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::TransportError, token::TokenSecret};

	fn unavailable(status: u16) -> Error {
		Error::from_status(status, String::new())
	}

	fn token() -> Token {
		Token { access_token: TokenSecret::new("t"), expires_in: 60 }
	}

	#[test]
	fn classification_matches_error_kinds() {
		assert!(matches!(AttemptOutcome::classify(Ok(token())), AttemptOutcome::Success(_)));
		assert!(matches!(
			AttemptOutcome::classify(Err(unavailable(502))),
			AttemptOutcome::Retryable(_)
		));
		assert!(matches!(
			AttemptOutcome::classify(Err(TransportError::Io(std::io::Error::other("x")).into())),
			AttemptOutcome::Retryable(_)
		));
		assert!(matches!(
			AttemptOutcome::classify(Err(unavailable(404))),
			AttemptOutcome::Fatal(_)
		));
		assert!(matches!(
			AttemptOutcome::classify(Err(unavailable(302))),
			AttemptOutcome::Fatal(_)
		));
	}

	#[test]
	fn retryable_failures_wait_until_budget_is_spent() {
		let policy = RetryPolicy::new(2, Duration::seconds(1));

		assert!(matches!(
			policy.transition(0, AttemptOutcome::Retryable(unavailable(500))),
			FetchState::RetryWait { retries_done: 0, .. }
		));
		assert!(matches!(
			policy.transition(1, AttemptOutcome::Retryable(unavailable(500))),
			FetchState::RetryWait { retries_done: 1, .. }
		));

		match policy.transition(2, AttemptOutcome::Retryable(unavailable(502))) {
			FetchState::Exhausted(err) => assert_eq!(err.status(), Some(502)),
			other => panic!("Expected exhaustion, got {other:?}."),
		}
	}

	#[test]
	fn zero_budget_exhausts_after_one_attempt() {
		let policy = RetryPolicy::new(0, Duration::seconds(1));

		assert_eq!(policy.max_attempts(), 1);
		assert!(matches!(
			policy.transition(0, AttemptOutcome::Retryable(unavailable(503))),
			FetchState::Exhausted(_)
		));
	}

	#[test]
	fn fatal_failures_stop_with_budget_left() {
		let policy = RetryPolicy::new(5, Duration::seconds(1));

		assert!(matches!(
			policy.transition(0, AttemptOutcome::Fatal(unavailable(400))),
			FetchState::FatalFailure(_)
		));
		assert!(matches!(
			policy.transition(3, AttemptOutcome::Success(token())),
			FetchState::Success(_)
		));
	}
}
