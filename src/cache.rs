//! In-memory holder for the most recently issued token.

// self
use crate::{_prelude::*, token::Token};

/// Cached token plus the instant after which it must be refetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedToken {
	/// Token as issued by the server.
	pub token: Token,
	/// `issued_at + expires_in - expiration_buffer`.
	pub refetch_after: OffsetDateTime,
}
impl CachedToken {
	/// Computes the refetch instant for a token issued at `issued_at`.
	///
	/// Lifetimes that overflow the calendar are treated as already due.
	pub fn new(token: Token, issued_at: OffsetDateTime, expiration_buffer: Duration) -> Self {
		let refetch_after = Duration::seconds(token.expires_in)
			.checked_sub(expiration_buffer)
			.and_then(|lifetime| issued_at.checked_add(lifetime))
			.unwrap_or(issued_at);

		Self { token, refetch_after }
	}

	/// Returns `true` while `now` is strictly earlier than the refetch instant.
	pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		now < self.refetch_after
	}
}

/// Token cache owned by a single client.
///
/// An empty cache is distinct from a cache holding an expired token; both make the next fetch hit
/// the network.
#[derive(Clone, Debug, Default)]
pub struct TokenCache(Option<CachedToken>);
impl TokenCache {
	/// Returns the cached token when it is still fresh at `now`.
	pub fn fresh_at(&self, now: OffsetDateTime) -> Option<&Token> {
		self.0.as_ref().filter(|entry| entry.is_fresh_at(now)).map(|entry| &entry.token)
	}

	/// Replaces the cached entry wholesale and returns the new refetch instant.
	pub fn replace(
		&mut self,
		token: Token,
		issued_at: OffsetDateTime,
		expiration_buffer: Duration,
	) -> OffsetDateTime {
		let entry = CachedToken::new(token, issued_at, expiration_buffer);
		let refetch_after = entry.refetch_after;

		self.0 = Some(entry);

		refetch_after
	}

	/// Current entry, fresh or not.
	pub fn entry(&self) -> Option<&CachedToken> {
		self.0.as_ref()
	}

	/// Whether no token has been cached yet.
	pub fn is_empty(&self) -> bool {
		self.0.is_none()
	}
}
