//! UAA client-credentials token client: fetches and caches bearer tokens for outbound calls and
//! retrieves the authorization server's token-verification key for inbound validation.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod retry;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		client::UaaClient,
		clock::ManualClock,
		config::ClientConfig,
		error::TransportError,
		http::{HttpFuture, HttpRequest, HttpResponse, TokenHttpClient},
	};

	/// Client type alias used by tests driving the scripted transport.
	pub type ScriptedTestClient = UaaClient<ScriptedHttpClient>;

	/// Canned reply served by [`ScriptedHttpClient`].
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// Respond with the given status code and raw body.
		Status(u16, String),
		/// Fail at the transport layer.
		ConnectionRefused,
	}
	impl ScriptedReply {
		/// Builds a `200 OK` reply carrying a token JSON body.
		pub fn token(access_token: &str, expires_in: i64) -> Self {
			Self::Status(
				200,
				format!("{{\"access_token\":\"{access_token}\",\"expires_in\":{expires_in}}}"),
			)
		}

		/// Builds a reply with the provided status and body.
		pub fn status(status: u16, body: impl Into<String>) -> Self {
			Self::Status(status, body.into())
		}
	}

	/// Owned snapshot of a request seen by [`ScriptedHttpClient`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// HTTP method.
		pub method: oauth2::http::Method,
		/// Full request URI.
		pub uri: String,
		/// Request headers.
		pub headers: oauth2::http::HeaderMap,
		/// Raw request body.
		pub body: Vec<u8>,
	}
	impl RecordedRequest {
		/// Returns the header value as a string, if present and valid UTF-8.
		pub fn header(&self, name: &str) -> Option<&str> {
			self.headers.get(name).and_then(|value| value.to_str().ok())
		}
	}

	/// In-process transport that replays queued replies and records every request it sees.
	///
	/// Once the queue is drained the last reply is repeated, so a single canned success can serve
	/// any number of requests.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedHttpClient {
		replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
		last: Arc<Mutex<Option<ScriptedReply>>>,
		requests: Arc<Mutex<Vec<RecordedRequest>>>,
	}
	impl ScriptedHttpClient {
		/// Creates a transport that serves `replies` in order.
		pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
			Self { replies: Arc::new(Mutex::new(replies.into_iter().collect())), ..Self::default() }
		}

		/// Appends more replies to the queue.
		pub fn push(&self, reply: ScriptedReply) {
			self.replies.lock().push_back(reply);
		}

		/// Number of requests executed so far.
		pub fn calls(&self) -> usize {
			self.requests.lock().len()
		}

		/// Snapshot of every request executed so far.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.requests.lock().clone()
		}

		fn next_reply(&self) -> Option<ScriptedReply> {
			let mut last = self.last.lock();

			match self.replies.lock().pop_front() {
				Some(reply) => {
					*last = Some(reply.clone());

					Some(reply)
				},
				None => last.clone(),
			}
		}
	}
	impl TokenHttpClient for ScriptedHttpClient {
		fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
			self.requests.lock().push(RecordedRequest {
				method: request.method().clone(),
				uri: request.uri().to_string(),
				headers: request.headers().clone(),
				body: request.body().clone(),
			});

			let reply = self.next_reply();

			Box::pin(async move {
				match reply {
					Some(ScriptedReply::Status(status, body)) => {
						let mut response = HttpResponse::new(body.into_bytes());

						*response.status_mut() = oauth2::http::StatusCode::from_u16(status)
							.expect("Scripted status code should be valid.");

						Ok(response)
					},
					Some(ScriptedReply::ConnectionRefused) | None => Err(TransportError::Io(
						std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
					)),
				}
			})
		}
	}

	/// Baseline configuration used across unit tests.
	pub fn test_config() -> ClientConfig {
		ClientConfig {
			uaa_endpoint: "http://uaa.test.internal:8080".into(),
			client_name: "client-name".into(),
			client_secret: "client-secret".into(),
			max_number_of_retries: 3,
			retry_interval: Duration::seconds(15),
			expiration_buffer_in_sec: 30,
			..ClientConfig::default()
		}
	}

	/// Builds a client over a scripted transport and an auto-advancing manual clock.
	pub fn build_scripted_client(
		config: ClientConfig,
		replies: Vec<ScriptedReply>,
	) -> (ScriptedTestClient, ScriptedHttpClient, ManualClock) {
		let http_client = ScriptedHttpClient::new(replies);
		let clock = ManualClock::new(test_epoch()).with_auto_advance();
		let client = ScriptedTestClient::with_http_client(
			config,
			Arc::new(http_client.clone()),
			Arc::new(clock.clone()),
		)
		.expect("Scripted test client should build from a valid configuration.");

		(client, http_client, clock)
	}

	/// Fixed starting instant for manual clocks in tests.
	pub fn test_epoch() -> OffsetDateTime {
		time::macros::datetime!(2024-01-01 00:00 UTC)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
