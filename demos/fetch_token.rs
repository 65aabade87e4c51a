//! Fetches a client-credentials token and the token key from a mock UAA server with the default
//! reqwest transport, then shows the cached token being reused.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use uaa_client::{client::ReqwestUaaClient, config::ClientConfig};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}");
		})
		.await;
	let key_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token_key");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"alg\":\"SHA256withRSA\",\"value\":\"-----BEGIN PUBLIC KEY-----\"}");
		})
		.await;
	let client = ReqwestUaaClient::new(ClientConfig {
		uaa_endpoint: server.base_url(),
		client_name: "demo-client".into(),
		client_secret: "super-secret".into(),
		..ClientConfig::default()
	})?;
	let token = client.fetch_token(false).await?;

	println!("Access token: {} (expires in {}s).", token.access_token.expose(), token.expires_in);

	let again = client.fetch_token(false).await?;

	println!("Reused cached token: {}.", again == token);
	println!("Token key: {}.", client.fetch_key().await?);

	token_mock.assert_async().await;
	key_mock.assert_async().await;

	Ok(())
}
