//! Demonstrates the client credentials grant with the default reqwest transport: a one-shot
//! token, a shared caching token source, and an authorized client against a mock server.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_client_credentials::{
	auth::AuthStyle, config::Config, flows::TokenSource, oauth::ReqwestRetriever,
	reqwest::Method,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900,\
				 \"org_id\":\"acme\"}",
			);
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports").header("authorization", "Bearer demo-access");
			then.status(200).body("[]");
		})
		.await;
	let config = Config::new("demo-client", "super-secret", server.url("/token"))
		.with_scopes(["reports.read"])
		.with_endpoint_param("audience", "reports-api")
		.with_auth_style(AuthStyle::AutoDetect);
	let retriever = ReqwestRetriever::new()?;
	let token = config.token(&retriever).await?;

	println!("One-shot token: {token:?}.");
	println!("Organization from extra fields: {:?}.", token.extra("org_id"));

	let source = config.token_source(retriever.clone());
	let (first, second) = tokio::join!(source.token(), source.token());

	println!("Shared token matches: {}.", first? == second?);

	let client = config.client(retriever);
	let response = client.send(client.request(Method::GET, server.url("/reports"))).await?;

	println!("Reports endpoint answered HTTP {}.", response.status());

	token_mock.assert_calls_async(3).await;
	api_mock.assert_async().await;

	Ok(())
}
