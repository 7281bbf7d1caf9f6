//! Demonstrates the high-level client against a mock provider: one client-credentials exchange,
//! a sanitized data-plane query, and cached-token reuse across calls.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use flight_gateway::{
	cache::MemoryCache,
	client::ProviderClient,
	config::GatewayConfig,
	executor::QueryParams,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/security/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/shopping/flight-destinations")
				.query_param("origin", "YVR");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"destination\":\"MAD\"},{\"destination\":\"LIS\"}]}");
		})
		.await;
	let config = GatewayConfig::from_parts(
		"demo-key",
		"demo-secret",
		&server.url("/v1"),
		&server.url("/v1/security/oauth2/token"),
	)?;
	let client = ProviderClient::new(config, Arc::new(MemoryCache::default()));
	// The `departureDate` entry is `null` and never reaches the wire.
	let params: QueryParams =
		[("origin".into(), json!("YVR")), ("departureDate".into(), serde_json::Value::Null)]
			.into();
	let destinations = client
		.make_request_raw("/shopping/flight-destinations", Some(&params))
		.await?;

	println!("Destinations from YVR: {destinations}.");

	let token = client.get_access_token().await?;

	println!("Token served from the shared cache: {}.", token.was_cached);

	token_mock.assert_calls_async(1).await;
	data_mock.assert_async().await;

	Ok(())
}
