//! Demonstrates plugging a custom transport into the client.
//!
//! 1. Implement [`ProviderTransport`] for your HTTP stack, keeping "no response at all" distinct
//!    from a non-2xx status.
//! 2. Pass it to [`ProviderClient::with_transport`]; the token manager and the request executor
//!    share the one instance.
//!
//! The scripted transport below serves a token, fails one data call with a 500, then succeeds,
//! letting the executor's retry loop show through.

// std
use std::{collections::VecDeque, sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use url::Url;
// self
use flight_gateway::{
	cache::MemoryCache,
	client::ProviderClient,
	config::GatewayConfig,
	http::{ProviderTransport, TransportError, TransportFuture, TransportResponse},
};

struct ScriptedTransport {
	gets: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
}
impl ProviderTransport for ScriptedTransport {
	fn get<'a>(
		&'a self,
		url: Url,
		_bearer_token: &'a str,
		_timeout: Duration,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			println!("GET {url}");

			self.gets
				.lock()
				.pop_front()
				.unwrap_or(Err(TransportError::NoResponse { message: "script exhausted".into() }))
		})
	}

	fn post_form<'a>(
		&'a self,
		url: Url,
		_form: &'a [(&'a str, &'a str)],
		_timeout: Duration,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			println!("POST {url}");

			Ok(TransportResponse {
				status: 200,
				body: b"{\"access_token\":\"demo-access\",\"expires_in\":1800}".to_vec(),
			})
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = ScriptedTransport {
		gets: Mutex::new(
			[
				Ok(TransportResponse { status: 500, body: Vec::new() }),
				Ok(TransportResponse { status: 200, body: b"{\"data\":[]}".to_vec() }),
			]
			.into(),
		),
	};
	let mut config = GatewayConfig::from_parts(
		"demo-key",
		"demo-secret",
		"https://provider.example/v1",
		"https://provider.example/v1/security/oauth2/token",
	)?;

	config.retry.backoff_base_millis = 10;

	let client =
		ProviderClient::with_transport(config, Arc::new(MemoryCache::default()), transport);
	let value = client.make_request_raw("/shopping/flight-destinations", None).await?;

	println!("Response after one retried 500: {value}.");

	Ok(())
}
