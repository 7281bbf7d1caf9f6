//! Caller-facing facade wiring the token manager and request executor together.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	config::GatewayConfig,
	error::ErrorKind,
	executor::{QueryParams, RequestExecutor},
	http::ProviderTransport,
	token::{AccessToken, TokenManager},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// High-level provider client.
///
/// One instance per provider account is enough for a whole process: the client is cheap to clone
/// and every clone shares the same transport, configuration, and cache handle, so cached tokens
/// are reused across all of them.
pub struct ProviderClient<T>
where
	T: ?Sized + ProviderTransport,
{
	tokens: TokenManager<T>,
	executor: RequestExecutor<T>,
}
#[cfg(feature = "reqwest")]
impl ProviderClient<ReqwestTransport> {
	/// Creates a client backed by a default [`ReqwestTransport`].
	pub fn new(config: GatewayConfig, cache: Arc<dyn TokenCache>) -> Self {
		Self::with_transport(config, cache, ReqwestTransport::default())
	}
}
impl<T> ProviderClient<T>
where
	T: ?Sized + ProviderTransport,
{
	/// Creates a client around an explicit transport implementation.
	pub fn with_transport(
		config: GatewayConfig,
		cache: Arc<dyn TokenCache>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let config = Arc::new(config);
		let transport = transport.into();
		let tokens = TokenManager::new(cache, transport.clone(), config.clone());
		let executor = RequestExecutor::new(tokens.clone(), transport, config);

		Self { tokens, executor }
	}

	/// Performs one authenticated GET and deserializes the response body into `D`.
	///
	/// `endpoint` is appended verbatim to the configured base URL and should start with `/`.
	/// `null`-valued parameters are dropped before the request is built; retry, backoff, and
	/// token refresh happen transparently underneath.
	pub async fn make_request<D>(&self, endpoint: &str, params: Option<&QueryParams>) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let value = self.executor.execute(endpoint, params).await?;

		serde_path_to_error::deserialize(value).map_err(|error| {
			Error::new(
				ErrorKind::Internal,
				format!("Provider response did not match the expected shape: {error}."),
			)
		})
	}

	/// Performs one authenticated GET and returns the raw JSON body.
	pub async fn make_request_raw(
		&self,
		endpoint: &str,
		params: Option<&QueryParams>,
	) -> Result<serde_json::Value> {
		self.executor.execute(endpoint, params).await
	}

	/// Produces a currently-valid bearer token for callers that talk to the provider directly.
	pub async fn get_access_token(&self) -> Result<AccessToken> {
		self.tokens.get_access_token().await
	}

	/// Drops the cached token so the next call authenticates freshly.
	pub async fn invalidate_token(&self) {
		self.tokens.invalidate_token().await;
	}
}
impl<T> Clone for ProviderClient<T>
where
	T: ?Sized + ProviderTransport,
{
	fn clone(&self) -> Self {
		Self { tokens: self.tokens.clone(), executor: self.executor.clone() }
	}
}
impl<T> Debug for ProviderClient<T>
where
	T: ?Sized + ProviderTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderClient").field("executor", &self.executor).finish()
	}
}
