//! OAuth 2.0 client-credentials token lifecycle: acquisition, shared-cache reuse, near-expiry
//! refresh, and invalidation.
//!
//! The manager holds no long-lived token state of its own; all sharing crosses request
//! boundaries through the injected [`TokenCache`]. Cache faults never propagate to callers:
//! any read, write, or delete failure degrades to "fetch a new token" (availability over
//! cache-hit efficiency), logged so sustained cache outages stay visible to operators.
//!
//! Concurrent callers on a cold cache may each fetch a token. The race is benign: last writer
//! wins, both writes carry the same TTL, and the cost is one duplicate auth call. Fetches are
//! deliberately not serialized behind a lock.

// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	classify,
	config::GatewayConfig,
	error::ErrorKind,
	http::{ProviderTransport, TransportError},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Cache key holding the raw access-token string.
pub const TOKEN_CACHE_KEY: &str = "provider:access_token";
/// Cache key holding the token's expiry metadata.
pub const TOKEN_METADATA_KEY: &str = "provider:access_token:meta";
/// Margin before the recorded expiry during which a cached token is treated as unusable.
pub const NEAR_EXPIRY_WINDOW: time::Duration = time::Duration::seconds(60);

/// Bearer token produced per call by the token manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Raw bearer token string.
	pub access_token: String,
	/// Provider-reported lifetime in seconds; `0` when the token was served from the cache.
	pub expires_in: u64,
	/// Whether the token came from the shared cache without a network call.
	pub was_cached: bool,
}

/// Expiry metadata stored under [`TOKEN_METADATA_KEY`] so freshness can be evaluated without
/// decoding the token itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTokenMetadata {
	/// Instant the token expires, derived from the provider's `expires_in`.
	#[serde(with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
	/// Instant the token was fetched.
	#[serde(with = "time::serde::timestamp")]
	pub created_at: OffsetDateTime,
}
impl CachedTokenMetadata {
	/// Checks whether the recorded expiry falls within [`NEAR_EXPIRY_WINDOW`] of `now`.
	pub fn expires_soon(&self, now: OffsetDateTime) -> bool {
		self.expires_at - now < NEAR_EXPIRY_WINDOW
	}
}

/// Token endpoint response for the client-credentials grant.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	expires_in: u64,
}

/// Owns acquisition, caching, near-expiry refresh, and invalidation of the provider token.
pub struct TokenManager<T>
where
	T: ?Sized + ProviderTransport,
{
	cache: Arc<dyn TokenCache>,
	transport: Arc<T>,
	config: Arc<GatewayConfig>,
}
impl<T> TokenManager<T>
where
	T: ?Sized + ProviderTransport,
{
	/// Creates a manager around the injected cache handle, transport, and configuration.
	pub fn new(
		cache: Arc<dyn TokenCache>,
		transport: impl Into<Arc<T>>,
		config: Arc<GatewayConfig>,
	) -> Self {
		Self { cache, transport: transport.into(), config }
	}

	/// Produces a currently-valid bearer token, minimizing token-endpoint round trips.
	///
	/// Serves the cached token when present and not near expiry; otherwise performs one
	/// client-credentials exchange. Auth failures are not retried here; retrying is the
	/// request executor's responsibility when the overall call needed a fresh token.
	pub async fn get_access_token(&self) -> Result<AccessToken> {
		if let Some(access_token) = self.cached_token().await {
			return Ok(AccessToken { access_token, expires_in: 0, was_cached: true });
		}

		let span = CallSpan::new(CallKind::Auth, self.config.auth_url.path());

		obs::record_call_outcome(CallKind::Auth, CallOutcome::Attempt);

		let result = span.instrument(self.fetch_access_token()).await;

		match &result {
			Ok(_) => obs::record_call_outcome(CallKind::Auth, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(CallKind::Auth, CallOutcome::Failure),
		}

		result
	}

	/// Removes the cached token and its metadata.
	///
	/// Best effort by contract: deletion failures are logged and swallowed, since a
	/// still-cached-but-invalid token only causes the next request to retry and re-invalidate.
	pub async fn invalidate_token(&self) {
		for key in [TOKEN_CACHE_KEY, TOKEN_METADATA_KEY] {
			if let Err(error) = self.cache.delete(key).await {
				tracing::warn!(key, %error, "Failed to delete cached token state.");
			}
		}
	}

	async fn cached_token(&self) -> Option<String> {
		let token = match self.cache.get(TOKEN_CACHE_KEY).await {
			Ok(Some(token)) => token,
			Ok(None) => return None,
			Err(error) => {
				tracing::warn!(
					key = TOKEN_CACHE_KEY,
					%error,
					"Cache read failed; treating as a miss.",
				);

				return None;
			},
		};

		match self.cached_metadata().await {
			Some(metadata) if metadata.expires_soon(OffsetDateTime::now_utc()) => None,
			// Missing or unreadable metadata leaves the token in service until its cache TTL
			// evicts it.
			_ => Some(token),
		}
	}

	async fn cached_metadata(&self) -> Option<CachedTokenMetadata> {
		let raw = match self.cache.get(TOKEN_METADATA_KEY).await {
			Ok(Some(raw)) => raw,
			Ok(None) => return None,
			Err(error) => {
				tracing::warn!(key = TOKEN_METADATA_KEY, %error, "Cache read failed.");

				return None;
			},
		};

		match serde_json::from_str(&raw) {
			Ok(metadata) => Some(metadata),
			Err(error) => {
				tracing::warn!(key = TOKEN_METADATA_KEY, %error, "Cached metadata is corrupt.");

				None
			},
		}
	}

	async fn fetch_access_token(&self) -> Result<AccessToken> {
		let form = [
			("grant_type", "client_credentials"),
			("client_id", self.config.api_key.as_str()),
			("client_secret", self.config.api_secret.as_str()),
		];
		let response = self
			.transport
			.post_form(self.config.auth_url.clone(), &form, self.config.timeout())
			.await
			.map_err(|error| match error {
				TransportError::NoResponse { message } =>
					classify::classify_auth_unreachable(message),
				TransportError::Request { message } => Error::new(
					ErrorKind::AuthFailed,
					format!("Authentication request could not be dispatched: {message}."),
				),
			})?;

		if !response.is_success() {
			return Err(classify::classify_auth_failure(response.status));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let token: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|error| {
				Error::new(
					ErrorKind::AuthFailed,
					format!("Token endpoint returned an unexpected body: {error}."),
				)
			})?;

		self.store_token(&token).await;

		Ok(AccessToken {
			access_token: token.access_token,
			expires_in: token.expires_in,
			was_cached: false,
		})
	}

	/// Writes the token and its metadata to the cache, both under the operator-controlled TTL
	/// ceiling. A fetched token is still returned to the caller when caching it fails.
	async fn store_token(&self, token: &TokenEndpointResponse) {
		let ttl = self.config.token_ttl();

		if let Err(error) = self.cache.set(TOKEN_CACHE_KEY, &token.access_token, ttl).await {
			tracing::warn!(
				key = TOKEN_CACHE_KEY,
				%error,
				"Failed to cache the access token; serving it uncached.",
			);
		}

		let now = OffsetDateTime::now_utc();
		let lifetime = time::Duration::seconds(i64::try_from(token.expires_in).unwrap_or(i64::MAX));
		let Some(expires_at) = now.checked_add(lifetime) else {
			tracing::warn!(
				expires_in = token.expires_in,
				"Provider-reported token lifetime overflows; skipping metadata.",
			);

			return;
		};
		let metadata = CachedTokenMetadata { expires_at, created_at: now };

		match serde_json::to_string(&metadata) {
			Ok(raw) =>
				if let Err(error) = self.cache.set(TOKEN_METADATA_KEY, &raw, ttl).await {
					tracing::warn!(key = TOKEN_METADATA_KEY, %error, "Failed to cache metadata.");
				},
			Err(error) => {
				tracing::warn!(key = TOKEN_METADATA_KEY, %error, "Failed to encode metadata.");
			},
		}
	}
}
impl<T> Clone for TokenManager<T>
where
	T: ?Sized + ProviderTransport,
{
	fn clone(&self) -> Self {
		Self {
			cache: self.cache.clone(),
			transport: self.transport.clone(),
			config: self.config.clone(),
		}
	}
}
impl<T> Debug for TokenManager<T>
where
	T: ?Sized + ProviderTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager").field("config", &self.config).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::VecDeque;
	// crates.io
	use parking_lot::Mutex;
	// self
	use super::*;
	use crate::{cache::MemoryCache, http::TransportResponse};

	struct ScriptedTransport {
		responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
		calls: Mutex<u32>,
	}
	impl ScriptedTransport {
		fn new(
			responses: impl IntoIterator<Item = Result<TransportResponse, TransportError>>,
		) -> Arc<Self> {
			Arc::new(Self {
				responses: Mutex::new(responses.into_iter().collect()),
				calls: Mutex::new(0),
			})
		}

		fn calls(&self) -> u32 {
			*self.calls.lock()
		}

		fn next_response(&self) -> Result<TransportResponse, TransportError> {
			*self.calls.lock() += 1;

			self.responses
				.lock()
				.pop_front()
				.expect("Scripted transport ran out of responses.")
		}
	}
	impl ProviderTransport for ScriptedTransport {
		fn get<'a>(
			&'a self,
			_url: Url,
			_bearer_token: &'a str,
			_timeout: Duration,
		) -> crate::http::TransportFuture<'a> {
			Box::pin(async move { self.next_response() })
		}

		fn post_form<'a>(
			&'a self,
			_url: Url,
			_form: &'a [(&'a str, &'a str)],
			_timeout: Duration,
		) -> crate::http::TransportFuture<'a> {
			Box::pin(async move { self.next_response() })
		}
	}

	fn token_response(token: &str, expires_in: u64) -> Result<TransportResponse, TransportError> {
		Ok(TransportResponse {
			status: 200,
			body: format!("{{\"access_token\":\"{token}\",\"expires_in\":{expires_in}}}")
				.into_bytes(),
		})
	}

	fn config() -> Arc<GatewayConfig> {
		Arc::new(
			GatewayConfig::from_parts(
				"key",
				"secret",
				"https://provider.example/v1",
				"https://provider.example/v1/security/oauth2/token",
			)
			.expect("Test configuration should build."),
		)
	}

	fn manager(
		cache: Arc<dyn TokenCache>,
		transport: Arc<ScriptedTransport>,
	) -> TokenManager<ScriptedTransport> {
		TokenManager::new(cache, transport, config())
	}

	#[tokio::test]
	async fn cold_cache_fetches_and_stores_token_with_metadata() {
		let cache = Arc::new(MemoryCache::default());
		let transport = ScriptedTransport::new([token_response("T1", 1_800)]);
		let manager = manager(cache.clone(), transport.clone());
		let token =
			manager.get_access_token().await.expect("Cold-cache token fetch should succeed.");

		assert_eq!(token.access_token, "T1");
		assert_eq!(token.expires_in, 1_800);
		assert!(!token.was_cached);
		assert_eq!(transport.calls(), 1);

		let cached = cache
			.get(TOKEN_CACHE_KEY)
			.await
			.expect("Cache read should succeed.")
			.expect("Token should have been cached.");

		assert_eq!(cached, "T1");

		let metadata: CachedTokenMetadata = serde_json::from_str(
			&cache
				.get(TOKEN_METADATA_KEY)
				.await
				.expect("Cache read should succeed.")
				.expect("Metadata should have been cached."),
		)
		.expect("Cached metadata should decode.");
		let expected = OffsetDateTime::now_utc() + time::Duration::seconds(1_800);

		assert!((metadata.expires_at - expected).abs() < time::Duration::seconds(30));
		assert!(metadata.created_at <= metadata.expires_at);
	}

	#[tokio::test]
	async fn warm_cache_serves_token_without_network_calls() {
		let cache = Arc::new(MemoryCache::default());
		let transport = ScriptedTransport::new([token_response("T1", 1_800)]);
		let manager = manager(cache, transport.clone());

		manager.get_access_token().await.expect("Initial fetch should succeed.");

		let second = manager.get_access_token().await.expect("Cached read should succeed.");

		assert_eq!(second.access_token, "T1");
		assert_eq!(second.expires_in, 0);
		assert!(second.was_cached);
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn near_expiry_metadata_triggers_exactly_one_refetch() {
		let cache = Arc::new(MemoryCache::default());
		let transport = ScriptedTransport::new([token_response("T2", 900)]);
		let manager = manager(cache.clone(), transport.clone());
		let now = OffsetDateTime::now_utc();
		let metadata = CachedTokenMetadata {
			expires_at: now + time::Duration::seconds(30),
			created_at: now - time::Duration::seconds(1_770),
		};

		cache
			.set(TOKEN_CACHE_KEY, "stale", Duration::from_secs(1_800))
			.await
			.expect("Seeding the token should succeed.");
		cache
			.set(
				TOKEN_METADATA_KEY,
				&serde_json::to_string(&metadata).expect("Metadata fixture should encode."),
				Duration::from_secs(1_800),
			)
			.await
			.expect("Seeding the metadata should succeed.");

		let token = manager.get_access_token().await.expect("Refetch should succeed.");

		assert_eq!(token.access_token, "T2");
		assert!(!token.was_cached);
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn missing_metadata_fails_open_to_the_cached_token() {
		let cache = Arc::new(MemoryCache::default());
		let transport = ScriptedTransport::new([]);
		let manager = manager(cache.clone(), transport.clone());

		cache
			.set(TOKEN_CACHE_KEY, "T1", Duration::from_secs(1_800))
			.await
			.expect("Seeding the token should succeed.");

		let token = manager.get_access_token().await.expect("Cached read should succeed.");

		assert_eq!(token.access_token, "T1");
		assert!(token.was_cached);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn corrupt_metadata_fails_open_to_the_cached_token() {
		let cache = Arc::new(MemoryCache::default());
		let transport = ScriptedTransport::new([]);
		let manager = manager(cache.clone(), transport.clone());

		cache
			.set(TOKEN_CACHE_KEY, "T1", Duration::from_secs(1_800))
			.await
			.expect("Seeding the token should succeed.");
		cache
			.set(TOKEN_METADATA_KEY, "not json", Duration::from_secs(1_800))
			.await
			.expect("Seeding the metadata should succeed.");

		let token = manager.get_access_token().await.expect("Cached read should succeed.");

		assert!(token.was_cached);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn auth_statuses_classify_without_local_retries() {
		let cache = Arc::new(MemoryCache::default());
		let transport =
			ScriptedTransport::new([Ok(TransportResponse { status: 401, body: Vec::new() })]);
		let manager = manager(cache, transport.clone());
		let error =
			manager.get_access_token().await.expect_err("A 401 should surface as an error.");

		assert_eq!(error.kind(), ErrorKind::AuthInvalidCredentials);
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn no_response_maps_to_auth_unreachable() {
		let cache = Arc::new(MemoryCache::default());
		let transport = ScriptedTransport::new([Err(TransportError::NoResponse {
			message: "connection refused".into(),
		})]);
		let manager = manager(cache, transport);
		let error = manager
			.get_access_token()
			.await
			.expect_err("A connection failure should surface as an error.");

		assert_eq!(error.kind(), ErrorKind::AuthUnreachable);
		assert!(error.message.contains("connection refused"));
	}

	#[tokio::test]
	async fn expires_soon_honors_the_sixty_second_window() {
		let now = OffsetDateTime::now_utc();
		let soon = CachedTokenMetadata {
			expires_at: now + time::Duration::seconds(59),
			created_at: now,
		};
		let valid = CachedTokenMetadata {
			expires_at: now + time::Duration::seconds(61),
			created_at: now,
		};

		assert!(soon.expires_soon(now));
		assert!(!valid.expires_soon(now));
	}

	#[test]
	fn metadata_round_trips_as_unix_timestamps() {
		let metadata = CachedTokenMetadata {
			expires_at: OffsetDateTime::from_unix_timestamp(1_756_000_000)
				.expect("Timestamp fixture should be valid."),
			created_at: OffsetDateTime::from_unix_timestamp(1_755_998_200)
				.expect("Timestamp fixture should be valid."),
		};
		let raw = serde_json::to_string(&metadata).expect("Metadata should encode.");

		assert!(raw.contains("1756000000"));

		let round_trip: CachedTokenMetadata =
			serde_json::from_str(&raw).expect("Metadata should decode.");

		assert_eq!(round_trip, metadata);
	}
}
