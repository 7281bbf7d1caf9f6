//! Immutable configuration consumed by the gateway core.
//!
//! The configuration is loaded once at startup by the embedding service and injected into the
//! client; nothing here is re-read or mutated for the lifetime of the process.

// std
use std::collections::BTreeSet;
// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_TIMEOUT_MILLIS: u64 = 10_000;
const DEFAULT_TOKEN_TTL_SECONDS: u64 = 1_800;

/// Retry policy applied by the request executor.
///
/// The defaults cap a persistently failing provider at four total attempts with ~0.7 s of
/// cumulative backoff, so callers fail within a bounded, predictable time.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Maximum number of retries after the initial attempt.
	pub max_retries: u32,
	/// Response statuses eligible for automatic retry.
	pub retryable_statuses: BTreeSet<u16>,
	/// Base delay in milliseconds for pure exponential backoff (no jitter).
	pub backoff_base_millis: u64,
}
impl RetryPolicy {
	/// Checks whether a response status is eligible for automatic retry.
	pub fn is_retryable(&self, status: u16) -> bool {
		self.retryable_statuses.contains(&status)
	}

	/// Returns the backoff delay preceding the retry with the given zero-based attempt index.
	pub fn backoff_delay(&self, attempt: u32) -> Duration {
		Duration::from_millis(self.backoff_base_millis.saturating_mul(2_u64.saturating_pow(attempt)))
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 3,
			retryable_statuses: [401, 403, 408, 429, 500, 502, 503, 504].into(),
			backoff_base_millis: 100,
		}
	}
}

/// Provider credentials, endpoints, and timing knobs for the gateway core.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
	/// OAuth 2.0 client identifier issued by the provider.
	pub api_key: String,
	/// OAuth 2.0 client secret issued by the provider.
	pub api_secret: String,
	/// Base URL prefixed to every data endpoint.
	pub base_url: Url,
	/// Token endpoint for the client-credentials grant.
	pub auth_url: Url,
	/// Timeout in milliseconds applied to every outbound call.
	#[serde(default = "default_timeout_millis")]
	pub timeout_millis: u64,
	/// Cache TTL ceiling for tokens, independent of the provider's own `expires_in`.
	///
	/// Acts as a safety net so a stale token is never served past an operator-controlled bound.
	#[serde(default = "default_token_ttl_seconds")]
	pub token_ttl_seconds: u64,
	/// Retry policy for data requests.
	#[serde(default)]
	pub retry: RetryPolicy,
}
impl GatewayConfig {
	/// Builds a configuration from raw credential and endpoint strings, applying the default
	/// timeout, token TTL, and retry policy.
	pub fn from_parts(
		api_key: impl Into<String>,
		api_secret: impl Into<String>,
		base_url: &str,
		auth_url: &str,
	) -> Result<Self, ConfigError> {
		let base_url = Url::parse(base_url)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "base", source })?;
		let auth_url = Url::parse(auth_url)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "auth", source })?;

		Ok(Self {
			api_key: api_key.into(),
			api_secret: api_secret.into(),
			base_url,
			auth_url,
			timeout_millis: DEFAULT_TIMEOUT_MILLIS,
			token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
			retry: RetryPolicy::default(),
		})
	}

	/// Returns the outbound call timeout as a [`Duration`].
	pub const fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_millis)
	}

	/// Returns the token cache TTL ceiling as a [`Duration`].
	pub const fn token_ttl(&self) -> Duration {
		Duration::from_secs(self.token_ttl_seconds)
	}
}
impl Debug for GatewayConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatewayConfig")
			.field("api_key", &self.api_key)
			.field("api_secret_set", &!self.api_secret.is_empty())
			.field("base_url", &self.base_url.as_str())
			.field("auth_url", &self.auth_url.as_str())
			.field("timeout_millis", &self.timeout_millis)
			.field("token_ttl_seconds", &self.token_ttl_seconds)
			.field("retry", &self.retry)
			.finish()
	}
}

fn default_timeout_millis() -> u64 {
	DEFAULT_TIMEOUT_MILLIS
}

fn default_token_ttl_seconds() -> u64 {
	DEFAULT_TOKEN_TTL_SECONDS
}
