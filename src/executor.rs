//! Authenticated data-plane request execution with bounded retry, backoff, and classification.
//!
//! The executor performs one logical GET against the provider: it obtains a token, sanitizes the
//! caller's parameters, issues the call, and either returns the parsed body or a classified
//! error. Transient statuses are retried inside an explicit bounded loop with pure exponential
//! backoff; 401/403 additionally invalidate the cached token first, since a valid-looking but
//! rejected token is the most common transient cause and must not be replayed as-is.
//!
//! Connection-level failures ("no response at all") are never retried: the request did not reach
//! the provider's edge, so replaying it buys nothing and delays the caller.

// self
use crate::{
	_prelude::*,
	classify,
	config::GatewayConfig,
	error::ErrorKind,
	http::{ProviderTransport, TransportError},
	obs::{self, CallKind, CallOutcome, CallSpan},
	token::TokenManager,
};

/// Scalar query parameters accepted by the executor.
///
/// JSON scalars model the absent-versus-null distinction the sanitizer depends on: a `null`
/// value marks an entry for removal, while empty strings and zeros are legitimate values and
/// survive. The ordered map keeps rendered query strings deterministic.
pub type QueryParams = BTreeMap<String, serde_json::Value>;

/// Drops `null`-valued entries and renders the survivors as query pairs.
///
/// Returns `None` when nothing survives: providers may treat an empty query string differently
/// from an absent one, so an all-null map must not produce a trailing `?`.
pub fn sanitize_params(params: &QueryParams) -> Option<Vec<(String, String)>> {
	let pairs = params
		.iter()
		.filter(|(_, value)| !value.is_null())
		.map(|(key, value)| (key.clone(), render_scalar(value)))
		.collect::<Vec<_>>();

	if pairs.is_empty() { None } else { Some(pairs) }
}

fn render_scalar(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::String(value) => value.clone(),
		other => other.to_string(),
	}
}

/// Executes authenticated provider requests, retrying transient failures.
pub struct RequestExecutor<T>
where
	T: ?Sized + ProviderTransport,
{
	tokens: TokenManager<T>,
	transport: Arc<T>,
	config: Arc<GatewayConfig>,
}
impl<T> RequestExecutor<T>
where
	T: ?Sized + ProviderTransport,
{
	/// Creates an executor sharing the provided token manager, transport, and configuration.
	pub fn new(tokens: TokenManager<T>, transport: Arc<T>, config: Arc<GatewayConfig>) -> Self {
		Self { tokens, transport, config }
	}

	/// Performs one authenticated GET against the provider and returns the parsed JSON body.
	///
	/// `endpoint` is appended verbatim to the configured base URL and should start with `/`.
	pub async fn execute(
		&self,
		endpoint: &str,
		params: Option<&QueryParams>,
	) -> Result<serde_json::Value> {
		let span = CallSpan::new(CallKind::Data, endpoint);

		obs::record_call_outcome(CallKind::Data, CallOutcome::Attempt);

		let result = span.instrument(self.execute_inner(endpoint, params)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(CallKind::Data, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(CallKind::Data, CallOutcome::Failure),
		}

		result
	}

	async fn execute_inner(
		&self,
		endpoint: &str,
		params: Option<&QueryParams>,
	) -> Result<serde_json::Value> {
		let url = self.request_url(endpoint, params)?;
		let policy = &self.config.retry;
		// Counts consumed retries; it only advances on a retryable status with budget left, so
		// every other path returns.
		let mut attempt = 0;

		loop {
			let token = self.tokens.get_access_token().await?;
			let response = match self
				.transport
				.get(url.clone(), &token.access_token, self.config.timeout())
				.await
			{
				Ok(response) => response,
				Err(TransportError::NoResponse { message }) =>
					return Err(classify::classify_data_unreachable(message)),
				Err(TransportError::Request { message }) =>
					return Err(Error::new(
						ErrorKind::Internal,
						format!("Request could not be dispatched: {message}."),
					)),
			};

			if response.is_success() {
				let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

				return serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
					Error::new(
						ErrorKind::Internal,
						format!("Provider returned a body that could not be parsed: {error}."),
					)
				});
			}

			let status = response.status;

			if policy.is_retryable(status) && attempt < policy.max_retries {
				if matches!(status, 401 | 403) {
					self.tokens.invalidate_token().await;
				}

				let delay = policy.backoff_delay(attempt);

				obs::record_call_outcome(CallKind::Data, CallOutcome::Retry);
				tracing::debug!(endpoint, status, attempt, ?delay, "Retrying provider request.");
				tokio::time::sleep(delay).await;

				attempt += 1;

				continue;
			}

			return Err(classify::classify_data_failure(
				status,
				classify::parse_error_body(&response.body).as_ref(),
			));
		}
	}

	fn request_url(&self, endpoint: &str, params: Option<&QueryParams>) -> Result<Url> {
		let base = self.config.base_url.as_str().trim_end_matches('/');
		let mut url = Url::parse(&format!("{base}{endpoint}")).map_err(|error| {
			Error::new(
				ErrorKind::Internal,
				format!("Invalid request URL for endpoint {endpoint}: {error}."),
			)
		})?;

		if let Some(pairs) = params.and_then(sanitize_params) {
			url.query_pairs_mut().extend_pairs(pairs);
		}

		Ok(url)
	}
}
impl<T> Clone for RequestExecutor<T>
where
	T: ?Sized + ProviderTransport,
{
	fn clone(&self) -> Self {
		Self {
			tokens: self.tokens.clone(),
			transport: self.transport.clone(),
			config: self.config.clone(),
		}
	}
}
impl<T> Debug for RequestExecutor<T>
where
	T: ?Sized + ProviderTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor").field("config", &self.config).finish()
	}
}
