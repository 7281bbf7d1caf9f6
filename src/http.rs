//! Transport primitives shared by the token manager and the request executor.
//!
//! [`ProviderTransport`] is the crate's only dependency on an HTTP stack. Implementations must
//! keep the two failure shapes the retry policy depends on distinguishable: a response with a
//! non-2xx status arrives as a normal [`TransportResponse`], while "no response at all" (DNS,
//! TCP, TLS, timeout) surfaces as [`TransportError::NoResponse`]. Conflating the two would make
//! connection failures retryable, which the executor deliberately never does.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Boxed future returned by [`ProviderTransport`] operations.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of provider calls.
///
/// Implementations are shared behind `Arc<T>` across the token manager and the executor, so they
/// must be `Send + Sync + 'static`, and the futures they return must be `Send` for the lifetime
/// of the in-flight request.
pub trait ProviderTransport
where
	Self: 'static + Send + Sync,
{
	/// Issues a GET with a bearer `Authorization` header, an `accept: application/json` header,
	/// and the provided per-request timeout. The query string, when any, is already part of
	/// `url`.
	fn get<'a>(&'a self, url: Url, bearer_token: &'a str, timeout: Duration)
	-> TransportFuture<'a>;

	/// Issues a form-encoded POST with the provided per-request timeout.
	fn post_form<'a>(
		&'a self,
		url: Url,
		form: &'a [(&'a str, &'a str)],
		timeout: Duration,
	) -> TransportFuture<'a>;
}

/// HTTP envelope produced whenever the provider answered at all, success or not.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code of the response.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Checks whether the status is in the 2xx range.
	pub const fn is_success(&self) -> bool {
		self.status >= 200 && self.status < 300
	}
}

/// Failures raised below the HTTP response layer.
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// The request never produced an HTTP response; the provider's edge was not reached.
	#[error("No response was received: {message}.")]
	NoResponse {
		/// Transport-specific description of the connection failure.
		message: String,
	},
	/// The request could not be constructed or dispatched.
	#[error("Request could not be dispatched: {message}.")]
	Request {
		/// Transport-specific description of the local failure.
		message: String,
	},
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Per-request timeouts come from the gateway configuration, so the wrapped client needs no
/// global timeout of its own. Custom clients (proxies, test certificates) can be injected via
/// [`ReqwestTransport::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ProviderTransport for ReqwestTransport {
	fn get<'a>(
		&'a self,
		url: Url,
		bearer_token: &'a str,
		timeout: Duration,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.get(url)
				.header(reqwest::header::ACCEPT, "application/json")
				.bearer_auth(bearer_token)
				.timeout(timeout)
				.send()
				.await
				.map_err(map_send_error)?;

			read_response(response).await
		})
	}

	fn post_form<'a>(
		&'a self,
		url: Url,
		form: &'a [(&'a str, &'a str)],
		timeout: Duration,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.post(url)
				.form(form)
				.timeout(timeout)
				.send()
				.await
				.map_err(map_send_error)?;

			read_response(response).await
		})
	}
}

#[cfg(feature = "reqwest")]
async fn read_response(response: reqwest::Response) -> Result<TransportResponse, TransportError> {
	let status = response.status().as_u16();
	let body = response.bytes().await.map_err(map_send_error)?.to_vec();

	Ok(TransportResponse { status, body })
}

#[cfg(feature = "reqwest")]
fn map_send_error(err: ReqwestError) -> TransportError {
	if err.is_builder() {
		return TransportError::Request { message: describe(&err) };
	}

	TransportError::NoResponse { message: describe(&err) }
}

#[cfg(feature = "reqwest")]
fn describe(err: &ReqwestError) -> String {
	// Reqwest's Display drops the cause chain; surface the first cause since that is where
	// "connection refused" and friends live.
	match std::error::Error::source(err) {
		Some(source) => format!("{err}: {source}"),
		None => err.to_string(),
	}
}
