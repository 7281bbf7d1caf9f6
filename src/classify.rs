//! Pure classification of provider failures into the gateway error taxonomy.
//!
//! Every function here is a table-driven mapping from `(HTTP status, parsed error body)` to an
//! [`Error`]; nothing performs IO and nothing unwinds, so the whole policy is unit-testable in
//! isolation. The token manager and the request executor decide *when* to classify (and whether
//! the failure is retried first); this module only decides *what* a failure means.
//!
//! "No response at all" is a distinct input from any status code: the transport layer surfaces it
//! as its own variant and the `*_unreachable` constructors here handle it, so a connection failure
//! is never conflated with a provider-returned 500.

// self
use crate::{
	_prelude::*,
	error::ErrorKind,
};

/// Generic error payload returned by the provider's data endpoints.
///
/// The provider reports failures as an array of entries; only the first entry contributes to the
/// caller-facing message. Unknown fields are ignored and every field is optional so a partially
/// populated body still classifies.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderErrorBody {
	/// Error entries in provider-defined order.
	#[serde(default)]
	pub errors: Vec<ProviderErrorEntry>,
}
impl ProviderErrorBody {
	/// Returns the first entry's `detail`, falling back to its `title`.
	pub fn detail(&self) -> Option<&str> {
		let first = self.errors.first()?;

		first.detail.as_deref().or(first.title.as_deref())
	}
}

/// Single entry of a [`ProviderErrorBody`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderErrorEntry {
	/// HTTP status echoed by the provider.
	#[serde(default)]
	pub status: Option<u16>,
	/// Provider-internal error code.
	#[serde(default)]
	pub code: Option<i64>,
	/// Short error summary.
	#[serde(default)]
	pub title: Option<String>,
	/// Long-form error description.
	#[serde(default)]
	pub detail: Option<String>,
}

/// Leniently parses a response body as a [`ProviderErrorBody`].
///
/// A body that does not match the expected shape yields `None`; a malformed error payload must
/// never change how a status code classifies, only which message accompanies it.
pub fn parse_error_body(body: &[u8]) -> Option<ProviderErrorBody> {
	serde_json::from_slice(body).ok()
}

/// Maps a data-plane response status to a caller-facing error.
///
/// Applies both to statuses that were never retryable and to retryable statuses once the retry
/// budget is exhausted.
pub fn classify_data_failure(status: u16, body: Option<&ProviderErrorBody>) -> Error {
	let detail = body.and_then(ProviderErrorBody::detail);

	match status {
		400 => Error::new(
			ErrorKind::BadRequest,
			detail.map_or_else(|| "Invalid request parameters.".into(), str::to_owned),
		),
		401 => Error::new(
			ErrorKind::Unauthorized,
			detail.map_or_else(|| "Provider rejected the access token.".into(), str::to_owned),
		),
		403 => Error::new(
			ErrorKind::Forbidden,
			detail.map_or_else(
				|| "Access to the requested resource is forbidden.".into(),
				str::to_owned,
			),
		),
		404 => Error::new(
			ErrorKind::NotFound,
			detail.map_or_else(
				|| "Requested resource was not found.".into(),
				|detail| format!("Resource not found: {detail}."),
			),
		),
		429 => Error::new(
			ErrorKind::RateLimited,
			detail.map_or_else(|| "Provider rate limit exceeded.".into(), str::to_owned),
		),
		500 | 502 | 503 | 504 => Error::new(
			ErrorKind::ProviderUnavailable,
			detail.map_or_else(
				|| "Provider is temporarily unavailable.".into(),
				str::to_owned,
			),
		),
		_ => Error::new(
			ErrorKind::Internal,
			format!(
				"Provider request failed with status {status}: {}.",
				detail.unwrap_or("no further detail")
			),
		),
	}
}

/// Maps a token-endpoint response status to a caller-facing error.
///
/// The token endpoint reports failures in the OAuth `{error, error_description}` shape rather
/// than the data-plane `errors` array, so classification relies on the status alone and the
/// messages are fixed per kind. Token acquisition is never retried here; retrying the overall
/// call is the request executor's decision.
pub fn classify_auth_failure(status: u16) -> Error {
	match status {
		400 => Error::new(ErrorKind::AuthBadRequest, "Invalid authentication request."),
		401 => Error::new(ErrorKind::AuthInvalidCredentials, "Invalid provider API credentials."),
		429 => Error::new(ErrorKind::AuthRateLimited, "Too many authentication requests."),
		500 | 502 | 503 => Error::new(
			ErrorKind::AuthProviderUnavailable,
			"Provider authentication service is temporarily unavailable.",
		),
		_ => Error::new(ErrorKind::AuthFailed, "Authentication failed."),
	}
}

/// Classifies the absence of any HTTP response on the data path.
pub fn classify_data_unreachable(message: impl Display) -> Error {
	Error::new(
		ErrorKind::ProviderUnreachable,
		format!("Unable to connect to the flight-data provider: {message}."),
	)
}

/// Classifies the absence of any HTTP response from the token endpoint.
pub fn classify_auth_unreachable(message: impl Display) -> Error {
	Error::new(
		ErrorKind::AuthUnreachable,
		format!("Unable to connect to the provider authentication service: {message}."),
	)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn body(entries: &str) -> ProviderErrorBody {
		serde_json::from_str(&format!("{{\"errors\":{entries}}}"))
			.expect("Error body fixture should parse.")
	}

	#[test]
	fn data_statuses_map_one_to_one() {
		assert_eq!(classify_data_failure(400, None).kind(), ErrorKind::BadRequest);
		assert_eq!(classify_data_failure(401, None).kind(), ErrorKind::Unauthorized);
		assert_eq!(classify_data_failure(403, None).kind(), ErrorKind::Forbidden);
		assert_eq!(classify_data_failure(404, None).kind(), ErrorKind::NotFound);
		assert_eq!(classify_data_failure(429, None).kind(), ErrorKind::RateLimited);

		for status in [500, 502, 503, 504] {
			assert_eq!(
				classify_data_failure(status, None).kind(),
				ErrorKind::ProviderUnavailable,
			);
		}

		assert_eq!(classify_data_failure(418, None).kind(), ErrorKind::Internal);
	}

	#[test]
	fn auth_statuses_map_one_to_one() {
		assert_eq!(classify_auth_failure(400).kind(), ErrorKind::AuthBadRequest);
		assert_eq!(classify_auth_failure(401).kind(), ErrorKind::AuthInvalidCredentials);
		assert_eq!(classify_auth_failure(429).kind(), ErrorKind::AuthRateLimited);

		for status in [500, 502, 503] {
			assert_eq!(classify_auth_failure(status).kind(), ErrorKind::AuthProviderUnavailable);
		}

		assert_eq!(classify_auth_failure(403).kind(), ErrorKind::AuthFailed);
		assert_eq!(classify_auth_failure(504).kind(), ErrorKind::AuthFailed);
	}

	#[test]
	fn message_prefers_detail_then_title_then_generic() {
		let detailed = body("[{\"title\":\"Bad query\",\"detail\":\"origin is required\"}]");
		let titled = body("[{\"title\":\"Bad query\"}]");
		let empty = body("[]");

		assert_eq!(classify_data_failure(400, Some(&detailed)).message, "origin is required");
		assert_eq!(classify_data_failure(400, Some(&titled)).message, "Bad query");
		assert_eq!(
			classify_data_failure(400, Some(&empty)).message,
			"Invalid request parameters.",
		);
	}

	#[test]
	fn not_found_embeds_provider_detail() {
		let detailed = body("[{\"detail\":\"no destinations for XYZ\"}]");

		assert_eq!(
			classify_data_failure(404, Some(&detailed)).message,
			"Resource not found: no destinations for XYZ.",
		);
	}

	#[test]
	fn unmapped_status_embeds_detail_in_internal_message() {
		let detailed = body("[{\"detail\":\"teapot\"}]");
		let error = classify_data_failure(418, Some(&detailed));

		assert_eq!(error.kind(), ErrorKind::Internal);
		assert_eq!(error.message, "Provider request failed with status 418: teapot.");
	}

	#[test]
	fn malformed_bodies_are_ignored() {
		assert!(parse_error_body(b"not json").is_none());
		assert!(parse_error_body(b"[1, 2, 3]").is_none());

		let parsed = parse_error_body(b"{\"unrelated\":true}")
			.expect("Objects without an errors array should parse to an empty body.");

		assert!(parsed.errors.is_empty());
		assert!(parsed.detail().is_none());
	}

	#[test]
	fn unreachable_messages_embed_the_transport_detail() {
		let data = classify_data_unreachable("connection refused");
		let auth = classify_auth_unreachable("dns failure");

		assert_eq!(data.kind(), ErrorKind::ProviderUnreachable);
		assert!(data.message.contains("connection refused"));
		assert_eq!(auth.kind(), ErrorKind::AuthUnreachable);
		assert!(auth.message.contains("dns failure"));
	}
}
