//! Gateway-level error types shared by the token manager, request executor, and facade.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable, machine-checkable failure kinds surfaced by the gateway core.
///
/// The set is closed so boundary layers can translate each kind into a transport status code
/// without inspecting messages; [`ErrorKind::http_status`] carries the canonical suggestion.
/// Kinds prefixed with `Auth` describe token-endpoint failures, the rest describe data-plane
/// failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
	/// The data request never produced an HTTP response (DNS, TCP, timeout).
	ProviderUnreachable,
	/// The token endpoint never produced an HTTP response.
	AuthUnreachable,
	/// The token endpoint rejected the authentication request as malformed.
	AuthBadRequest,
	/// The token endpoint rejected the configured API credentials.
	AuthInvalidCredentials,
	/// The token endpoint throttled authentication requests.
	AuthRateLimited,
	/// The token endpoint is temporarily unavailable.
	AuthProviderUnavailable,
	/// Catch-all for unclassified token-endpoint failures.
	AuthFailed,
	/// The provider rejected the data request as malformed.
	BadRequest,
	/// The provider rejected the presented bearer token.
	Unauthorized,
	/// The provider refused access to the requested resource.
	Forbidden,
	/// The requested resource does not exist.
	NotFound,
	/// The provider throttled the data request.
	RateLimited,
	/// The provider is temporarily unavailable.
	ProviderUnavailable,
	/// Catch-all for unmapped statuses and local failures.
	Internal,
}
impl ErrorKind {
	/// Returns the stable kebab-case label for the kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::ProviderUnreachable => "provider-unreachable",
			ErrorKind::AuthUnreachable => "auth-unreachable",
			ErrorKind::AuthBadRequest => "auth-bad-request",
			ErrorKind::AuthInvalidCredentials => "auth-invalid-credentials",
			ErrorKind::AuthRateLimited => "auth-rate-limited",
			ErrorKind::AuthProviderUnavailable => "auth-provider-unavailable",
			ErrorKind::AuthFailed => "auth-failed",
			ErrorKind::BadRequest => "bad-request",
			ErrorKind::Unauthorized => "unauthorized",
			ErrorKind::Forbidden => "forbidden",
			ErrorKind::NotFound => "not-found",
			ErrorKind::RateLimited => "rate-limited",
			ErrorKind::ProviderUnavailable => "provider-unavailable",
			ErrorKind::Internal => "internal",
		}
	}

	/// Suggests the HTTP status a boundary layer should answer with for this kind.
	pub const fn http_status(self) -> u16 {
		match self {
			ErrorKind::ProviderUnreachable
			| ErrorKind::AuthUnreachable
			| ErrorKind::AuthProviderUnavailable
			| ErrorKind::ProviderUnavailable => 503,
			ErrorKind::AuthBadRequest | ErrorKind::BadRequest => 400,
			ErrorKind::AuthInvalidCredentials | ErrorKind::Unauthorized => 401,
			ErrorKind::Forbidden => 403,
			ErrorKind::NotFound => 404,
			ErrorKind::AuthRateLimited | ErrorKind::RateLimited => 429,
			ErrorKind::AuthFailed | ErrorKind::Internal => 500,
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Caller-facing gateway error pairing a stable [`ErrorKind`] with a human-readable message.
///
/// Messages quote the provider's own error payload when one was present; the kind alone is
/// sufficient for programmatic handling.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct Error {
	/// Machine-checkable failure kind.
	pub kind: ErrorKind,
	/// Human-readable description of the failure.
	pub message: String,
}
impl Error {
	/// Builds an error from a kind and message.
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}

	/// Returns the machine-checkable kind.
	pub const fn kind(&self) -> ErrorKind {
		self.kind
	}
}

/// Construction-time configuration failures; never produced on the request path.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// An endpoint URL string could not be parsed.
	#[error("The {endpoint} endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Which endpoint field was rejected.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const ALL_KINDS: [ErrorKind; 14] = [
		ErrorKind::ProviderUnreachable,
		ErrorKind::AuthUnreachable,
		ErrorKind::AuthBadRequest,
		ErrorKind::AuthInvalidCredentials,
		ErrorKind::AuthRateLimited,
		ErrorKind::AuthProviderUnavailable,
		ErrorKind::AuthFailed,
		ErrorKind::BadRequest,
		ErrorKind::Unauthorized,
		ErrorKind::Forbidden,
		ErrorKind::NotFound,
		ErrorKind::RateLimited,
		ErrorKind::ProviderUnavailable,
		ErrorKind::Internal,
	];

	#[test]
	fn kind_labels_match_serde_representation() {
		for kind in ALL_KINDS {
			let serialized = serde_json::to_string(&kind)
				.expect("Error kind should serialize to a JSON string.");

			assert_eq!(serialized, format!("\"{}\"", kind.as_str()));

			let round_trip: ErrorKind = serde_json::from_str(&serialized)
				.expect("Serialized error kind should deserialize back.");

			assert_eq!(round_trip, kind);
		}
	}

	#[test]
	fn kinds_translate_to_standard_statuses() {
		assert_eq!(ErrorKind::ProviderUnreachable.http_status(), 503);
		assert_eq!(ErrorKind::AuthProviderUnavailable.http_status(), 503);
		assert_eq!(ErrorKind::AuthInvalidCredentials.http_status(), 401);
		assert_eq!(ErrorKind::BadRequest.http_status(), 400);
		assert_eq!(ErrorKind::Unauthorized.http_status(), 401);
		assert_eq!(ErrorKind::Forbidden.http_status(), 403);
		assert_eq!(ErrorKind::NotFound.http_status(), 404);
		assert_eq!(ErrorKind::RateLimited.http_status(), 429);
		assert_eq!(ErrorKind::AuthFailed.http_status(), 500);
		assert_eq!(ErrorKind::Internal.http_status(), 500);
	}

	#[test]
	fn error_displays_its_message() {
		let error = Error::new(ErrorKind::NotFound, "Resource not found: no such destination.");

		assert_eq!(error.to_string(), "Resource not found: no such destination.");
		assert_eq!(error.kind(), ErrorKind::NotFound);
	}
}
