//! Engine-level error types shared across the signature, message, and store layers.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request-construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the caller may retry with a fresh nonce.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Request timestamp landed outside the accepted clock-skew window.
	#[error("Timestamp {timestamp} is outside the accepted skew of {skew_secs} seconds.")]
	TimestampOutOfRange {
		/// Unix timestamp carried by the rejected request.
		timestamp: i64,
		/// Configured skew tolerance in seconds.
		skew_secs: i64,
	},
	/// The nonce tuple has already been accepted within the validity window.
	#[error("Nonce has already been used within the validity window.")]
	ReplayedNonce,
	/// Exchange attempted on an unknown, already-exchanged, or mismatched token.
	#[error("Token is invalid or already consumed: {reason}.")]
	InvalidOrConsumedToken {
		/// Engine-supplied reason string.
		reason: String,
	},
	/// Provider callback omitted a required query parameter.
	#[error("Callback is missing the `{missing}` parameter.")]
	MissingCallbackParameters {
		/// Name of the absent parameter.
		missing: &'static str,
	},
	/// Resource owner or provider declined the request.
	#[error("Access denied: {reason}.")]
	AccessDenied {
		/// Provider- or engine-supplied reason string.
		reason: String,
	},
	/// Recomputed signature did not match the presented one.
	#[error("Request signature does not match.")]
	SignatureMismatch,
}

/// Configuration and validation failures raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Request URI or parameters are malformed.
	#[error("Request is malformed: {reason}.")]
	InvalidRequest {
		/// Human-readable description of the defect.
		reason: String,
	},
	/// The requested tamper-protection algorithm is not supported.
	#[error("Signature method `{method}` is not supported.")]
	UnsupportedAlgorithm {
		/// Algorithm label as presented on the wire.
		method: String,
	},
	/// Service provider description failed validation.
	#[error("Invalid service provider description.")]
	InvalidDescription(#[from] crate::provider::DescriptionError),
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
	/// An identifier failed validation.
	#[error("Invalid identifier.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Builds an [`ConfigError::InvalidRequest`] from any displayable reason.
	pub fn invalid_request(reason: impl Display) -> Self {
		Self::InvalidRequest { reason: reason.to_string() }
	}
}

/// Temporary failure variants (safe to retry with a fresh nonce and timestamp).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider endpoint returned an unexpected but non-fatal response.
	#[error("Provider endpoint returned an unexpected response: {message}.")]
	Endpoint {
		/// Provider- or engine-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
