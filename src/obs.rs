//! Optional observability helpers for handshake steps and signed calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth1_broker.handshake` with the `step`
//!   (handshake leg) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `oauth1_broker_handshake_total` counter for every
//!   attempt/success/failure, labeled by `step` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Handshake legs and signed calls observed by the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandshakeStep {
	/// Unauthorized request-token acquisition.
	RequestToken,
	/// Resource-owner redirect to the authorization endpoint.
	UserAuthorization,
	/// Request-token to access-token exchange.
	AccessToken,
	/// Signed call against a protected resource.
	SignedCall,
}
impl HandshakeStep {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			HandshakeStep::RequestToken => "request_token",
			HandshakeStep::UserAuthorization => "user_authorization",
			HandshakeStep::AccessToken => "access_token",
			HandshakeStep::SignedCall => "signed_call",
		}
	}
}
impl Display for HandshakeStep {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepOutcome {
	/// Entry to a consumer helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StepOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StepOutcome::Attempt => "attempt",
			StepOutcome::Success => "success",
			StepOutcome::Failure => "failure",
		}
	}
}
impl Display for StepOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
