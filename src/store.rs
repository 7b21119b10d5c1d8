//! Storage contracts and built-in store implementations for token records.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::TokenRecord};

/// Future type returned by every [`TokenStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for minted tokens, keyed by opaque token value.
///
/// Implementations must make [`exchange_request_token`](TokenStore::exchange_request_token)
/// atomic: of two concurrent exchange attempts on one token value, exactly one
/// may observe [`ExchangeOutcome::Exchanged`].
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces a token record.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record for a token value, if present.
	fn load<'a>(&'a self, value: &'a str) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Removes and returns the record for a token value.
	fn delete<'a>(&'a self, value: &'a str) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Atomically consumes an authorized request token and stores the
	/// replacement access token record in its place, provided the verifier
	/// matches. The request token record itself is retained in consumed state
	/// so replayed exchanges are distinguishable from unknown tokens.
	fn exchange_request_token<'a>(
		&'a self,
		value: &'a str,
		verifier: &'a str,
		access: TokenRecord,
	) -> StoreFuture<'a, ExchangeOutcome>;
}

/// Result of an atomic request-token exchange attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeOutcome {
	/// The verifier matched and the access token was stored.
	Exchanged,
	/// The record exists but the presented verifier did not match.
	VerifierMismatch,
	/// The record is not an exchangeable request token (already consumed,
	/// never authorized, revoked, or an access token).
	NotExchangeable,
	/// No record matched the provided token value.
	Missing,
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
