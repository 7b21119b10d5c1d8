//! Consumer identity: the key/secret pair identifying a client application.

// self
use crate::{
	_prelude::*,
	auth::{id::ConsumerKey, token::secret::TokenSecret},
};

/// Immutable key/secret pair identifying the calling application to the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerIdentity {
	/// Public consumer key sent on the wire.
	pub key: ConsumerKey,
	secret: TokenSecret,
}
impl ConsumerIdentity {
	/// Creates an identity from the provided key and shared secret.
	pub fn new(key: ConsumerKey, secret: impl Into<String>) -> Self {
		Self { key, secret: TokenSecret::new(secret) }
	}

	/// Returns the shared consumer secret. Callers must avoid logging it.
	pub fn secret(&self) -> &TokenSecret {
		&self.secret
	}
}
impl Debug for ConsumerIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConsumerIdentity")
			.field("key", &self.key)
			.field("secret", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_redacts_the_secret() {
		let identity = ConsumerIdentity::new(
			ConsumerKey::new("sampleconsumer").expect("Consumer key fixture should be valid."),
			"samplesecret",
		);
		let rendered = format!("{identity:?}");

		assert!(rendered.contains("sampleconsumer"));
		assert!(!rendered.contains("samplesecret"));
	}
}
