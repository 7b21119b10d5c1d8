//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenState},
	sig::method::constant_time_eq,
	store::{ExchangeOutcome, StoreError, StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<String, TokenRecord>>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn save_now(map: StoreMap, record: TokenRecord) -> Result<(), StoreError> {
		map.write().insert(record.value.clone(), record);

		Ok(())
	}

	fn load_now(map: StoreMap, value: String) -> Option<TokenRecord> {
		map.read().get(&value).cloned()
	}

	fn delete_now(map: StoreMap, value: String) -> Option<TokenRecord> {
		map.write().remove(&value)
	}

	fn exchange_now(
		map: StoreMap,
		value: String,
		verifier: String,
		access: TokenRecord,
	) -> ExchangeOutcome {
		let mut guard = map.write();
		let outcome = match guard.get(&value) {
			Some(record)
				if record.is_request()
					&& !record.is_revoked()
					&& matches!(record.state, TokenState::Authorized) =>
				match record.verifier.as_ref() {
					Some(expected)
						if constant_time_eq(
							expected.expose().as_bytes(),
							verifier.as_bytes(),
						) =>
						ExchangeOutcome::Exchanged,
					_ => ExchangeOutcome::VerifierMismatch,
				},
			Some(_) => ExchangeOutcome::NotExchangeable,
			None => ExchangeOutcome::Missing,
		};

		if matches!(outcome, ExchangeOutcome::Exchanged) {
			if let Some(record) = guard.get_mut(&value) {
				record.consume();
			}

			guard.insert(access.value.clone(), access);
		}

		outcome
	}
}
impl TokenStore for MemoryStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, record) })
	}

	fn load<'a>(&'a self, value: &'a str) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();
		let value = value.to_owned();

		Box::pin(async move { Ok(Self::load_now(map, value)) })
	}

	fn delete<'a>(&'a self, value: &'a str) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();
		let value = value.to_owned();

		Box::pin(async move { Ok(Self::delete_now(map, value)) })
	}

	fn exchange_request_token<'a>(
		&'a self,
		value: &'a str,
		verifier: &'a str,
		access: TokenRecord,
	) -> StoreFuture<'a, ExchangeOutcome> {
		let map = self.0.clone();
		let value = value.to_owned();
		let verifier = verifier.to_owned();

		Box::pin(async move { Ok(Self::exchange_now(map, value, verifier, access)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{ConsumerKey, ResourceOwnerId, TokenKind};

	fn consumer() -> ConsumerKey {
		ConsumerKey::new("sampleconsumer").expect("Consumer key fixture should be valid.")
	}

	fn request_token(value: &str) -> TokenRecord {
		TokenRecord::builder(TokenKind::Request, consumer())
			.value(value)
			.secret(format!("{value}-secret"))
			.build()
			.expect("Request token fixture should build successfully.")
	}

	fn access_token(value: &str) -> TokenRecord {
		TokenRecord::builder(TokenKind::Access, consumer())
			.value(value)
			.secret(format!("{value}-secret"))
			.build()
			.expect("Access token fixture should build successfully.")
	}

	#[tokio::test]
	async fn save_load_delete_round_trip() {
		let store = MemoryStore::default();
		let record = request_token("token-1");

		store.save(record.clone()).await.expect("Saving record fixture should succeed.");

		let fetched = store
			.load("token-1")
			.await
			.expect("Loading should succeed.")
			.expect("Stored record should remain present.");

		assert_eq!(fetched.value, record.value);
		assert_eq!(fetched.secret.expose(), record.secret.expose());

		let removed = store
			.delete("token-1")
			.await
			.expect("Deletion should succeed.")
			.expect("Deletion should return the removed record.");

		assert_eq!(removed.value, "token-1");
		assert!(store.load("token-1").await.expect("Loading should succeed.").is_none());
	}

	#[tokio::test]
	async fn exchange_reports_each_failure_mode() {
		let store = MemoryStore::default();

		// Unknown token.
		let outcome = store
			.exchange_request_token("missing", "v", access_token("a-0"))
			.await
			.expect("Exchange call should not error.");

		assert_eq!(outcome, ExchangeOutcome::Missing);

		// Issued but never authorized.
		store
			.save(request_token("token-1"))
			.await
			.expect("Saving unapproved token should succeed.");

		let outcome = store
			.exchange_request_token("token-1", "v", access_token("a-1"))
			.await
			.expect("Exchange call should not error.");

		assert_eq!(outcome, ExchangeOutcome::NotExchangeable);

		// Authorized but wrong verifier.
		let mut authorized = request_token("token-2");

		authorized.authorize(
			"verifier-2",
			ResourceOwnerId::new("owner-1").expect("Resource owner fixture should be valid."),
		);
		store.save(authorized).await.expect("Saving authorized token should succeed.");

		let outcome = store
			.exchange_request_token("token-2", "wrong", access_token("a-2"))
			.await
			.expect("Exchange call should not error.");

		assert_eq!(outcome, ExchangeOutcome::VerifierMismatch);

		// Correct verifier consumes the token and stores the access record.
		let outcome = store
			.exchange_request_token("token-2", "verifier-2", access_token("a-2"))
			.await
			.expect("Exchange call should not error.");

		assert_eq!(outcome, ExchangeOutcome::Exchanged);

		let consumed = store
			.load("token-2")
			.await
			.expect("Loading consumed token should succeed.")
			.expect("Consumed token should remain present for inspection.");

		assert_eq!(consumed.state, TokenState::Consumed);
		assert!(store.load("a-2").await.expect("Loading access token should succeed.").is_some());

		// Replayed exchange on the consumed token.
		let outcome = store
			.exchange_request_token("token-2", "verifier-2", access_token("a-3"))
			.await
			.expect("Exchange call should not error.");

		assert_eq!(outcome, ExchangeOutcome::NotExchangeable);
	}
}
