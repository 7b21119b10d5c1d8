//! Provider-side token lifecycle: minting, approval, and single-use exchange.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{ConsumerKey, ResourceOwnerId, TokenKind, TokenRecord, TokenState},
	error::ConfigError,
	store::{ExchangeOutcome, TokenStore},
};

const TOKEN_VALUE_LEN: usize = 24;
const TOKEN_SECRET_LEN: usize = 32;
const VERIFIER_LEN: usize = 16;

/// Default validity window for freshly minted request tokens.
pub const DEFAULT_REQUEST_TOKEN_TTL: Duration = Duration::minutes(10);

/// Mints and retires tokens on behalf of a service provider.
///
/// Exchange is all-or-nothing: the access token record is minted before the
/// store performs the atomic consume-and-replace, so cancelling the awaiting
/// caller never leaves the store half-transitioned.
pub struct TokenIssuer {
	store: Arc<dyn TokenStore>,
	request_token_ttl: Duration,
	exchange_guards: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl TokenIssuer {
	/// Creates an issuer over the provided store with the default request-token TTL.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self {
			store,
			request_token_ttl: DEFAULT_REQUEST_TOKEN_TTL,
			exchange_guards: Default::default(),
		}
	}

	/// Overrides the request-token validity window.
	pub fn with_request_token_ttl(mut self, ttl: Duration) -> Self {
		self.request_token_ttl = ttl;

		self
	}

	/// Mints an unauthorized request token for the given consumer.
	pub async fn issue_request_token(
		&self,
		consumer: ConsumerKey,
		callback: Option<Url>,
		associated: BTreeMap<String, String>,
	) -> Result<TokenRecord> {
		let mut builder = TokenRecord::builder(TokenKind::Request, consumer)
			.value(mint(TOKEN_VALUE_LEN))
			.secret(mint(TOKEN_SECRET_LEN))
			.associated(associated)
			.expires_in(self.request_token_ttl);

		if let Some(callback) = callback {
			builder = builder.callback(callback);
		}

		let record = builder.build().map_err(ConfigError::from)?;

		self.store.save(record.clone()).await?;

		Ok(record)
	}

	/// Records the resource owner's approval and returns the minted verifier.
	pub async fn authorize(
		&self,
		request_token: &str,
		owner: ResourceOwnerId,
	) -> Result<String> {
		let mut record = self.store.load(request_token).await?.ok_or_else(|| {
			Error::InvalidOrConsumedToken { reason: "unknown request token".into() }
		})?;

		if !record.is_request() || !matches!(record.state, TokenState::Issued) {
			return Err(Error::InvalidOrConsumedToken {
				reason: "token is not awaiting authorization".into(),
			});
		}
		if record.is_revoked() || record.is_expired_at(OffsetDateTime::now_utc()) {
			return Err(Error::InvalidOrConsumedToken {
				reason: "request token expired or revoked".into(),
			});
		}

		let verifier = mint(VERIFIER_LEN);

		record.authorize(verifier.clone(), owner);
		self.store.save(record).await?;

		Ok(verifier)
	}

	/// Exchanges an approved request token for a fresh access token.
	///
	/// Single-use is enforced here: the store's compare-and-consume serializes
	/// concurrent attempts so exactly one succeeds, and the per-token guard
	/// keeps redundant mints cheap.
	pub async fn exchange_for_access_token(
		&self,
		request_token: &str,
		verifier: &str,
	) -> Result<TokenRecord> {
		let guard = self.exchange_guard(request_token);
		let _serialized = guard.lock().await;
		let record = self.store.load(request_token).await?.ok_or_else(|| {
			Error::InvalidOrConsumedToken { reason: "unknown request token".into() }
		})?;

		if record.is_expired_at(OffsetDateTime::now_utc()) {
			return Err(Error::InvalidOrConsumedToken {
				reason: "request token expired".into(),
			});
		}

		let access = TokenRecord::builder(TokenKind::Access, record.consumer.clone())
			.value(mint(TOKEN_VALUE_LEN))
			.secret(mint(TOKEN_SECRET_LEN))
			.associated(record.associated.clone())
			.build()
			.map_err(ConfigError::from)?;

		match self.store.exchange_request_token(request_token, verifier, access.clone()).await? {
			ExchangeOutcome::Exchanged => Ok(access),
			ExchangeOutcome::VerifierMismatch =>
				Err(Error::InvalidOrConsumedToken { reason: "verifier mismatch".into() }),
			ExchangeOutcome::NotExchangeable => Err(Error::InvalidOrConsumedToken {
				reason: "request token already consumed or never authorized".into(),
			}),
			ExchangeOutcome::Missing =>
				Err(Error::InvalidOrConsumedToken { reason: "unknown request token".into() }),
		}
	}

	/// Fetches a live access token record, if one exists for the value.
	pub async fn get_access_token(&self, value: &str) -> Result<Option<TokenRecord>> {
		let record = self.store.load(value).await?;

		Ok(record.filter(|record| record.is_access() && !record.is_revoked()))
	}

	/// Revokes the token with the provided value, returning the affected record.
	pub async fn revoke(&self, value: &str) -> Result<Option<TokenRecord>> {
		let Some(mut record) = self.store.load(value).await? else {
			return Ok(None);
		};

		record.revoke(OffsetDateTime::now_utc());
		self.store.save(record.clone()).await?;

		Ok(Some(record))
	}

	fn exchange_guard(&self, value: &str) -> Arc<AsyncMutex<()>> {
		let mut guards = self.exchange_guards.lock();

		guards.entry(value.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Debug for TokenIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenIssuer")
			.field("request_token_ttl", &self.request_token_ttl)
			.finish()
	}
}

fn mint(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
