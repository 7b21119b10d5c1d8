//! Token record structs, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{
		id::{ConsumerKey, ResourceOwnerId},
		token::secret::TokenSecret,
	},
};

/// Token classes minted by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Short-lived token exchanged for user approval, single-use.
	Request,
	/// Long-lived token authorizing API calls until revoked.
	Access,
}

/// Lifecycle stage of a request token. Access tokens stay in [`TokenState::Issued`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
	/// Freshly minted; not yet approved by a resource owner.
	Issued,
	/// Resource owner approved; a verifier has been attached.
	Authorized,
	/// Exchanged for an access token; must never be exchangeable again.
	Consumed,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no token value was provided.
	#[error("Token value is required.")]
	MissingValue,
	/// Issued when no token secret was provided.
	#[error("Token secret is required.")]
	MissingSecret,
}

/// Record describing a minted request or access token.
///
/// The token store exclusively owns the mapping from token value to record;
/// callers hold only the opaque value string.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Opaque token value sent on the wire.
	pub value: String,
	/// Token secret; never transmitted in the clear.
	pub secret: TokenSecret,
	/// Whether this is a request or an access token.
	pub kind: TokenKind,
	/// Consumer key the token was minted for.
	pub consumer: ConsumerKey,
	/// Callback URI registered at the request-token step.
	pub callback: Option<Url>,
	/// Verifier attached when the resource owner approved the token.
	pub verifier: Option<TokenSecret>,
	/// Resource owner who approved the token, once authorized.
	pub resource_owner: Option<ResourceOwnerId>,
	/// Provider-defined associated data (e.g. granted scopes).
	pub associated: BTreeMap<String, String>,
	/// Minting instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant for request tokens; access tokens live until revoked.
	pub expires_at: Option<OffsetDateTime>,
	/// Lifecycle stage.
	pub state: TokenState,
	/// Revocation instant if the record has been revoked.
	pub revoked_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Returns a builder for the provided kind and owning consumer.
	pub fn builder(kind: TokenKind, consumer: ConsumerKey) -> TokenRecordBuilder {
		TokenRecordBuilder::new(kind, consumer)
	}

	/// Returns `true` for request tokens.
	pub fn is_request(&self) -> bool {
		matches!(self.kind, TokenKind::Request)
	}

	/// Returns `true` for access tokens.
	pub fn is_access(&self) -> bool {
		matches!(self.kind, TokenKind::Access)
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expiry| instant >= expiry)
	}

	/// Returns `true` if the record has been revoked.
	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	/// Returns `true` when a request token may still be exchanged.
	pub fn is_exchangeable_at(&self, instant: OffsetDateTime) -> bool {
		self.is_request()
			&& matches!(self.state, TokenState::Authorized)
			&& !self.is_expired_at(instant)
			&& !self.is_revoked()
	}

	/// Attaches the approval verifier and resource owner, moving the record to
	/// [`TokenState::Authorized`].
	pub fn authorize(&mut self, verifier: impl Into<String>, owner: ResourceOwnerId) {
		self.verifier = Some(TokenSecret::new(verifier));
		self.resource_owner = Some(owner);
		self.state = TokenState::Authorized;
	}

	/// Marks the record as consumed by an exchange.
	pub fn consume(&mut self) {
		self.state = TokenState::Consumed;
	}

	/// Marks the record as revoked.
	pub fn revoke(&mut self, instant: OffsetDateTime) {
		self.revoked_at = Some(instant);
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("value", &self.value)
			.field("secret", &"<redacted>")
			.field("kind", &self.kind)
			.field("consumer", &self.consumer)
			.field("callback", &self.callback)
			.field("verifier", &self.verifier.as_ref().map(|_| "<redacted>"))
			.field("resource_owner", &self.resource_owner)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("state", &self.state)
			.field("revoked_at", &self.revoked_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	kind: TokenKind,
	consumer: ConsumerKey,
	value: Option<String>,
	secret: Option<TokenSecret>,
	callback: Option<Url>,
	associated: BTreeMap<String, String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	fn new(kind: TokenKind, consumer: ConsumerKey) -> Self {
		Self {
			kind,
			consumer,
			value: None,
			secret: None,
			callback: None,
			associated: BTreeMap::new(),
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Provides the opaque token value.
	pub fn value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());

		self
	}

	/// Provides the token secret.
	pub fn secret(mut self, secret: impl Into<String>) -> Self {
		self.secret = Some(TokenSecret::new(secret));

		self
	}

	/// Registers the consumer's callback URI.
	pub fn callback(mut self, callback: Url) -> Self {
		self.callback = Some(callback);

		self
	}

	/// Replaces the associated data mapping.
	pub fn associated(mut self, associated: BTreeMap<String, String>) -> Self {
		self.associated = associated;

		self
	}

	/// Attaches a single associated data entry.
	pub fn associate(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.associated.insert(key.into(), value.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let value = self.value.ok_or(TokenRecordBuilderError::MissingValue)?;
		let secret = self.secret.ok_or(TokenRecordBuilderError::MissingSecret)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(issued_at + delta),
			(None, None) => None,
		};

		Ok(TokenRecord {
			value,
			secret,
			kind: self.kind,
			consumer: self.consumer,
			callback: self.callback,
			verifier: None,
			resource_owner: None,
			associated: self.associated,
			issued_at,
			expires_at,
			state: TokenState::Issued,
			revoked_at: None,
		})
	}
}
