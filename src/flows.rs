//! High-level consumer orchestration for the three-legged handshake.

pub mod handshake;
pub mod signing;

pub use handshake::*;
pub use signing::*;

// self
use crate::{
	_prelude::*,
	auth::{ConsumerIdentity, TokenSecret},
	http::Transport,
	message,
	provider::ServiceProviderDescription,
	session::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Consumer specialized for the crate's default reqwest transport.
pub type ReqwestConsumer = Consumer<ReqwestTransport>;

/// Session slot prefix for pending request-token secrets, keyed by token value.
pub(crate) const SLOT_PENDING_PREFIX: &str = "oauth1.pending.";
/// Session slot naming the most recently issued pending request token.
pub(crate) const SLOT_PENDING_CURRENT: &str = "oauth1.pending";
/// Session slot holding the obtained access grant, form-encoded.
pub(crate) const SLOT_ACCESS: &str = "oauth1.access";

/// Coordinates the handshake against a single service provider.
///
/// The consumer owns the transport, the provider description, its own identity,
/// and a session for in-flight state, so the handshake steps can focus on
/// message construction and outcome mapping. One consumer serves one resource
/// owner's session; share the transport across consumers instead.
#[derive(Clone)]
pub struct Consumer<T>
where
	T: ?Sized + Transport,
{
	/// Transport used for every outbound provider request.
	pub transport: Arc<T>,
	/// Endpoints and accepted signature methods of the provider.
	pub description: ServiceProviderDescription,
	/// Key and secret identifying this consumer to the provider.
	pub identity: ConsumerIdentity,
	/// Session storing pending secrets and the obtained grant.
	pub session: Arc<dyn SessionStore>,
}
impl<T> Consumer<T>
where
	T: ?Sized + Transport,
{
	/// Creates a consumer that reuses the caller-provided transport.
	pub fn with_transport(
		description: ServiceProviderDescription,
		identity: ConsumerIdentity,
		session: Arc<dyn SessionStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self { transport: transport.into(), description, identity, session }
	}
}
#[cfg(feature = "reqwest")]
impl Consumer<ReqwestTransport> {
	/// Creates a consumer with its own reqwest-backed transport.
	pub fn new(
		description: ServiceProviderDescription,
		identity: ConsumerIdentity,
		session: Arc<dyn SessionStore>,
	) -> Self {
		Self::with_transport(description, identity, session, ReqwestTransport::default())
	}
}
impl<T> Debug for Consumer<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Consumer")
			.field("description", &self.description)
			.field("identity", &self.identity)
			.finish_non_exhaustive()
	}
}

/// Where a session currently stands in the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeState {
	/// No request token issued and no access grant held.
	Unauthenticated,
	/// A request token is pending the resource owner's approval.
	AwaitingUserAuthorization,
	/// An access grant is available for signed calls.
	AccessTokenObtained,
}

/// An access token plus secret obtained by completing the handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessGrant {
	/// Access token value presented on every signed call.
	pub token: String,
	secret: TokenSecret,
	/// Additional parameters the provider returned alongside the token.
	pub extra: BTreeMap<String, String>,
}
impl AccessGrant {
	/// Token secret contributed to signing keys. Handle with care.
	pub fn secret(&self) -> &TokenSecret {
		&self.secret
	}

	pub(crate) fn from_issued(issued: message::IssuedToken) -> Self {
		Self {
			token: issued.token,
			secret: TokenSecret::new(issued.secret),
			extra: issued.extra,
		}
	}

	pub(crate) fn to_form(&self) -> String {
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		serializer.append_pair(crate::sig::OAUTH_TOKEN, &self.token);
		serializer.append_pair(crate::sig::OAUTH_TOKEN_SECRET, self.secret.expose());

		for (key, value) in &self.extra {
			serializer.append_pair(key, value);
		}

		serializer.finish()
	}
}
impl Debug for AccessGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessGrant")
			.field("token", &self.token)
			.field("secret", &self.secret)
			.field("extra", &self.extra)
			.finish()
	}
}
