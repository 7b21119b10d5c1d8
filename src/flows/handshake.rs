//! The three handshake legs: request token, user redirect, access-token exchange.
//!
//! Pending request-token secrets live in session slots keyed by token value, so
//! a session can hold several outstanding authorizations at once and callbacks
//! may arrive in any order. The obtained grant is persisted form-encoded in a
//! single slot and replaces any previous grant.

// self
use crate::{
	_prelude::*,
	error::TransientError,
	flows::{AccessGrant, Consumer, HandshakeState, SLOT_ACCESS, SLOT_PENDING_CURRENT,
		SLOT_PENDING_PREFIX},
	http::{Transport, TransportRequest, TransportResponse},
	message,
	obs::{self, HandshakeStep, StepOutcome, StepSpan},
	sig::SignedRequest,
};

impl<T> Consumer<T>
where
	T: ?Sized + Transport,
{
	/// Obtains an unauthorized request token and returns the URI to redirect the
	/// resource owner to (handshake steps one and two).
	///
	/// `callback` is where the provider sends the owner after approval; `None`
	/// requests out-of-band delivery. `extra_request` parameters travel in the
	/// signed request-token request, `extra_redirect` in the redirect URI.
	pub async fn prepare_request_user_authorization(
		&self,
		callback: Option<&Url>,
		extra_request: &[(String, String)],
		extra_redirect: &[(String, String)],
	) -> Result<Url> {
		const STEP: HandshakeStep = HandshakeStep::RequestToken;

		let span = StepSpan::new(STEP, "prepare_request_user_authorization");

		obs::record_step_outcome(STEP, StepOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = message::build_request_token_request(
					&self.description,
					&self.identity,
					callback,
					extra_request,
				)?;
				let response = self.post_signed(&request).await?;
				let issued = message::parse_token_response(&require_success(response)?)?;

				self.session
					.set(&format!("{SLOT_PENDING_PREFIX}{}", issued.token), issued.secret)
					.await?;
				self.session.set(SLOT_PENDING_CURRENT, issued.token.clone()).await?;

				Ok(message::build_user_authorization_redirect(
					&self.description,
					&issued.token,
					extra_redirect,
				))
			})
			.await;

		obs::record_step_outcome(STEP, outcome_of(&result));

		result
	}

	/// Completes the handshake from the provider's callback query string
	/// (handshake step three) and returns the obtained grant.
	///
	/// The callback must name a token this session prepared; the matching
	/// pending secret signs the exchange and is discarded afterwards.
	pub async fn process_user_authorization_callback(&self, query: &str) -> Result<AccessGrant> {
		const STEP: HandshakeStep = HandshakeStep::AccessToken;

		let span = StepSpan::new(STEP, "process_user_authorization_callback");

		obs::record_step_outcome(STEP, StepOutcome::Attempt);

		let result = span
			.instrument(async move {
				let params = message::parse_callback(query)?;
				let pending_slot = format!("{SLOT_PENDING_PREFIX}{}", params.token);
				let request_secret = self.session.get(&pending_slot).await?.ok_or_else(|| {
					Error::InvalidOrConsumedToken {
						reason: "no pending authorization matches the callback token".into(),
					}
				})?;
				let request = message::build_access_token_request(
					&self.description,
					&self.identity,
					&params.token,
					&request_secret,
					&params.verifier,
				)?;
				let response = self.post_signed(&request).await?;
				let issued = message::parse_token_response(&require_success(response)?)?;
				let grant = AccessGrant::from_issued(issued);

				self.session.set(SLOT_ACCESS, grant.to_form()).await?;
				self.session.remove(&pending_slot).await?;
				self.session.remove(SLOT_PENDING_CURRENT).await?;

				Ok(grant)
			})
			.await;

		obs::record_step_outcome(STEP, outcome_of(&result));

		result
	}

	/// Returns the grant obtained by this session, if the handshake completed.
	pub async fn access_grant(&self) -> Result<Option<AccessGrant>> {
		let Some(form) = self.session.get(SLOT_ACCESS).await? else {
			return Ok(None);
		};
		let issued = message::parse_token_response(&form)?;

		Ok(Some(AccessGrant::from_issued(issued)))
	}

	/// Reports where this session currently stands in the handshake.
	pub async fn handshake_state(&self) -> Result<HandshakeState> {
		if self.session.get(SLOT_ACCESS).await?.is_some() {
			return Ok(HandshakeState::AccessTokenObtained);
		}
		if self.session.get(SLOT_PENDING_CURRENT).await?.is_some() {
			return Ok(HandshakeState::AwaitingUserAuthorization);
		}

		Ok(HandshakeState::Unauthenticated)
	}

	async fn post_signed(&self, request: &SignedRequest) -> Result<TransportResponse> {
		let outbound =
			TransportRequest::form_post(request.base_uri.clone(), request.form_body());

		Ok(self.transport.send(outbound).await?)
	}
}

fn require_success(response: TransportResponse) -> Result<String> {
	if response.is_success() {
		return Ok(response.text());
	}

	let body = response.text();

	match response.status {
		401 | 403 => Err(Error::AccessDenied {
			reason: if body.is_empty() {
				format!("provider rejected the request with status {}", response.status)
			} else {
				body
			},
		}),
		status => Err(TransientError::Endpoint {
			message: if body.is_empty() { "empty response body".into() } else { body },
			status: Some(status),
		}
		.into()),
	}
}

fn outcome_of<V>(result: &Result<V>) -> StepOutcome {
	if result.is_ok() { StepOutcome::Success } else { StepOutcome::Failure }
}
