//! Per-call request signing with an obtained access grant.

// self
use crate::{
	_prelude::*,
	auth::ConsumerIdentity,
	flows::{AccessGrant, Consumer},
	http::{Transport, TransportRequest},
	message,
	obs::{self, HandshakeStep, StepOutcome, StepSpan},
	sig::SignatureMethod,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

impl<T> Consumer<T>
where
	T: ?Sized + Transport,
{
	/// Builds a [`SigningHandler`] from this session's obtained grant.
	///
	/// Fails when the handshake has not completed for this session.
	pub async fn signing_handler(&self) -> Result<SigningHandler> {
		let grant = self.access_grant().await?.ok_or_else(|| Error::AccessDenied {
			reason: "no access token has been obtained for this session".into(),
		})?;
		let mut handler =
			SigningHandler::new(self.identity.clone(), grant, self.description.preferred_method());

		if let Some(realm) = &self.description.realm {
			handler = handler.with_realm(realm.clone());
		}

		Ok(handler)
	}
}

/// Signs outbound API requests with a fixed consumer identity and access grant.
///
/// Every call gets a fresh nonce and timestamp; the handler itself is cheap to
/// clone and holds no per-request state.
#[derive(Clone, Debug)]
pub struct SigningHandler {
	identity: ConsumerIdentity,
	grant: AccessGrant,
	method: SignatureMethod,
	realm: Option<String>,
}
impl SigningHandler {
	/// Creates a handler for the provided identity, grant, and method.
	pub fn new(identity: ConsumerIdentity, grant: AccessGrant, method: SignatureMethod) -> Self {
		Self { identity, grant, method, realm: None }
	}

	/// Announces a protection realm at the head of every header.
	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// The grant this handler signs with.
	pub fn grant(&self) -> &AccessGrant {
		&self.grant
	}

	/// Computes the `Authorization` header for one call.
	///
	/// `body_params` must hold the request's form-encoded body parameters, if
	/// any, since the signature covers them.
	pub fn authorization_header(
		&self,
		http_method: &str,
		uri: &Url,
		body_params: &[(String, String)],
	) -> Result<String> {
		message::build_authorization_header(
			&self.identity,
			&self.grant.token,
			self.grant.secret().expose(),
			self.method,
			self.realm.as_deref(),
			http_method,
			uri,
			body_params,
		)
	}

	/// Signs `request` in place by attaching an `Authorization` header.
	///
	/// A form-encoded body is decoded so its parameters enter the signature;
	/// other body kinds are left out of the base string, as the protocol
	/// prescribes.
	pub fn apply(&self, request: &mut TransportRequest) -> Result<()> {
		const STEP: HandshakeStep = HandshakeStep::SignedCall;

		let _guard = StepSpan::new(STEP, "apply").entered();

		obs::record_step_outcome(STEP, StepOutcome::Attempt);

		let body_params = form_body_params(request);
		let result =
			self.authorization_header(&request.method, &request.url, &body_params)
				.map(|header| request.headers.push(("authorization".into(), header)));

		match &result {
			Ok(()) => obs::record_step_outcome(STEP, StepOutcome::Success),
			Err(_) => obs::record_step_outcome(STEP, StepOutcome::Failure),
		}

		result
	}
}

fn form_body_params(request: &TransportRequest) -> Vec<(String, String)> {
	let is_form = request.headers.iter().any(|(name, value)| {
		name.eq_ignore_ascii_case("content-type") && value.starts_with(FORM_CONTENT_TYPE)
	});

	if !is_form {
		return Vec::new();
	}

	request
		.body
		.as_deref()
		.map(|body| {
			url::form_urlencoded::parse(body)
				.map(|(key, value)| (key.into_owned(), value.into_owned()))
				.collect()
		})
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ConsumerKey, message::parse_token_response, sig};

	fn handler(method: SignatureMethod) -> SigningHandler {
		let identity = ConsumerIdentity::new(
			ConsumerKey::new("sampleconsumer").expect("Consumer key fixture should be valid."),
			"samplesecret",
		);
		let issued = parse_token_response("oauth_token=T2&oauth_token_secret=S2")
			.expect("Grant fixture should parse successfully.");

		SigningHandler::new(identity, AccessGrant::from_issued(issued), method)
	}

	#[test]
	fn apply_attaches_a_header_covering_the_form_body() {
		let url = Url::parse("https://provider.example/api/resource")
			.expect("URL fixture should parse successfully.");
		let mut request = TransportRequest::form_post(url.clone(), "q=rust&page=2".into());

		handler(SignatureMethod::HmacSha1)
			.apply(&mut request)
			.expect("Signing a form request should succeed.");

		let header = request
			.headers
			.iter()
			.find(|(name, _)| name == "authorization")
			.map(|(_, value)| value.clone())
			.expect("An authorization header should be attached.");

		assert!(header.starts_with("OAuth "));
		assert!(header.contains("oauth_token=\"T2\""));

		// Reassemble header + body parameters and verify the signature holds.
		let mut parameters: Vec<(String, String)> = header
			.trim_start_matches("OAuth ")
			.split(", ")
			.map(|field| {
				let (key, quoted) =
					field.split_once('=').expect("Header fields should be key=value pairs.");
				let decoded: String =
					url::form_urlencoded::parse(format!("v={}", quoted.trim_matches('"')).as_bytes())
						.next()
						.map(|(_, v)| v.into_owned())
						.expect("Header values should decode.");

				(key.to_owned(), decoded)
			})
			.collect();

		parameters.push(("q".into(), "rust".into()));
		parameters.push(("page".into(), "2".into()));
		sig::verify("POST", &url, &parameters, "samplesecret", Some("S2"))
			.expect("Applied signature should verify against both secrets.");
	}

	#[test]
	fn non_form_bodies_stay_out_of_the_signature() {
		let url = Url::parse("https://provider.example/api/upload")
			.expect("URL fixture should parse successfully.");
		let mut request = TransportRequest {
			method: "POST".into(),
			url: url.clone(),
			headers: vec![("content-type".into(), "application/json".into())],
			body: Some(br#"{"q":"rust"}"#.to_vec()),
		};

		handler(SignatureMethod::HmacSha1)
			.apply(&mut request)
			.expect("Signing a JSON request should succeed.");

		let header = request
			.headers
			.iter()
			.find(|(name, _)| name == "authorization")
			.map(|(_, value)| value.clone())
			.expect("An authorization header should be attached.");
		let parameters: Vec<(String, String)> = header
			.trim_start_matches("OAuth ")
			.split(", ")
			.map(|field| {
				let (key, quoted) =
					field.split_once('=').expect("Header fields should be key=value pairs.");
				let decoded: String =
					url::form_urlencoded::parse(format!("v={}", quoted.trim_matches('"')).as_bytes())
						.next()
						.map(|(_, v)| v.into_owned())
						.expect("Header values should decode.");

				(key.to_owned(), decoded)
			})
			.collect();

		sig::verify("POST", &url, &parameters, "samplesecret", Some("S2"))
			.expect("Signature over protocol parameters alone should verify.");
	}
}
