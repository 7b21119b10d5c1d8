//! Builders and parsers for the three OAuth exchange messages and the per-call
//! Authorization header.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::ConsumerIdentity,
	error::TransientError,
	provider::ServiceProviderDescription,
	sig::{
		self, OAUTH_CALLBACK, OAUTH_CONSUMER_KEY, OAUTH_NONCE, OAUTH_SIGNATURE,
		OAUTH_SIGNATURE_METHOD, OAUTH_TIMESTAMP, OAUTH_TOKEN, OAUTH_TOKEN_SECRET, OAUTH_VERIFIER,
		OAUTH_VERSION, OAUTH_VERSION_1, SignatureMethod, SignedRequest, percent_encode,
	},
};

const NONCE_LEN: usize = 16;
/// Placeholder callback value for consumers that cannot receive redirects.
pub const OUT_OF_BAND: &str = "oob";

/// Token and verifier recovered from the provider's authorization callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackParams {
	/// Request token value being approved.
	pub token: String,
	/// Approval verifier minted by the provider.
	pub verifier: String,
}

/// Token material parsed from a provider's form-encoded token response.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
	/// Minted token value.
	pub token: String,
	/// Minted token secret.
	pub secret: String,
	/// Any additional response parameters.
	pub extra: BTreeMap<String, String>,
}
impl Debug for IssuedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedToken")
			.field("token", &self.token)
			.field("secret", &"<redacted>")
			.field("extra", &self.extra)
			.finish()
	}
}

/// Builds the signed request-token request (handshake step one).
pub fn build_request_token_request(
	description: &ServiceProviderDescription,
	consumer: &ConsumerIdentity,
	callback: Option<&Url>,
	extra_params: &[(String, String)],
) -> Result<SignedRequest> {
	let method = description.preferred_method();
	let mut parameters = protocol_params(consumer, method);

	parameters.push((
		OAUTH_CALLBACK.to_owned(),
		callback.map(Url::to_string).unwrap_or_else(|| OUT_OF_BAND.to_owned()),
	));
	parameters.extend(extra_params.iter().cloned());

	finish_signed(
		description.endpoints.request_token.clone(),
		parameters,
		method,
		consumer,
		None,
	)
}

/// Builds the redirect URI pointing the resource owner at the provider's
/// authorization endpoint (handshake step two).
pub fn build_user_authorization_redirect(
	description: &ServiceProviderDescription,
	request_token: &str,
	extra_params: &[(String, String)],
) -> Url {
	let mut url = description.endpoints.user_authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair(OAUTH_TOKEN, request_token);

	for (key, value) in extra_params {
		pairs.append_pair(key, value);
	}

	drop(pairs);

	url
}

/// Builds the signed access-token request (handshake step three).
pub fn build_access_token_request(
	description: &ServiceProviderDescription,
	consumer: &ConsumerIdentity,
	request_token: &str,
	request_token_secret: &str,
	verifier: &str,
) -> Result<SignedRequest> {
	let method = description.preferred_method();
	let mut parameters = protocol_params(consumer, method);

	parameters.push((OAUTH_TOKEN.to_owned(), request_token.to_owned()));
	parameters.push((OAUTH_VERIFIER.to_owned(), verifier.to_owned()));

	finish_signed(
		description.endpoints.access_token.clone(),
		parameters,
		method,
		consumer,
		Some(request_token_secret),
	)
}

/// Parses the provider's callback query string into token and verifier.
pub fn parse_callback(query: &str) -> Result<CallbackParams> {
	let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect();
	let token = find(&pairs, OAUTH_TOKEN)
		.ok_or(Error::MissingCallbackParameters { missing: OAUTH_TOKEN })?;
	let verifier = find(&pairs, OAUTH_VERIFIER)
		.ok_or(Error::MissingCallbackParameters { missing: OAUTH_VERIFIER })?;

	Ok(CallbackParams { token, verifier })
}

/// Parses a form-encoded token response body into its minted token material.
pub fn parse_token_response(body: &str) -> Result<IssuedToken> {
	let pairs: Vec<(String, String)> = url::form_urlencoded::parse(body.as_bytes())
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect();
	let token = find(&pairs, OAUTH_TOKEN).ok_or_else(|| missing_response_key(OAUTH_TOKEN))?;
	let secret =
		find(&pairs, OAUTH_TOKEN_SECRET).ok_or_else(|| missing_response_key(OAUTH_TOKEN_SECRET))?;
	let extra = pairs
		.into_iter()
		.filter(|(key, _)| key != OAUTH_TOKEN && key != OAUTH_TOKEN_SECRET)
		.collect();

	Ok(IssuedToken { token, secret, extra })
}

/// Builds the `Authorization` header for a signed API call.
///
/// The signature covers the URI query and `body_params` alongside the protocol
/// parameters, but only the protocol parameters travel in the header. A realm,
/// when given, leads the header and stays outside the signature.
pub fn build_authorization_header(
	consumer: &ConsumerIdentity,
	access_token: &str,
	access_token_secret: &str,
	signature_method: SignatureMethod,
	realm: Option<&str>,
	http_method: &str,
	uri: &Url,
	body_params: &[(String, String)],
) -> Result<String> {
	let mut parameters = protocol_params(consumer, signature_method);

	parameters.push((OAUTH_TOKEN.to_owned(), access_token.to_owned()));

	let mut signed_over = parameters.clone();

	signed_over.extend(body_params.iter().cloned());

	let signature = sig::sign(
		http_method,
		uri,
		&signed_over,
		signature_method,
		consumer.secret().expose(),
		Some(access_token_secret),
	)?;
	// Header order is fixed: consumer key, token, method, signature, timestamp,
	// nonce, version.
	let timestamp = lookup(&parameters, OAUTH_TIMESTAMP);
	let nonce = lookup(&parameters, OAUTH_NONCE);
	let fields = [
		(OAUTH_CONSUMER_KEY, consumer.key.as_ref()),
		(OAUTH_TOKEN, access_token),
		(OAUTH_SIGNATURE_METHOD, signature_method.as_str()),
		(OAUTH_SIGNATURE, signature.as_str()),
		(OAUTH_TIMESTAMP, timestamp),
		(OAUTH_NONCE, nonce),
		(OAUTH_VERSION, OAUTH_VERSION_1),
	];
	let rendered = fields
		.iter()
		.map(|(key, value)| format!("{key}=\"{}\"", percent_encode(value)))
		.collect::<Vec<_>>()
		.join(", ");

	match realm {
		Some(realm) => Ok(format!("OAuth realm=\"{realm}\", {rendered}")),
		None => Ok(format!("OAuth {rendered}")),
	}
}

fn protocol_params(
	consumer: &ConsumerIdentity,
	method: SignatureMethod,
) -> Vec<(String, String)> {
	vec![
		(OAUTH_CONSUMER_KEY.to_owned(), consumer.key.as_ref().to_owned()),
		(OAUTH_SIGNATURE_METHOD.to_owned(), method.as_str().to_owned()),
		(OAUTH_TIMESTAMP.to_owned(), OffsetDateTime::now_utc().unix_timestamp().to_string()),
		(OAUTH_NONCE.to_owned(), fresh_nonce()),
		(OAUTH_VERSION.to_owned(), OAUTH_VERSION_1.to_owned()),
	]
}

fn finish_signed(
	base_uri: Url,
	mut parameters: Vec<(String, String)>,
	method: SignatureMethod,
	consumer: &ConsumerIdentity,
	token_secret: Option<&str>,
) -> Result<SignedRequest> {
	let signature = sig::sign(
		"POST",
		&base_uri,
		&parameters,
		method,
		consumer.secret().expose(),
		token_secret,
	)?;

	parameters.push((OAUTH_SIGNATURE.to_owned(), signature.clone()));

	Ok(SignedRequest {
		http_method: "POST".into(),
		base_uri,
		parameters,
		signature_method: method,
		signature,
	})
}

fn find(pairs: &[(String, String)], name: &str) -> Option<String> {
	pairs.iter().find(|(key, _)| key == name).map(|(_, value)| value.clone())
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> &'a str {
	pairs.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str()).unwrap_or("")
}

fn missing_response_key(name: &'static str) -> Error {
	TransientError::Endpoint {
		message: format!("token response is missing `{name}`"),
		status: None,
	}
	.into()
}

fn fresh_nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{ConsumerKey, ProviderId};

	fn consumer() -> ConsumerIdentity {
		ConsumerIdentity::new(
			ConsumerKey::new("sampleconsumer").expect("Consumer key fixture should be valid."),
			"samplesecret",
		)
	}

	fn description(method: SignatureMethod) -> ServiceProviderDescription {
		ServiceProviderDescription::builder(
			ProviderId::new("test-provider").expect("Provider identifier fixture should be valid."),
		)
		.request_token_endpoint(
			Url::parse("https://provider.example/oauth/request_token")
				.expect("Request-token endpoint fixture should parse."),
		)
		.user_authorization_endpoint(
			Url::parse("https://provider.example/oauth/authorize")
				.expect("Authorization endpoint fixture should parse."),
		)
		.access_token_endpoint(
			Url::parse("https://provider.example/oauth/access_token")
				.expect("Access-token endpoint fixture should parse."),
		)
		.accept_method(method)
		.build()
		.expect("Description fixture should build successfully.")
	}

	#[test]
	fn request_token_request_carries_callback_and_verifies() {
		let description = description(SignatureMethod::HmacSha1);
		let callback =
			Url::parse("https://client/cb").expect("Callback fixture should parse successfully.");
		let request = build_request_token_request(
			&description,
			&consumer(),
			Some(&callback),
			&[("scope".to_owned(), "profile|email".to_owned())],
		)
		.expect("Request-token request should build successfully.");

		assert_eq!(request.http_method, "POST");
		assert!(
			request
				.parameters
				.iter()
				.any(|(key, value)| key == OAUTH_CALLBACK && value == "https://client/cb")
		);
		sig::verify(
			&request.http_method,
			&request.base_uri,
			&request.parameters,
			"samplesecret",
			None,
		)
		.expect("Freshly built request should verify against the consumer secret.");
	}

	#[test]
	fn absent_callback_falls_back_to_out_of_band() {
		let request =
			build_request_token_request(&description(SignatureMethod::HmacSha1), &consumer(), None, &[])
				.expect("Request-token request should build successfully.");

		assert!(
			request
				.parameters
				.iter()
				.any(|(key, value)| key == OAUTH_CALLBACK && value == OUT_OF_BAND)
		);
	}

	#[test]
	fn redirect_contains_the_request_token() {
		let redirect =
			build_user_authorization_redirect(&description(SignatureMethod::HmacSha1), "T1", &[(
				"lang".to_owned(),
				"en".to_owned(),
			)]);

		assert!(redirect.as_str().contains("oauth_token=T1"));
		assert!(redirect.as_str().contains("lang=en"));
	}

	#[test]
	fn access_token_request_signs_with_the_request_token_secret() {
		let description = description(SignatureMethod::HmacSha1);
		let request =
			build_access_token_request(&description, &consumer(), "T1", "T1-secret", "V1")
				.expect("Access-token request should build successfully.");

		assert!(request.parameters.iter().any(|(key, value)| key == OAUTH_VERIFIER && value == "V1"));
		sig::verify(
			&request.http_method,
			&request.base_uri,
			&request.parameters,
			"samplesecret",
			Some("T1-secret"),
		)
		.expect("Access-token request should verify against both secrets.");
	}

	#[test]
	fn callback_parsing_requires_token_and_verifier() {
		let parsed = parse_callback("oauth_token=T1&oauth_verifier=V1")
			.expect("Complete callback should parse successfully.");

		assert_eq!(parsed, CallbackParams { token: "T1".into(), verifier: "V1".into() });
		assert!(matches!(
			parse_callback("oauth_verifier=V1"),
			Err(Error::MissingCallbackParameters { missing: OAUTH_TOKEN })
		));
		assert!(matches!(
			parse_callback("oauth_token=T1"),
			Err(Error::MissingCallbackParameters { missing: OAUTH_VERIFIER })
		));
	}

	#[test]
	fn token_response_parsing_collects_extras() {
		let issued = parse_token_response("oauth_token=T1&oauth_token_secret=S1&scope=profile")
			.expect("Complete token response should parse successfully.");

		assert_eq!(issued.token, "T1");
		assert_eq!(issued.secret, "S1");
		assert_eq!(issued.extra.get("scope").map(String::as_str), Some("profile"));
		assert!(matches!(
			parse_token_response("oauth_token=T1"),
			Err(Error::Transient(TransientError::Endpoint { .. }))
		));

		let rendered = format!("{issued:?}");

		assert!(!rendered.contains("S1"), "Debug output must redact the minted secret.");
	}

	#[test]
	fn authorization_header_has_the_fixed_field_order() {
		let uri = Url::parse("https://provider.example/api/resource")
			.expect("API URI fixture should parse successfully.");
		let header = build_authorization_header(
			&consumer(),
			"T2",
			"T2-secret",
			SignatureMethod::Plaintext,
			None,
			"POST",
			&uri,
			&[],
		)
		.expect("Authorization header should build successfully.");

		assert!(header.starts_with("OAuth oauth_consumer_key=\"sampleconsumer\", oauth_token=\"T2\", oauth_signature_method=\"PLAINTEXT\", oauth_signature=\"samplesecret%26T2-secret\", oauth_timestamp=\""));
		assert!(header.ends_with("oauth_version=\"1.0\""));
	}

	#[test]
	fn a_realm_leads_the_header_without_entering_the_signature() {
		let uri = Url::parse("https://provider.example/api/resource")
			.expect("API URI fixture should parse successfully.");
		let bare = build_authorization_header(
			&consumer(),
			"T2",
			"T2-secret",
			SignatureMethod::Plaintext,
			None,
			"POST",
			&uri,
			&[],
		)
		.expect("Authorization header should build successfully.");
		let with_realm = build_authorization_header(
			&consumer(),
			"T2",
			"T2-secret",
			SignatureMethod::Plaintext,
			Some("https://provider.example/"),
			"POST",
			&uri,
			&[],
		)
		.expect("Authorization header should build successfully.");

		assert!(with_realm.starts_with("OAuth realm=\"https://provider.example/\", "));
		// Plaintext signatures depend on the secrets alone, so both headers
		// must carry the identical signature field.
		let signature_of = |header: &str| {
			header
				.split(", ")
				.find(|field| field.starts_with("oauth_signature="))
				.map(str::to_owned)
		};

		assert_eq!(signature_of(&bare), signature_of(&with_realm));
	}

	#[test]
	fn authorization_header_signature_covers_body_params() {
		let uri = Url::parse("https://provider.example/api/resource")
			.expect("API URI fixture should parse successfully.");
		let body = vec![("q".to_owned(), "rust".to_owned())];
		let header = build_authorization_header(
			&consumer(),
			"T2",
			"T2-secret",
			SignatureMethod::HmacSha1,
			None,
			"POST",
			&uri,
			&body,
		)
		.expect("Authorization header should build successfully.");
		let mut parameters: Vec<(String, String)> = header
			.trim_start_matches("OAuth ")
			.split(", ")
			.map(|field| {
				let (key, quoted) =
					field.split_once('=').expect("Header fields should be key=value pairs.");
				let value = quoted.trim_matches('"');
				let decoded: String = url::form_urlencoded::parse(
					format!("v={value}").as_bytes(),
				)
				.next()
				.map(|(_, v)| v.into_owned())
				.expect("Header values should decode.");

				(key.to_owned(), decoded)
			})
			.collect();

		parameters.extend(body);
		sig::verify("POST", &uri, &parameters, "samplesecret", Some("T2-secret"))
			.expect("Header parameters plus body should verify.");
	}
}
