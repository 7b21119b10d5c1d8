//! Signature engine: canonical base strings, tamper-protection methods, and
//! sign/verify entry points.
//!
//! The base-string construction and signing-key derivation follow RFC 5849
//! §3.4; verification recomputes the signature and compares it in constant
//! time so the provider side never leaks timing information.

pub mod base_string;
pub mod method;

pub use base_string::*;
pub use method::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Protocol parameter: consumer key.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
/// Protocol parameter: request or access token value.
pub const OAUTH_TOKEN: &str = "oauth_token";
/// Protocol parameter: signature method label.
pub const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
/// Protocol parameter: computed signature.
pub const OAUTH_SIGNATURE: &str = "oauth_signature";
/// Protocol parameter: request timestamp (seconds since Unix epoch).
pub const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
/// Protocol parameter: single-use random value.
pub const OAUTH_NONCE: &str = "oauth_nonce";
/// Protocol parameter: protocol version.
pub const OAUTH_VERSION: &str = "oauth_version";
/// Protocol parameter: consumer callback URI (request-token step).
pub const OAUTH_CALLBACK: &str = "oauth_callback";
/// Protocol parameter: approval verifier (access-token step).
pub const OAUTH_VERIFIER: &str = "oauth_verifier";
/// Response parameter: minted token secret.
pub const OAUTH_TOKEN_SECRET: &str = "oauth_token_secret";
/// Fixed protocol version value.
pub const OAUTH_VERSION_1: &str = "1.0";

/// A transient, fully signed outbound request. Constructed per call, never persisted.
#[derive(Clone, Debug)]
pub struct SignedRequest {
	/// HTTP method the signature covers.
	pub http_method: String,
	/// Request URI without protocol parameters.
	pub base_uri: Url,
	/// Ordered multimap of protocol + body parameters, including the signature.
	pub parameters: Vec<(String, String)>,
	/// Tamper-protection method used to produce the signature.
	pub signature_method: SignatureMethod,
	/// Computed signature value.
	pub signature: String,
}
impl SignedRequest {
	/// Encodes all parameters as an `application/x-www-form-urlencoded` body.
	pub fn form_body(&self) -> String {
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		for (key, value) in &self.parameters {
			serializer.append_pair(key, value);
		}

		serializer.finish()
	}
}

/// Computes the signature for a request over the provided parameter multimap.
///
/// `parameters` carries the protocol and body parameters; query parameters are
/// collected from `base_uri` itself. The token secret is the empty string when
/// no token has been issued yet (request-token step).
pub fn sign(
	http_method: &str,
	base_uri: &Url,
	parameters: &[(String, String)],
	signature_method: SignatureMethod,
	consumer_secret: &str,
	token_secret: Option<&str>,
) -> Result<String> {
	let base = build_base_string(http_method, base_uri, parameters)?;
	let key = signing_key(consumer_secret, token_secret);

	Ok(signature_method.digest(&key, &base)?)
}

/// Verifies the signature carried inside `parameters` against the expected secrets.
///
/// Fails with [`ConfigError::InvalidRequest`] when the signature or method
/// parameter is absent, [`ConfigError::UnsupportedAlgorithm`] when the method
/// label is unknown, and [`Error::SignatureMismatch`] when recomputation
/// disagrees with the presented value.
pub fn verify(
	http_method: &str,
	base_uri: &Url,
	parameters: &[(String, String)],
	consumer_secret: &str,
	token_secret: Option<&str>,
) -> Result<()> {
	let presented = single_parameter(parameters, OAUTH_SIGNATURE)?;
	let method_label = single_parameter(parameters, OAUTH_SIGNATURE_METHOD)?;
	let signature_method = SignatureMethod::from_str(method_label)?;
	let base = build_base_string(http_method, base_uri, parameters)?;
	let key = signing_key(consumer_secret, token_secret);

	if signature_method.verify(&key, &base, presented)? {
		Ok(())
	} else {
		Err(Error::SignatureMismatch)
	}
}

pub(crate) fn single_parameter<'a>(
	parameters: &'a [(String, String)],
	name: &'static str,
) -> Result<&'a str> {
	let mut values = parameters.iter().filter(|(key, _)| key == name).map(|(_, value)| value);
	let first = values
		.next()
		.ok_or_else(|| ConfigError::invalid_request(format!("missing `{name}` parameter")))?;

	if values.next().is_some() {
		return Err(ConfigError::invalid_request(format!("duplicated `{name}` parameter")).into());
	}

	Ok(first)
}
