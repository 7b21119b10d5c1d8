//! Closed set of tamper-protection methods dispatched by configuration.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
// self
use crate::{_prelude::*, error::ConfigError};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Supported signature methods. `PLAINTEXT` is only appropriate on
/// transport-secured channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum SignatureMethod {
	/// HMAC-SHA1 digest, base64-encoded (the RFC 5849 default).
	HmacSha1,
	/// HMAC-SHA256 digest, base64-encoded.
	HmacSha256,
	/// The signing key itself, for TLS-protected channels.
	Plaintext,
}
impl SignatureMethod {
	/// Returns the wire label for the method.
	pub fn as_str(self) -> &'static str {
		match self {
			SignatureMethod::HmacSha1 => "HMAC-SHA1",
			SignatureMethod::HmacSha256 => "HMAC-SHA256",
			SignatureMethod::Plaintext => "PLAINTEXT",
		}
	}

	/// Computes the signature string for the provided signing key and base string.
	pub fn digest(self, key: &str, base_string: &str) -> Result<String, ConfigError> {
		match self {
			SignatureMethod::HmacSha1 => {
				let mut mac = HmacSha1::new_from_slice(key.as_bytes())
					.map_err(ConfigError::invalid_request)?;

				mac.update(base_string.as_bytes());

				Ok(BASE64.encode(mac.finalize().into_bytes()))
			},
			SignatureMethod::HmacSha256 => {
				let mut mac = HmacSha256::new_from_slice(key.as_bytes())
					.map_err(ConfigError::invalid_request)?;

				mac.update(base_string.as_bytes());

				Ok(BASE64.encode(mac.finalize().into_bytes()))
			},
			SignatureMethod::Plaintext => Ok(key.to_owned()),
		}
	}

	/// Recomputes the signature and compares it against `presented` in constant time.
	pub fn verify(
		self,
		key: &str,
		base_string: &str,
		presented: &str,
	) -> Result<bool, ConfigError> {
		match self {
			SignatureMethod::HmacSha1 => {
				let Ok(decoded) = BASE64.decode(presented) else {
					return Ok(false);
				};
				let mut mac = HmacSha1::new_from_slice(key.as_bytes())
					.map_err(ConfigError::invalid_request)?;

				mac.update(base_string.as_bytes());

				Ok(mac.verify_slice(&decoded).is_ok())
			},
			SignatureMethod::HmacSha256 => {
				let Ok(decoded) = BASE64.decode(presented) else {
					return Ok(false);
				};
				let mut mac = HmacSha256::new_from_slice(key.as_bytes())
					.map_err(ConfigError::invalid_request)?;

				mac.update(base_string.as_bytes());

				Ok(mac.verify_slice(&decoded).is_ok())
			},
			SignatureMethod::Plaintext =>
				Ok(constant_time_eq(key.as_bytes(), presented.as_bytes())),
		}
	}
}
impl Display for SignatureMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SignatureMethod {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"HMAC-SHA1" => Ok(SignatureMethod::HmacSha1),
			"HMAC-SHA256" => Ok(SignatureMethod::HmacSha256),
			"PLAINTEXT" => Ok(SignatureMethod::Plaintext),
			other => Err(ConfigError::UnsupportedAlgorithm { method: other.to_owned() }),
		}
	}
}

/// Length-guarded constant-time byte comparison for non-MAC secrets
/// (verifiers, PLAINTEXT signatures).
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
	if a.len() != b.len() {
		return false;
	}

	a.iter().zip(b.iter()).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
