//! Canonical base-string construction and the RFC 3986 percent encoder.

// std
use std::fmt::Write;
// self
use crate::{_prelude::*, error::ConfigError, sig::OAUTH_SIGNATURE};

/// Percent-encodes per the OAuth parameter-encoding rules: uppercase hex
/// digits, with `-`, `.`, `_`, `~` and alphanumerics left untouched.
pub fn percent_encode(input: &str) -> String {
	let mut out = String::with_capacity(input.len());

	for byte in input.as_bytes() {
		match byte {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' =>
				out.push(*byte as char),
			_ => {
				// Infallible for String targets.
				let _ = write!(out, "%{byte:02X}");
			},
		}
	}

	out
}

/// Normalizes a request URI for signing: lowercased scheme and host, default
/// port stripped, path preserved, query and fragment dropped.
pub fn normalize_base_uri(uri: &Url) -> Result<String> {
	let host = uri
		.host_str()
		.ok_or_else(|| ConfigError::invalid_request("request URI has no host"))?
		.to_ascii_lowercase();
	let scheme = uri.scheme().to_ascii_lowercase();
	// `Url` already reports `None` for scheme-default ports.
	let port = match uri.port() {
		Some(port) => format!(":{port}"),
		None => String::new(),
	};

	Ok(format!("{scheme}://{host}{port}{}", uri.path()))
}

/// Builds the canonical base string covering the method, normalized URI, and
/// the sorted parameter set (protocol + body parameters plus the URI query,
/// minus the signature itself).
pub fn build_base_string(
	http_method: &str,
	base_uri: &Url,
	parameters: &[(String, String)],
) -> Result<String> {
	let normalized = normalize_base_uri(base_uri)?;
	let mut encoded: Vec<(String, String)> = parameters
		.iter()
		.filter(|(key, _)| key != OAUTH_SIGNATURE)
		.map(|(key, value)| (percent_encode(key), percent_encode(value)))
		.collect();

	encoded.extend(
		base_uri
			.query_pairs()
			.filter(|(key, _)| key != OAUTH_SIGNATURE)
			.map(|(key, value)| (percent_encode(&key), percent_encode(&value))),
	);
	// Lexicographic by encoded key, then encoded value, so duplicate keys
	// canonicalize deterministically.
	encoded.sort();

	let param_string =
		encoded.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&");

	Ok(format!(
		"{}&{}&{}",
		percent_encode(&http_method.to_ascii_uppercase()),
		percent_encode(&normalized),
		percent_encode(&param_string)
	))
}

/// Derives the signing key: `enc(consumer_secret)&enc(token_secret)` with the
/// token secret treated as empty when absent.
pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
	format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret.unwrap_or("")))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn encoder_uses_uppercase_hex_and_spares_unreserved() {
		assert_eq!(percent_encode("abcXYZ019-._~"), "abcXYZ019-._~");
		assert_eq!(percent_encode("a b"), "a%20b");
		assert_eq!(percent_encode("ä"), "%C3%A4");
		assert_eq!(percent_encode("/=&+"), "%2F%3D%26%2B");
	}

	#[test]
	fn uri_normalization_strips_default_ports_and_fragments() {
		let uri = Url::parse("HTTPS://Provider.Example:443/Path/Sub?x=1#frag")
			.expect("URI fixture should parse successfully.");

		assert_eq!(
			normalize_base_uri(&uri).expect("Normalization fixture should succeed."),
			"https://provider.example/Path/Sub"
		);

		let custom = Url::parse("http://provider.example:8080/api")
			.expect("Custom-port fixture should parse successfully.");

		assert_eq!(
			normalize_base_uri(&custom).expect("Normalization fixture should succeed."),
			"http://provider.example:8080/api"
		);
	}

	#[test]
	fn hostless_uris_are_rejected() {
		let uri = Url::parse("mailto:user@example.com")
			.expect("Hostless URI fixture should parse successfully.");

		assert!(normalize_base_uri(&uri).is_err());
	}

	#[test]
	fn base_string_matches_hand_computed_form() {
		let uri = Url::parse("http://provider.example/request?b=2")
			.expect("URI fixture should parse successfully.");
		let parameters = params(&[("a", "1"), ("c", "hi there"), (OAUTH_SIGNATURE, "sig")]);
		let base = build_base_string("post", &uri, &parameters)
			.expect("Base string fixture should build successfully.");

		assert_eq!(
			base,
			"POST&http%3A%2F%2Fprovider.example%2Frequest&a%3D1%26b%3D2%26c%3Dhi%2520there"
		);
	}

	#[test]
	fn base_string_is_insertion_order_independent() {
		let uri = Url::parse("https://provider.example/resource")
			.expect("URI fixture should parse successfully.");
		let forward = params(&[("a", "1"), ("b", "2")]);
		let reversed = params(&[("b", "2"), ("a", "1")]);

		assert_eq!(
			build_base_string("GET", &uri, &forward)
				.expect("Forward parameter order should build successfully."),
			build_base_string("GET", &uri, &reversed)
				.expect("Reversed parameter order should build successfully.")
		);
	}

	#[test]
	fn duplicate_keys_sort_by_value() {
		let uri = Url::parse("https://provider.example/resource")
			.expect("URI fixture should parse successfully.");
		let first = params(&[("a", "2"), ("a", "1")]);
		let second = params(&[("a", "1"), ("a", "2")]);

		assert_eq!(
			build_base_string("GET", &uri, &first)
				.expect("First duplicate-key ordering should build successfully."),
			build_base_string("GET", &uri, &second)
				.expect("Second duplicate-key ordering should build successfully.")
		);
	}

	#[test]
	fn signing_key_handles_absent_token_secret() {
		assert_eq!(signing_key("samplesecret", None), "samplesecret&");
		assert_eq!(signing_key("a&b", Some("c d")), "a%26b&c%20d");
	}
}
