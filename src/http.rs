//! Transport primitives for the handshake and for signed API calls.
//!
//! [`Transport`] is the consumer's only dependency on an HTTP stack. The
//! built-in [`ReqwestTransport`] suits most deployments; tests and embedded
//! hosts can route [`TransportRequest`]s through an in-process provider
//! instead.

// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`Transport`] implementations.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>>;

/// Abstraction over HTTP transports capable of carrying handshake requests.
///
/// Implementations must be shareable behind `Arc<T>` and their futures must be
/// `Send` so consumer flows can hop executors freely.
pub trait Transport: Send + Sync {
	/// Dispatches one request and resolves with the raw response.
	///
	/// Network and I/O failures surface as [`TransportError`]; HTTP error
	/// statuses are not failures at this layer and come back as ordinary
	/// responses for the caller to interpret.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// A fully assembled outbound request.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: String,
	/// Absolute request URL.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Request body, if any.
	pub body: Option<Vec<u8>>,
}
impl TransportRequest {
	/// A `POST` carrying an `application/x-www-form-urlencoded` body.
	pub fn form_post(url: Url, body: String) -> Self {
		Self {
			method: "POST".into(),
			url,
			headers: vec![(
				"content-type".into(),
				"application/x-www-form-urlencoded".into(),
			)],
			body: Some(body.into_bytes()),
		}
	}

	/// Appends a header pair.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}
}

/// The raw response a [`Transport`] resolved with.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header name/value pairs as received.
	pub headers: Vec<(String, String)>,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Whether the status code signals success.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// [`Transport`] backed by a shared [`ReqwestClient`].
///
/// Handshake endpoints return their results directly, so configure any custom
/// client to not follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = reqwest::Method::from_bytes(request.method.as_bytes())
				.map_err(TransportError::network)?;
			let mut builder = client.request(method, request.url);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn form_post_sets_the_content_type() {
		let url = Url::parse("https://provider.example/oauth/request_token")
			.expect("URL fixture should parse successfully.");
		let request = TransportRequest::form_post(url, "oauth_token=T1".into());

		assert_eq!(request.method, "POST");
		assert_eq!(
			request.headers,
			vec![("content-type".to_owned(), "application/x-www-form-urlencoded".to_owned())]
		);
		assert_eq!(request.body.as_deref(), Some(b"oauth_token=T1".as_slice()));
	}

	#[test]
	fn success_statuses_cover_the_2xx_range() {
		let response = |status| TransportResponse { status, headers: Vec::new(), body: Vec::new() };

		assert!(response(200).is_success());
		assert!(response(299).is_success());
		assert!(!response(301).is_success());
		assert!(!response(401).is_success());
	}
}
