//! Service provider descriptions: the three exchange endpoints and the
//! tamper-protection methods the provider accepts.

// self
use crate::{_prelude::*, auth::ProviderId, sig::SignatureMethod};

/// Errors raised while constructing or validating descriptions.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DescriptionError {
	/// Request-token endpoint is mandatory.
	#[error("Missing request-token endpoint.")]
	MissingRequestTokenEndpoint,
	/// User-authorization endpoint is mandatory.
	#[error("Missing user-authorization endpoint.")]
	MissingUserAuthorizationEndpoint,
	/// Access-token endpoint is mandatory.
	#[error("Missing access-token endpoint.")]
	MissingAccessTokenEndpoint,
	/// At least one signature method must be accepted.
	#[error("Description must accept at least one signature method.")]
	NoSignatureMethods,
	/// The user-authorization endpoint leaves the machine as a redirect and
	/// must therefore use HTTPS.
	#[error("The user-authorization endpoint must use HTTPS: {url}.")]
	InsecureUserAuthorizationEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Endpoint set declared by a service provider description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Endpoint that issues unauthorized request tokens.
	pub request_token: Url,
	/// Endpoint the resource owner is redirected to for approval.
	pub user_authorization: Url,
	/// Endpoint that exchanges approved request tokens for access tokens.
	pub access_token: Url,
}

/// Immutable service provider description consumed by the orchestrator.
/// Read-only after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProviderDescription {
	/// Description identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Signature methods the provider accepts, most preferred first.
	pub signature_methods: Vec<SignatureMethod>,
	/// Protection realm announced in `Authorization` headers, if any.
	pub realm: Option<String>,
}
impl ServiceProviderDescription {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ServiceProviderDescriptionBuilder {
		ServiceProviderDescriptionBuilder::new(id)
	}

	/// Checks whether the description accepts a given signature method.
	pub fn supports(&self, method: SignatureMethod) -> bool {
		self.signature_methods.contains(&method)
	}

	/// Returns the most preferred signature method.
	pub fn preferred_method(&self) -> SignatureMethod {
		// Validation guarantees at least one entry.
		self.signature_methods.first().copied().unwrap_or(SignatureMethod::HmacSha1)
	}
}

/// Builder for [`ServiceProviderDescription`] values.
#[derive(Debug)]
pub struct ServiceProviderDescriptionBuilder {
	/// Identifier for the description being constructed.
	pub id: ProviderId,
	/// Optional request-token endpoint (required to build).
	pub request_token_endpoint: Option<Url>,
	/// Optional user-authorization endpoint (required to build).
	pub user_authorization_endpoint: Option<Url>,
	/// Optional access-token endpoint (required to build).
	pub access_token_endpoint: Option<Url>,
	/// Accepted signature methods, most preferred first.
	pub signature_methods: Vec<SignatureMethod>,
	/// Optional protection realm.
	pub realm: Option<String>,
}
impl ServiceProviderDescriptionBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			request_token_endpoint: None,
			user_authorization_endpoint: None,
			access_token_endpoint: None,
			signature_methods: Vec::new(),
			realm: None,
		}
	}

	/// Sets the protection realm announced in `Authorization` headers.
	pub fn realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// Sets the request-token endpoint.
	pub fn request_token_endpoint(mut self, url: Url) -> Self {
		self.request_token_endpoint = Some(url);

		self
	}

	/// Sets the user-authorization endpoint.
	pub fn user_authorization_endpoint(mut self, url: Url) -> Self {
		self.user_authorization_endpoint = Some(url);

		self
	}

	/// Sets the access-token endpoint.
	pub fn access_token_endpoint(mut self, url: Url) -> Self {
		self.access_token_endpoint = Some(url);

		self
	}

	/// Appends an accepted signature method.
	pub fn accept_method(mut self, method: SignatureMethod) -> Self {
		if !self.signature_methods.contains(&method) {
			self.signature_methods.push(method);
		}

		self
	}

	/// Consumes the builder and validates the resulting description.
	pub fn build(self) -> Result<ServiceProviderDescription, DescriptionError> {
		let request_token =
			self.request_token_endpoint.ok_or(DescriptionError::MissingRequestTokenEndpoint)?;
		let user_authorization = self
			.user_authorization_endpoint
			.ok_or(DescriptionError::MissingUserAuthorizationEndpoint)?;
		let access_token =
			self.access_token_endpoint.ok_or(DescriptionError::MissingAccessTokenEndpoint)?;

		if self.signature_methods.is_empty() {
			return Err(DescriptionError::NoSignatureMethods);
		}
		if user_authorization.scheme() != "https" {
			return Err(DescriptionError::InsecureUserAuthorizationEndpoint {
				url: user_authorization.to_string(),
			});
		}

		Ok(ServiceProviderDescription {
			id: self.id,
			endpoints: ProviderEndpoints { request_token, user_authorization, access_token },
			signature_methods: self.signature_methods,
			realm: self.realm,
		})
	}
}
