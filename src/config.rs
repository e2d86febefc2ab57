//! Session configuration shared by the coordinator and the built-in refresh operation.
//!
//! [`SessionConfig`] is assembled through [`SessionConfigBuilder`], which validates the
//! refresh endpoint, the auth-failure status set, and the authorization scheme before any
//! request is sent.

// crates.io
use ::http::Method;
// self
use crate::{_prelude::*, error::ConfigError};

/// Path the built-in refresh operation calls when only a base URL is supplied.
pub const DEFAULT_REFRESH_PATH: &str = "/api/v1/auth/refresh";
/// Authorization scheme stamped in front of the credential.
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer";
/// Status that signals an expired credential unless configured otherwise.
pub const DEFAULT_AUTH_FAILURE_STATUS: u16 = 401;

/// Errors raised while constructing or validating a [`SessionConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SessionConfigError {
	/// Neither a refresh endpoint nor a base URL to derive it from was supplied.
	#[error("Missing refresh endpoint.")]
	MissingRefreshEndpoint,
	/// Endpoints must use HTTP(S).
	#[error("The {endpoint} endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The base URL cannot be joined with the default refresh path.
	#[error("The base URL cannot carry a path: {url}.")]
	InvalidBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// At least one status must mark a credential as expired.
	#[error("At least one auth-failure status is required.")]
	NoAuthFailureStatuses,
	/// Auth-failure statuses must be client or server errors.
	#[error("Status {status} cannot signal an auth failure; use a 4xx or 5xx code.")]
	InvalidAuthFailureStatus {
		/// Rejected status code.
		status: u16,
	},
	/// The scheme must be a single non-empty token.
	#[error("Authorization scheme `{scheme}` must be a non-empty token without whitespace.")]
	InvalidAuthScheme {
		/// Rejected scheme.
		scheme: String,
	},
}

/// Immutable session settings consumed by [`RefreshCoordinator`](crate::coordinator::RefreshCoordinator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
	/// Base URL relative request paths are resolved against.
	pub base_url: Option<Url>,
	/// Endpoint that exchanges the ambient session for a new credential.
	pub refresh_endpoint: Url,
	/// HTTP method used for the refresh call.
	pub refresh_method: Method,
	/// Response statuses that mean "the credential expired".
	pub auth_failure_statuses: Vec<u16>,
	/// Scheme stamped in front of the credential in the `Authorization` header.
	pub auth_scheme: String,
	/// Whether an unrecoverable refresh failure clears the credential store.
	pub clear_on_expiry: bool,
}
impl SessionConfig {
	/// Creates a new builder.
	pub fn builder() -> SessionConfigBuilder {
		SessionConfigBuilder::default()
	}

	/// Returns true if `status` marks the stamped credential as expired.
	pub fn is_auth_failure(&self, status: u16) -> bool {
		self.auth_failure_statuses.contains(&status)
	}

	/// Resolves `path` against the base URL; absolute URLs pass through untouched.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		match Url::parse(path) {
			Ok(url) => Ok(url),
			Err(url::ParseError::RelativeUrlWithoutBase) => {
				let base = self
					.base_url
					.as_ref()
					.ok_or_else(|| ConfigError::MissingBaseUrl { path: path.into() })?;

				base.join(path)
					.map_err(|source| ConfigError::InvalidRequestUrl { path: path.into(), source })
			},
			Err(source) => Err(ConfigError::InvalidRequestUrl { path: path.into(), source }),
		}
	}

	fn validate(&self) -> Result<(), SessionConfigError> {
		if let Some(base) = self.base_url.as_ref() {
			validate_endpoint("base", base)?;
		}

		validate_endpoint("refresh", &self.refresh_endpoint)?;

		if self.auth_failure_statuses.is_empty() {
			return Err(SessionConfigError::NoAuthFailureStatuses);
		}
		if let Some(status) =
			self.auth_failure_statuses.iter().copied().find(|status| !(400..=599).contains(status))
		{
			return Err(SessionConfigError::InvalidAuthFailureStatus { status });
		}
		if self.auth_scheme.is_empty() || self.auth_scheme.chars().any(char::is_whitespace) {
			return Err(SessionConfigError::InvalidAuthScheme { scheme: self.auth_scheme.clone() });
		}

		Ok(())
	}
}

/// Builder for [`SessionConfig`] values.
#[derive(Debug)]
pub struct SessionConfigBuilder {
	/// Optional base URL for relative request paths.
	pub base_url: Option<Url>,
	/// Explicit refresh endpoint; derived from the base URL when absent.
	pub refresh_endpoint: Option<Url>,
	/// HTTP method used for the refresh call.
	pub refresh_method: Method,
	/// Response statuses that mean "the credential expired".
	pub auth_failure_statuses: Vec<u16>,
	/// Authorization scheme.
	pub auth_scheme: String,
	/// Whether an unrecoverable refresh failure clears the credential store.
	pub clear_on_expiry: bool,
}
impl Default for SessionConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			refresh_endpoint: None,
			refresh_method: Method::GET,
			auth_failure_statuses: vec![DEFAULT_AUTH_FAILURE_STATUS],
			auth_scheme: DEFAULT_AUTH_SCHEME.into(),
			clear_on_expiry: true,
		}
	}
}
impl SessionConfigBuilder {
	/// Sets the base URL relative request paths resolve against.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Sets the refresh endpoint explicitly.
	pub fn refresh_endpoint(mut self, url: Url) -> Self {
		self.refresh_endpoint = Some(url);

		self
	}

	/// Overrides the refresh method (defaults to `GET`).
	pub fn refresh_method(mut self, method: Method) -> Self {
		self.refresh_method = method;

		self
	}

	/// Replaces the auth-failure status set (defaults to `[401]`).
	pub fn auth_failure_statuses<I>(mut self, statuses: I) -> Self
	where
		I: IntoIterator<Item = u16>,
	{
		self.auth_failure_statuses = statuses.into_iter().collect();

		self.auth_failure_statuses.sort_unstable();
		self.auth_failure_statuses.dedup();

		self
	}

	/// Overrides the authorization scheme (defaults to `Bearer`).
	pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.auth_scheme = scheme.into();

		self
	}

	/// Keeps the credential in the store after an unrecoverable refresh failure.
	pub fn keep_credential_on_expiry(mut self) -> Self {
		self.clear_on_expiry = false;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<SessionConfig, SessionConfigError> {
		let refresh_endpoint = match (self.refresh_endpoint, self.base_url.as_ref()) {
			(Some(url), _) => url,
			(None, Some(base)) => base
				.join(DEFAULT_REFRESH_PATH)
				.map_err(|_| SessionConfigError::InvalidBaseUrl { url: base.to_string() })?,
			(None, None) => return Err(SessionConfigError::MissingRefreshEndpoint),
		};
		let config = SessionConfig {
			base_url: self.base_url,
			refresh_endpoint,
			refresh_method: self.refresh_method,
			auth_failure_statuses: self.auth_failure_statuses,
			auth_scheme: self.auth_scheme,
			clear_on_expiry: self.clear_on_expiry,
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), SessionConfigError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(SessionConfigError::UnsupportedScheme { endpoint: name, url: url.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse config test URL.")
	}

	#[test]
	fn refresh_endpoint_derives_from_base_url() {
		let config = SessionConfig::builder()
			.base_url(url("https://api.example.com"))
			.build()
			.expect("Config with a base URL should build.");

		assert_eq!(config.refresh_endpoint.as_str(), "https://api.example.com/api/v1/auth/refresh");
		assert_eq!(config.refresh_method, Method::GET);
		assert_eq!(config.auth_scheme, "Bearer");
		assert!(config.is_auth_failure(401));
		assert!(!config.is_auth_failure(403));
		assert!(config.clear_on_expiry);
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		assert_eq!(
			SessionConfig::builder().build().expect_err("Missing endpoints must be rejected."),
			SessionConfigError::MissingRefreshEndpoint
		);
		assert!(matches!(
			SessionConfig::builder()
				.refresh_endpoint(url("ftp://example.com/refresh"))
				.build()
				.expect_err("Non-HTTP endpoints must be rejected."),
			SessionConfigError::UnsupportedScheme { endpoint: "refresh", .. }
		));
		assert_eq!(
			SessionConfig::builder()
				.refresh_endpoint(url("https://example.com/refresh"))
				.auth_failure_statuses(Vec::new())
				.build()
				.expect_err("Empty status sets must be rejected."),
			SessionConfigError::NoAuthFailureStatuses
		);
		assert_eq!(
			SessionConfig::builder()
				.refresh_endpoint(url("https://example.com/refresh"))
				.auth_failure_statuses([401, 302])
				.build()
				.expect_err("Redirect statuses cannot mark auth failures."),
			SessionConfigError::InvalidAuthFailureStatus { status: 302 }
		);
		assert!(matches!(
			SessionConfig::builder()
				.refresh_endpoint(url("https://example.com/refresh"))
				.auth_scheme("Bearer token")
				.build()
				.expect_err("Schemes with whitespace must be rejected."),
			SessionConfigError::InvalidAuthScheme { .. }
		));
	}

	#[test]
	fn endpoint_resolves_relative_and_absolute_paths() {
		let config = SessionConfig::builder()
			.base_url(url("https://api.example.com/"))
			.refresh_endpoint(url("https://auth.example.com/refresh"))
			.build()
			.expect("Config should build.");

		assert_eq!(
			config.endpoint("/api/v1/users/me").expect("Relative paths should resolve.").as_str(),
			"https://api.example.com/api/v1/users/me"
		);
		assert_eq!(
			config.endpoint("https://other.example.com/x").expect("Absolute URLs pass through.").as_str(),
			"https://other.example.com/x"
		);

		let bare = SessionConfig::builder()
			.refresh_endpoint(url("https://auth.example.com/refresh"))
			.build()
			.expect("Config should build.");

		assert!(matches!(
			bare.endpoint("/api/v1/users/me"),
			Err(ConfigError::MissingBaseUrl { .. })
		));
	}
}
