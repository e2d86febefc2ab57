//! Request and response values exchanged with a [`RequestExecutor`](crate::http::RequestExecutor).

// crates.io
use ::http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderName},
};
// self
use crate::{_prelude::*, auth::Credential, error::ConfigError};

/// Outbound request replayable by the coordinator.
///
/// The coordinator owns the `Authorization` header: it is rewritten on every dispatch from the
/// credential store, so callers should not set it themselves.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Caller-supplied headers.
	pub headers: HeaderMap,
	/// Optional request body, kept in memory so the request can be replayed.
	pub body: Option<Vec<u8>>,
	/// Set once the request has been replayed after a refresh; it is never replayed twice.
	pub retried: bool,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, retried: false }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Attaches a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body and sets the content type.
	pub fn with_json<T>(mut self, value: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(value)?);
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Rewrites the `Authorization` header for `credential`; removes it when absent.
	pub fn stamp(&mut self, scheme: &str, credential: Option<&Credential>) -> Result<(), ConfigError> {
		match credential {
			Some(credential) => {
				let mut value =
					HeaderValue::from_str(&format!("{scheme} {}", credential.expose()))?;

				value.set_sensitive(true);
				self.headers.insert(AUTHORIZATION, value);
			},
			None => {
				self.headers.remove(AUTHORIZATION);
			},
		}

		Ok(())
	}
}

/// Response returned by a [`RequestExecutor`](crate::http::RequestExecutor).
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Fully buffered body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response without headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Returns the status as a bare code.
	pub fn status_code(&self) -> u16 {
		self.status.as_u16()
	}

	/// Deserializes the body as JSON.
	pub fn json<T>(&self) -> Result<T, serde_json::Error>
	where
		T: serde::de::DeserializeOwned,
	{
		serde_json::from_slice(&self.body)
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request() -> ApiRequest {
		ApiRequest::get(Url::parse("https://api.example.com/me").expect("Fixture URL should parse."))
	}

	#[test]
	fn stamp_replaces_and_removes_authorization() {
		let mut request = request();

		request.stamp("Bearer", Some(&Credential::new("T1"))).expect("T1 is a valid header.");
		request.stamp("Bearer", Some(&Credential::new("T2"))).expect("T2 is a valid header.");

		assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
		assert_eq!(
			request.headers.get(AUTHORIZATION).map(HeaderValue::as_bytes),
			Some(&b"Bearer T2"[..])
		);
		assert!(request.headers.get(AUTHORIZATION).is_some_and(HeaderValue::is_sensitive));

		request.stamp("Bearer", None).expect("Removing the header cannot fail.");

		assert!(request.headers.get(AUTHORIZATION).is_none());
	}

	#[test]
	fn stamp_rejects_credentials_that_break_headers() {
		let mut request = request();
		let err = request
			.stamp("Bearer", Some(&Credential::new("line\nbreak")))
			.expect_err("Newlines are not valid header characters.");

		assert!(matches!(err, ConfigError::InvalidCredentialHeader(_)));
		assert!(!request.retried);
	}

	#[test]
	fn json_body_sets_content_type() {
		let request = request()
			.with_json(&serde_json::json!({ "name": "sipdah" }))
			.expect("JSON fixture should serialize.");

		assert_eq!(
			request.headers.get(CONTENT_TYPE).map(HeaderValue::as_bytes),
			Some(&b"application/json"[..])
		);
		assert_eq!(request.body.as_deref(), Some(&br#"{"name":"sipdah"}"#[..]));
	}
}
