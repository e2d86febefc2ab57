// self
use crate::{_prelude::*, auth::Credential, error::RefreshError};
#[cfg(feature = "reqwest")]
use crate::{
	config::SessionConfig,
	http::ReqwestExecutor,
	refresh::{RefreshFuture, RefreshOperation},
};

#[derive(Debug, Deserialize)]
struct Envelope {
	#[serde(default)]
	data: Option<EnvelopeData>,
	#[serde(default)]
	status: Option<u16>,
	#[serde(default)]
	message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeData {
	access_token: String,
}

/// Parses a refresh response body of the form `{"data": {"accessToken": "..."}}`.
///
/// Servers that answer a dead session with a success status and `"data": null` (plus an
/// optional `status`/`message` pair) are reported as [`RefreshError::Rejected`]; bodies that
/// do not match the envelope are [`RefreshError::MalformedResponse`] with the failing JSON path.
pub fn parse_refresh_envelope(http_status: u16, body: &[u8]) -> Result<Credential, RefreshError> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let envelope: Envelope = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| RefreshError::MalformedResponse { message: e.to_string() })?;

	match envelope.data {
		Some(data) if !data.access_token.is_empty() => Ok(Credential::new(data.access_token)),
		Some(_) => Err(RefreshError::MalformedResponse {
			message: "data.accessToken is empty".into(),
		}),
		None => Err(RefreshError::Rejected {
			status: envelope.status.unwrap_or(http_status),
			message: envelope
				.message
				.unwrap_or_else(|| "refresh response carried no credential".into()),
		}),
	}
}

/// Extracts a human-readable reason from an error response body.
pub fn rejection_message(body: &[u8]) -> String {
	serde_json::from_slice::<Envelope>(body)
		.ok()
		.and_then(|envelope| envelope.message)
		.unwrap_or_else(|| {
			let text = String::from_utf8_lossy(body);
			let trimmed = text.trim();

			if trimmed.is_empty() { "empty response body".into() } else { trimmed.to_owned() }
		})
}

/// Refresh operation that calls the configured refresh endpoint over reqwest.
///
/// The request carries no body and no `Authorization` header; the session is identified by
/// whatever the shared client attaches implicitly, typically a cookie from its jar.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct EndpointRefresh {
	client: ReqwestClient,
	endpoint: Url,
	method: ::http::Method,
}
#[cfg(feature = "reqwest")]
impl EndpointRefresh {
	/// Builds the operation on the executor's client so both share one cookie jar.
	pub fn new(executor: &ReqwestExecutor, config: &SessionConfig) -> Self {
		Self {
			client: executor.client().clone(),
			endpoint: config.refresh_endpoint.clone(),
			method: config.refresh_method.clone(),
		}
	}

	/// Endpoint the operation calls.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
#[cfg(feature = "reqwest")]
impl RefreshOperation for EndpointRefresh {
	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(async move {
			let response = self
				.client
				.request(self.method.clone(), self.endpoint.clone())
				.send()
				.await
				.map_err(RefreshError::transport)?;
			let status = response.status();
			let body = response.bytes().await.map_err(RefreshError::transport)?;

			if !status.is_success() {
				return Err(RefreshError::Rejected {
					status: status.as_u16(),
					message: rejection_message(&body),
				});
			}

			parse_refresh_envelope(status.as_u16(), &body)
		})
	}
}
