//! Transport primitives for credential-stamped API calls.
//!
//! The module exposes [`RequestExecutor`], the coordinator's only dependency on an HTTP
//! stack, together with the [`ApiRequest`]/[`ApiResponse`] values it exchanges. The
//! reqwest-backed [`ReqwestExecutor`] is the default implementation; downstream crates can
//! plug in any other client by implementing the trait.

pub mod message;

pub use message::*;

// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`RequestExecutor::send`].
pub type ExecutorFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Performs one request/response exchange.
///
/// Implementations must be `Send + Sync + 'static` so one executor can be shared by every
/// request a coordinator handles. Any HTTP status, including auth failures, is a successful
/// exchange; only failures to complete the exchange are [`TransportError`]s.
pub trait RequestExecutor
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` exactly as stamped and buffers the response.
	fn send<'a>(&'a self, request: &'a ApiRequest) -> ExecutorFuture<'a>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Build the client with a cookie store when the refresh endpoint identifies the session
/// through a cookie; the [`EndpointRefresh`](crate::refresh::EndpointRefresh) operation reuses
/// this client so both share one jar.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestExecutor(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestExecutor {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that keeps cookies between calls, carrying the ambient session.
	pub fn with_cookie_session() -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().cookie_store(true).build()?))
	}

	/// Returns the underlying client.
	pub fn client(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RequestExecutor for ReqwestExecutor {
	fn send<'a>(&'a self, request: &'a ApiRequest) -> ExecutorFuture<'a> {
		Box::pin(async move {
			let mut builder = self
				.0
				.request(request.method.clone(), request.url.clone())
				.headers(request.headers.clone());

			if let Some(body) = request.body.as_ref() {
				builder = builder.body(body.clone());
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}
