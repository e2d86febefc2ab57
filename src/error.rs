//! Crate-level error types shared by the coordinator, stores, and transports.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error returned by [`RefreshCoordinator::execute`](crate::coordinator::RefreshCoordinator::execute).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS); never triggers a refresh.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The request was already replayed once and failed authentication again.
	#[error("Request was rejected with status {status} after its credential was refreshed.")]
	AuthRetryExhausted {
		/// Auth-failure status returned by the replayed request.
		status: u16,
	},
	/// The refresh call failed; every request waiting on it receives the same value.
	#[error("Session expired: {0}")]
	SessionExpired(#[source] RefreshError),
	/// The refresh state machine reached a state it must never be in.
	#[error("Refresh coordinator invariant violated: {message}.")]
	InvariantViolation {
		/// Description of the inconsistent state.
		message: String,
	},
}
impl Error {
	/// Returns the refresh failure when this error signals an expired session.
	pub fn as_session_expired(&self) -> Option<&RefreshError> {
		match self {
			Self::SessionExpired(err) => Some(err),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Session configuration failed validation.
	#[error(transparent)]
	Session(#[from] crate::config::SessionConfigError),
	/// A request path could not be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved.")]
	InvalidRequestUrl {
		/// Path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Relative request paths require a configured base URL.
	#[error("Request path `{path}` is relative but no base URL is configured.")]
	MissingBaseUrl {
		/// Relative path supplied by the caller.
		path: String,
	},
	/// The credential cannot be encoded into an `Authorization` header.
	#[error("Credential contains characters that are not valid in an HTTP header.")]
	InvalidCredentialHeader(#[from] ::http::header::InvalidHeaderValue),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failure produced by a [`RefreshOperation`](crate::refresh::RefreshOperation).
///
/// The value is cloned to every request that waited on the failed refresh, so variants carry
/// rendered messages instead of boxed sources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RefreshError {
	/// The refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the session with status {status}: {message}.")]
	Rejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
		/// Provider- or server-supplied message.
		message: String,
	},
	/// The refresh call never produced a response.
	#[error("Refresh call failed in transport: {message}.")]
	Transport {
		/// Rendered transport failure.
		message: String,
	},
	/// The refresh endpoint answered with a body that does not carry a credential.
	#[error("Refresh endpoint returned a malformed response: {message}.")]
	MalformedResponse {
		/// Rendered parsing failure.
		message: String,
	},
	/// The refreshed credential could not be written to the credential store.
	#[error("Refreshed credential could not be stored: {message}.")]
	Store {
		/// Rendered storage failure.
		message: String,
	},
}
impl RefreshError {
	/// Builds a [`RefreshError::Transport`] from any error value.
	pub fn transport(src: impl Display) -> Self {
		Self::Transport { message: render(src) }
	}

	/// Builds a [`RefreshError::Store`] from the store failure that rejected the new credential.
	pub fn store(src: impl Display) -> Self {
		Self::Store { message: render(src) }
	}
}

// The variants add their own terminal period.
fn render(src: impl Display) -> String {
	let mut message = src.to_string();

	message.truncate(message.trim_end_matches('.').len());

	message
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for RefreshError {
	fn from(e: ReqwestError) -> Self {
		match e.status() {
			Some(status) => Self::Rejected { status: status.as_u16(), message: e.to_string() },
			None => Self::transport(e),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_expired_exposes_refresh_failure_as_source() {
		let refresh = RefreshError::Rejected { status: 401, message: "refresh token expired".into() };
		let err = Error::SessionExpired(refresh.clone());

		assert_eq!(err.as_session_expired(), Some(&refresh));
		assert!(err.to_string().contains("refresh token expired"));

		let source = StdError::source(&err)
			.expect("Session expiry should expose the refresh failure as its source.");

		assert_eq!(source.to_string(), refresh.to_string());
	}

	#[test]
	fn wrapped_store_failure_ends_with_a_single_period() {
		let err = RefreshError::store(crate::store::StoreError::Backend { message: "disk full".into() });

		assert_eq!(err, RefreshError::Store { message: "Backend failure: disk full".into() });
		assert_eq!(
			err.to_string(),
			"Refreshed credential could not be stored: Backend failure: disk full."
		);
		assert_eq!(
			RefreshError::transport("connection reset.").to_string(),
			"Refresh call failed in transport: connection reset."
		);
	}

	#[test]
	fn transport_errors_are_not_session_expiry() {
		let err = Error::from(TransportError::from(std::io::Error::other("connection reset")));

		assert!(err.as_session_expired().is_none());
		assert!(matches!(err, Error::Transport(TransportError::Io(_))));
	}
}
