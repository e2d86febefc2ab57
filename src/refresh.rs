//! Refresh operation contract and the built-in endpoint implementation.
//!
//! A [`RefreshOperation`] exchanges the ambient session (typically a cookie the transport
//! attaches on its own) for a new access credential. The coordinator invokes it at most once
//! at a time and fans the result out to every request waiting on it, so implementations only
//! describe the remote call itself: no retries, no caching, no locking.

mod endpoint;
mod metrics;

pub use endpoint::*;
pub use self::metrics::RefreshMetrics;

// self
use crate::{_prelude::*, auth::Credential, error::RefreshError};

/// Boxed future returned by [`RefreshOperation::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credential, RefreshError>> + 'a + Send>>;

/// Single remote call that mints a new access credential.
pub trait RefreshOperation
where
	Self: 'static + Send + Sync,
{
	/// Performs the refresh call.
	fn refresh(&self) -> RefreshFuture<'_>;
}
impl<F, Fut> RefreshOperation for F
where
	F: 'static + Send + Sync + Fn() -> Fut,
	Fut: 'static + Send + Future<Output = Result<Credential, RefreshError>>,
{
	fn refresh(&self) -> RefreshFuture<'_> {
		Box::pin(self())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn closures_act_as_refresh_operations() {
		let op: Arc<dyn RefreshOperation> =
			Arc::new(|| async { Ok::<_, RefreshError>(Credential::new("T2")) });

		assert_eq!(op.refresh().await, Ok(Credential::new("T2")));

		let failing = || async {
			Err::<Credential, _>(RefreshError::Rejected {
				status: 401,
				message: "session revoked".into(),
			})
		};

		assert!(matches!(failing.refresh().await, Err(RefreshError::Rejected { status: 401, .. })));
	}
}
