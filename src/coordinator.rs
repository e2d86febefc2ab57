//! Single-flight refresh coordination for credential-stamped requests.
//!
//! [`RefreshCoordinator::execute`] stamps each request with the stored credential and hands it
//! to the [`RequestExecutor`]. Responses that are not auth failures return untouched without
//! taking any lock. The first auth failure of a request marks it as retried and enters the
//! gate: one request becomes the leader and runs the [`RefreshOperation`], every request that
//! fails while the refresh is in flight queues behind it, and the leader resolves the whole
//! queue with the stored credential (or the failure) before replaying its own request. A
//! request whose replay fails authentication again ends with [`Error::AuthRetryExhausted`].

mod gate;

pub use gate::RefreshState;

// crates.io
use ::http::Method;
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::SessionConfig,
	error::RefreshError,
	http::{ApiRequest, ApiResponse, RequestExecutor},
	obs::{self, FlowEvent, FlowKind, FlowOutcome, FlowSpan},
	refresh::{RefreshMetrics, RefreshOperation},
	session::{SessionEvent, SessionEvents},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestExecutor, refresh::EndpointRefresh};
use gate::{Entry, RefreshGate, RefreshLease};

#[cfg(feature = "reqwest")]
/// Coordinator specialized for the crate's default reqwest transport stack.
pub type ReqwestCoordinator = RefreshCoordinator<ReqwestExecutor, EndpointRefresh>;

/// Replays requests that hit an expired credential after exactly one refresh call.
///
/// The coordinator owns the executor, refresh operation, credential store, and the refresh
/// gate. Clones share all of them, including the gate, so every clone participates in the
/// same single-flight cycle.
pub struct RefreshCoordinator<E, R>
where
	E: ?Sized + RequestExecutor,
	R: ?Sized + RefreshOperation,
{
	/// Transport used for every caller request.
	pub executor: Arc<E>,
	/// Remote call that mints a new credential.
	pub refresher: Arc<R>,
	/// Store holding the credential stamped onto requests.
	pub store: Arc<dyn CredentialStore>,
	/// Session settings (auth-failure statuses, scheme, endpoints).
	pub config: Arc<SessionConfig>,
	/// Session lifecycle notifications.
	pub events: SessionEvents,
	/// Shared counters for refresh coordination.
	pub refresh_metrics: Arc<RefreshMetrics>,
	gate: Arc<RefreshGate>,
}
impl<E, R> RefreshCoordinator<E, R>
where
	E: ?Sized + RequestExecutor,
	R: ?Sized + RefreshOperation,
{
	/// Creates a coordinator from its collaborators.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		config: SessionConfig,
		executor: impl Into<Arc<E>>,
		refresher: impl Into<Arc<R>>,
	) -> Self {
		Self {
			executor: executor.into(),
			refresher: refresher.into(),
			store,
			config: Arc::new(config),
			events: SessionEvents::default(),
			refresh_metrics: Default::default(),
			gate: Default::default(),
		}
	}

	/// Current refresh cycle state.
	pub fn refresh_state(&self) -> RefreshState {
		self.gate.state()
	}

	/// Number of requests queued behind the in-flight refresh.
	pub fn waiting(&self) -> usize {
		self.gate.waiting()
	}

	/// Registers a session event subscriber.
	pub fn subscribe(&self) -> futures::channel::mpsc::UnboundedReceiver<SessionEvent> {
		self.events.subscribe()
	}

	/// Builds a request for `path`, resolved against the configured base URL.
	pub fn request(&self, method: Method, path: &str) -> Result<ApiRequest> {
		Ok(ApiRequest::new(method, self.config.endpoint(path)?))
	}

	/// Installs the credential issued by a sign-in.
	pub fn sign_in(&self, credential: impl Into<Credential>) -> Result<()> {
		let credential = credential.into();
		let fingerprint = credential.fingerprint();

		self.store.set(credential)?;
		self.events.emit(SessionEvent::SignedIn { fingerprint, at: OffsetDateTime::now_utc() });

		Ok(())
	}

	/// Removes the stored credential.
	pub fn sign_out(&self) -> Result<()> {
		self.store.clear()?;
		self.events.emit(SessionEvent::SignedOut { at: OffsetDateTime::now_utc() });

		Ok(())
	}

	/// Sends `request`, refreshing the credential and replaying the request once if the
	/// response signals an expired credential.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Execute;

		let span = FlowSpan::new(KIND, "execute");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute_with_replay(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn execute_with_replay(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let mut credential = self.store.get()?;

		loop {
			let response = self.dispatch(&mut request, credential.as_ref()).await?;
			let status = response.status_code();

			if !self.config.is_auth_failure(status) {
				return Ok(response);
			}
			if request.retried {
				self.refresh_metrics.record_exhausted();
				obs::record_event(FlowKind::Execute, &FlowEvent::RetryExhausted { status });

				return Err(Error::AuthRetryExhausted { status });
			}

			request.retried = true;
			credential = Some(self.fresh_credential(credential.as_ref()).await?);
		}
	}

	async fn dispatch(
		&self,
		request: &mut ApiRequest,
		credential: Option<&Credential>,
	) -> Result<ApiResponse> {
		request.stamp(&self.config.auth_scheme, credential)?;

		Ok(self.executor.send(request).await?)
	}

	/// Returns a credential newer than `stale`, refreshing at most once per cycle.
	async fn fresh_credential(&self, stale: Option<&Credential>) -> Result<Credential> {
		loop {
			match self.gate.enter(|| self.replacement_for(stale)) {
				Entry::Reuse(credential) => {
					obs::record_event(
						FlowKind::Execute,
						&FlowEvent::CredentialReused { fingerprint: credential.fingerprint() },
					);

					return Ok(credential);
				},
				Entry::Lead(lease) => return self.lead_refresh(lease).await,
				Entry::Wait { receiver, queued } => {
					self.refresh_metrics.record_joined();
					obs::record_event(FlowKind::Execute, &FlowEvent::WaiterJoined { queued });

					match receiver.await {
						Ok(Ok(credential)) => return Ok(credential),
						Ok(Err(err)) => return Err(Error::SessionExpired(err)),
						// The leader went away; compete for the next cycle.
						Err(oneshot::Canceled) => continue,
					}
				},
			}
		}
	}

	/// Current credential if it differs from `stale`.
	///
	/// A store read failure counts as "nothing newer", so the caller refreshes.
	fn replacement_for(&self, stale: Option<&Credential>) -> Option<Credential> {
		let current = self
			.store
			.get()
			.inspect_err(|err| {
				obs::record_event(
					FlowKind::Execute,
					&FlowEvent::StoreReadFailed { reason: err.to_string() },
				)
			})
			.ok()
			.flatten()?;

		(Some(&current) != stale).then_some(current)
	}

	async fn lead_refresh(&self, lease: RefreshLease<'_>) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "lead_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		span.instrument(async move {
			obs::record_event(KIND, &FlowEvent::RefreshStarted);

			let outcome = match self.refresher.refresh().await {
				Ok(credential) => self
					.store
					.set(credential.clone())
					.map(|()| credential)
					.map_err(RefreshError::store),
				Err(err) => Err(err),
			};

			if outcome.is_err() && self.config.clear_on_expiry {
				if let Err(err) = self.store.clear() {
					obs::record_event(KIND, &FlowEvent::StoreClearFailed { reason: err.to_string() });
				}
			}

			let resolved = lease.conclude(&outcome).inspect_err(|_| {
				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			})?;

			obs::record_event(KIND, &FlowEvent::WaitersResolved { count: resolved });
			obs::record_waiters_resolved(resolved);

			let now = OffsetDateTime::now_utc();

			match outcome {
				Ok(credential) => {
					self.refresh_metrics.record_success();
					obs::record_flow_outcome(KIND, FlowOutcome::Success);
					self.events.emit(SessionEvent::Refreshed {
						fingerprint: credential.fingerprint(),
						at: now,
					});

					Ok(credential)
				},
				Err(err) => {
					self.refresh_metrics.record_failure();
					obs::record_flow_outcome(KIND, FlowOutcome::Failure);
					obs::record_event(KIND, &FlowEvent::SessionExpired { reason: err.to_string() });
					self.events.emit(SessionEvent::Expired { error: err.clone(), at: now });

					Err(Error::SessionExpired(err))
				},
			}
		})
		.await
	}
}
#[cfg(feature = "reqwest")]
impl RefreshCoordinator<ReqwestExecutor, EndpointRefresh> {
	/// Creates a coordinator on a cookie-aware reqwest client whose refresh operation calls the
	/// configured refresh endpoint with the same cookie jar.
	pub fn with_reqwest(
		store: Arc<dyn CredentialStore>,
		config: SessionConfig,
	) -> Result<Self> {
		let executor = ReqwestExecutor::with_cookie_session()?;
		let refresher = EndpointRefresh::new(&executor, &config);

		Ok(Self::new(store, config, executor, refresher))
	}
}
impl<E, R> Clone for RefreshCoordinator<E, R>
where
	E: ?Sized + RequestExecutor,
	R: ?Sized + RefreshOperation,
{
	fn clone(&self) -> Self {
		Self {
			executor: self.executor.clone(),
			refresher: self.refresher.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			events: self.events.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			gate: self.gate.clone(),
		}
	}
}
impl<E, R> Debug for RefreshCoordinator<E, R>
where
	E: ?Sized + RequestExecutor,
	R: ?Sized + RefreshOperation,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("refresh_endpoint", &self.config.refresh_endpoint.as_str())
			.field("refresh_state", &self.refresh_state())
			.field("waiting", &self.waiting())
			.finish()
	}
}
