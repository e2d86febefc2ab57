//! Demonstrates five concurrent requests sharing one refresh through a custom transport.
//!
//! 1. Implement [`RequestExecutor`] for an in-process API that only accepts the newest
//!    credential.
//! 2. Pass a closure as the [`RefreshOperation`]; it mints a new credential and tells the API
//!    to accept it.
//! 3. Fire five requests with the expired credential and watch them replay after one refresh.
//! 4. Swap in a failing refresh and observe [`SessionEvent::Expired`].

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use color_eyre::Result;
use futures::{StreamExt, future};
use http::{StatusCode, header::AUTHORIZATION};
use parking_lot::Mutex;
use url::Url;
// self
use session_refresh::{
	auth::Credential,
	config::SessionConfig,
	coordinator::RefreshCoordinator,
	error::RefreshError,
	http::{ApiRequest, ApiResponse, ExecutorFuture, RequestExecutor},
	refresh::RefreshOperation,
	session::SessionEvent,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let api = Arc::new(InProcessApi::default());
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::with_credential("access-1"));
	let config = SessionConfig::builder().base_url(Url::parse("https://api.example.com")?).build()?;
	let refresh_calls = Arc::new(AtomicUsize::new(0));
	let refresher: Arc<dyn RefreshOperation> = {
		let api = api.clone();
		let refresh_calls = refresh_calls.clone();

		Arc::new(move || {
			let api = api.clone();
			let generation = refresh_calls.fetch_add(1, Ordering::SeqCst) + 2;

			async move {
				// Give the other requests time to queue up behind this refresh.
				tokio::time::sleep(Duration::from_millis(100)).await;

				let token = format!("access-{generation}");

				*api.accepted.lock() = token.clone();

				Ok::<_, RefreshError>(Credential::new(token))
			}
		})
	};
	let coordinator: RefreshCoordinator<InProcessApi, dyn RefreshOperation> =
		RefreshCoordinator::new(store.clone(), config.clone(), api.clone(), refresher);
	let mut events = coordinator.subscribe();
	let requests = (0..5)
		.map(|i| coordinator.request(http::Method::GET, &format!("/api/v1/items/{i}")))
		.collect::<Result<Vec<_>, _>>()?;
	let responses =
		future::join_all(requests.into_iter().map(|request| coordinator.execute(request))).await;

	for response in responses {
		println!("Replayed request finished with status {}.", response?.status_code());
	}

	println!(
		"Refresh calls: {}; requests that waited on the leader: {}.",
		refresh_calls.load(Ordering::SeqCst),
		coordinator.refresh_metrics.waiters_joined()
	);

	if let Some(SessionEvent::Refreshed { fingerprint, .. }) = events.next().await {
		println!("Stored a new credential with fingerprint {fingerprint}.");
	}

	let failing: Arc<dyn RefreshOperation> = Arc::new(|| async {
		Err::<Credential, _>(RefreshError::Rejected {
			status: 401,
			message: "refresh session revoked".into(),
		})
	});
	let revoked: RefreshCoordinator<InProcessApi, dyn RefreshOperation> =
		RefreshCoordinator::new(store, config, api.clone(), failing);
	let mut events = revoked.subscribe();

	*api.accepted.lock() = "nothing".into();

	match revoked.execute(revoked.request(http::Method::GET, "/api/v1/me")?).await {
		Ok(_) => println!("The revoked session unexpectedly succeeded."),
		Err(e) => println!("Request failed after the refresh was rejected: {e}"),
	}

	if let Some(SessionEvent::Expired { error, .. }) = events.next().await {
		println!("Session layer notified of expiry: {error}.");
	}

	Ok(())
}

/// API that accepts only the most recently minted credential.
struct InProcessApi {
	accepted: Mutex<String>,
}
impl Default for InProcessApi {
	fn default() -> Self {
		Self { accepted: Mutex::new("access-2".into()) }
	}
}
impl RequestExecutor for InProcessApi {
	fn send<'a>(&'a self, request: &'a ApiRequest) -> ExecutorFuture<'a> {
		Box::pin(async move {
			let expected = format!("Bearer {}", self.accepted.lock());
			let authorized = request
				.headers
				.get(AUTHORIZATION)
				.is_some_and(|value| value.as_bytes() == expected.as_bytes());

			if authorized {
				Ok(ApiResponse::new(StatusCode::OK, "{}"))
			} else {
				Ok(ApiResponse::new(StatusCode::UNAUTHORIZED, "credential expired"))
			}
		})
	}
}
