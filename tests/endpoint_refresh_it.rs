#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use futures::future;
use httpmock::prelude::*;
use url::Url;
// self
use session_refresh::{
	config::SessionConfig,
	coordinator::{RefreshState, ReqwestCoordinator},
	error::{Error, RefreshError},
	store::{CredentialStore, MemoryStore},
};

const REFRESHED: &str = r#"{"data":{"userId":"u-1","accessToken":"T2","refreshToken":"R2"},"status":200,"message":"ok"}"#;

fn build_coordinator(server: &MockServer) -> (ReqwestCoordinator, Arc<MemoryStore>) {
	let config = SessionConfig::builder()
		.base_url(Url::parse(&server.url("/")).expect("Mock server URL should parse."))
		.build()
		.expect("Session config should build for the mock server.");
	let store = Arc::new(MemoryStore::default());
	let backend: Arc<dyn CredentialStore> = store.clone();
	let coordinator = ReqwestCoordinator::with_reqwest(backend, config)
		.expect("Cookie-aware reqwest client should build.");

	(coordinator, store)
}

async fn sign_in(server: &MockServer, coordinator: &ReqwestCoordinator) {
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/sign-in");
			then.status(200)
				.header("set-cookie", "session=abc; Path=/; HttpOnly")
				.header("content-type", "application/json")
				.body(r#"{"data":{"accessToken":"T1"},"status":200,"message":"ok"}"#);
		})
		.await;

	coordinator
		.executor
		.client()
		.post(server.url("/api/v1/auth/sign-in"))
		.send()
		.await
		.expect("Sign-in call should reach the mock server.");
	coordinator.sign_in("T1").expect("Sign-in should store the credential.");
	login.assert_calls_async(1).await;
}

#[tokio::test]
async fn expired_credential_is_refreshed_through_the_session_cookie() {
	let server = MockServer::start_async().await;
	let (coordinator, store) = build_coordinator(&server);

	sign_in(&server, &coordinator).await;

	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me").header("authorization", "Bearer T1");
			then.status(401).body("token expired");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me").header("authorization", "Bearer T2");
			then.status(200).header("content-type", "application/json").body(r#"{"name":"Ada"}"#);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/auth/refresh").header("cookie", "session=abc");
			then.status(200).header("content-type", "application/json").body(REFRESHED);
		})
		.await;
	let requests = (0..3).map(|_| {
		let request = coordinator
			.request(http::Method::GET, "/api/v1/me")
			.expect("Relative request path should resolve against the base URL.");

		coordinator.execute(request)
	});

	for response in future::join_all(requests).await {
		let response = response.expect("Every request should succeed after the refresh.");

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.text(), r#"{"name":"Ada"}"#);
	}

	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(3).await;
	expired.assert_calls_async(3).await;

	assert_eq!(
		store.get().expect("Memory store reads never fail.").map(|c| c.expose().to_owned()),
		Some("T2".to_owned())
	);
	assert_eq!(coordinator.refresh_state(), RefreshState::Idle);
}

#[tokio::test]
async fn rejected_refresh_expires_the_session() {
	let server = MockServer::start_async().await;
	let (coordinator, store) = build_coordinator(&server);

	sign_in(&server, &coordinator).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/me");
			then.status(401);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":null,"status":401,"message":"Refresh token expired"}"#);
		})
		.await;
	let request = coordinator
		.request(http::Method::GET, "/api/v1/me")
		.expect("Relative request path should resolve against the base URL.");
	let err = coordinator.execute(request).await.expect_err("The session must expire.");

	refresh.assert_calls_async(1).await;

	assert!(matches!(
		err,
		Error::SessionExpired(RefreshError::Rejected { status: 401, ref message })
			if message == "Refresh token expired"
	));
	assert_eq!(store.get().expect("Memory store reads never fail."), None);
}
