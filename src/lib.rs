//! Single-flight session refresh for authenticated HTTP clients.
//!
//! Every request that hits an expired credential is replayed after exactly one refresh call.
//! Transports and credential stores are pluggable; flows are observable through `tracing`
//! spans and `metrics` counters.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::SessionConfig,
		coordinator::RefreshCoordinator,
		http::ReqwestExecutor,
		refresh::EndpointRefresh,
		store::{CredentialStore, MemoryStore},
	};

	/// Coordinator type alias used by reqwest-backed integration tests.
	pub type ReqwestTestCoordinator = RefreshCoordinator<ReqwestExecutor, EndpointRefresh>;

	/// Builds a reqwest executor with a cookie jar so the ambient session cookie travels with
	/// both API calls and refresh calls.
	pub fn test_reqwest_executor() -> ReqwestExecutor {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.build()
			.expect("Failed to build cookie-aware Reqwest client for tests.");

		ReqwestExecutor::with_client(client)
	}

	/// Constructs a [`RefreshCoordinator`] backed by an in-memory store seeded with `initial`,
	/// the endpoint refresh operation, and the reqwest executor used across integration tests.
	pub fn build_reqwest_test_coordinator(
		config: SessionConfig,
		initial: Option<&str>,
	) -> (ReqwestTestCoordinator, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());

		if let Some(value) = initial {
			store_backend
				.set(crate::auth::Credential::new(value))
				.expect("Seeding the memory store should never fail.");
		}

		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let executor = test_reqwest_executor();
		let refresh = EndpointRefresh::new(&executor, &config);
		let coordinator = RefreshCoordinator::new(store, config, executor, refresh);

		(coordinator, store_backend)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
