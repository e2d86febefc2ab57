//! Optional observability helpers for coordinator flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `session_refresh.flow`
//!   with the `flow` and `stage` fields, plus the [`FlowEvent`]s recorded inside them.
//! - Enable `metrics` to increment `session_refresh_waiters_resolved_total` per concluded
//!   refresh and the `session_refresh_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Flow kinds observed by the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// A caller request passing through [`execute`](crate::coordinator::RefreshCoordinator::execute).
	Execute,
	/// A refresh operation performed by the elected leader.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Execute => "execute",
			FlowKind::Refresh => "refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a coordinator helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Notable state transitions inside a flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowEvent {
	/// This request won the gate and is calling the refresh operation.
	RefreshStarted,
	/// This request queued behind an in-flight refresh.
	WaiterJoined {
		/// Queue length after joining.
		queued: usize,
	},
	/// The leader resolved the queue.
	WaitersResolved {
		/// Number of waiters resolved.
		count: usize,
	},
	/// The failing credential was already replaced; the request reuses the current one.
	CredentialReused {
		/// Fingerprint of the reused credential.
		fingerprint: String,
	},
	/// The leader went away before concluding; waiters were released for re-election.
	LeaderAbandoned {
		/// Number of waiters released.
		released: usize,
	},
	/// A replayed request failed authentication again.
	RetryExhausted {
		/// Auth-failure status of the replay.
		status: u16,
	},
	/// The refresh failed and the session is considered expired.
	SessionExpired {
		/// Rendered refresh failure.
		reason: String,
	},
	/// The credential store could not be read; the request proceeds as if it held nothing.
	StoreReadFailed {
		/// Rendered store failure.
		reason: String,
	},
	/// The expired credential could not be removed from the store.
	StoreClearFailed {
		/// Rendered store failure.
		reason: String,
	},
}
