//! The refresh state and its waiter queue, guarded as one unit.
//!
//! Every transition happens inside a single `parking_lot` critical section that is never held
//! across an `.await`: electing a leader, queueing a waiter, resolving the queue, and
//! releasing it when a leader disappears.

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::RefreshError,
	obs::{self, FlowEvent, FlowKind},
};

pub(crate) type Resolution = Result<Credential, RefreshError>;

/// Whether a refresh operation is currently running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RefreshState {
	/// No refresh is running; the next auth failure elects a leader.
	#[default]
	Idle,
	/// A leader is running the refresh; auth failures queue behind it.
	InFlight,
}

#[derive(Debug, Default)]
struct GateState {
	state: RefreshState,
	waiters: Vec<oneshot::Sender<Resolution>>,
}

/// Single-flight gate shared by all requests of one coordinator.
#[derive(Debug, Default)]
pub(crate) struct RefreshGate(Mutex<GateState>);
impl RefreshGate {
	/// Decides this request's role in the current refresh cycle.
	///
	/// `replacement` runs inside the critical section, only while the gate is idle; returning a
	/// credential there skips the refresh entirely.
	pub(crate) fn enter<F>(&self, replacement: F) -> Entry<'_>
	where
		F: FnOnce() -> Option<Credential>,
	{
		let mut guard = self.0.lock();

		match guard.state {
			RefreshState::InFlight => {
				let (tx, rx) = oneshot::channel();

				guard.waiters.push(tx);

				Entry::Wait { receiver: rx, queued: guard.waiters.len() }
			},
			RefreshState::Idle => {
				if let Some(credential) = replacement() {
					return Entry::Reuse(credential);
				}

				guard.state = RefreshState::InFlight;

				Entry::Lead(RefreshLease { gate: self, concluded: false })
			},
		}
	}

	pub(crate) fn state(&self) -> RefreshState {
		self.0.lock().state
	}

	pub(crate) fn waiting(&self) -> usize {
		self.0.lock().waiters.len()
	}
}

/// Role assigned by [`RefreshGate::enter`].
pub(crate) enum Entry<'a> {
	/// Won the `Idle -> InFlight` transition; must run the refresh and conclude the lease.
	Lead(RefreshLease<'a>),
	/// Queued behind the running refresh.
	Wait {
		/// Resolved once with the refresh outcome, or canceled if the leader disappears.
		receiver: oneshot::Receiver<Resolution>,
		/// Queue length after joining.
		queued: usize,
	},
	/// The failing credential was already replaced.
	Reuse(Credential),
}

/// Leadership of one refresh cycle.
///
/// Dropping the lease without [`conclude`](Self::conclude) returns the gate to idle and drops
/// every queued sender, so waiters wake up and elect a new leader.
pub(crate) struct RefreshLease<'a> {
	gate: &'a RefreshGate,
	concluded: bool,
}
impl RefreshLease<'_> {
	/// Resolves every queued waiter with `outcome`, clears the queue, and returns the gate to
	/// idle, all in one critical section. Returns the number of waiters resolved.
	pub(crate) fn conclude(mut self, outcome: &Resolution) -> Result<usize> {
		self.concluded = true;

		let mut guard = self.gate.0.lock();

		if guard.state != RefreshState::InFlight {
			let observed = guard.state;

			guard.waiters.clear();
			guard.state = RefreshState::Idle;

			return Err(Error::InvariantViolation {
				message: format!("refresh leader concluded while the gate was {observed:?}"),
			});
		}

		let waiters = mem::take(&mut guard.waiters);
		let count = waiters.len();

		for waiter in waiters {
			// Waiters that timed out dropped their receiver; nothing left to deliver.
			let _ = waiter.send(outcome.clone());
		}

		guard.state = RefreshState::Idle;

		Ok(count)
	}
}
impl Drop for RefreshLease<'_> {
	fn drop(&mut self) {
		if self.concluded {
			return;
		}

		let released = {
			let mut guard = self.gate.0.lock();
			let released = guard.waiters.len();

			guard.waiters.clear();
			guard.state = RefreshState::Idle;

			released
		};

		obs::record_event(FlowKind::Refresh, &FlowEvent::LeaderAbandoned { released });
	}
}
