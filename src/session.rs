//! Fire-and-forget session lifecycle notifications.
//!
//! UI or session layers call [`SessionEvents::subscribe`] and react to
//! [`SessionEvent::Expired`] (for example by starting a sign-out flow). Delivery never blocks
//! the coordinator: every subscriber owns an unbounded channel, and subscribers whose receiver
//! was dropped are pruned on the next emit.

// crates.io
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
// self
use crate::{_prelude::*, error::RefreshError};

/// Session lifecycle notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
	/// A credential was installed through sign-in.
	SignedIn {
		/// Fingerprint of the installed credential.
		fingerprint: String,
		/// Instant the credential was installed.
		at: OffsetDateTime,
	},
	/// A refresh stored a new credential.
	Refreshed {
		/// Fingerprint of the new credential.
		fingerprint: String,
		/// Instant the credential was stored.
		at: OffsetDateTime,
	},
	/// The refresh failed; the session cannot be recovered without signing in again.
	Expired {
		/// Failure returned by the refresh operation.
		error: RefreshError,
		/// Instant the failure was observed.
		at: OffsetDateTime,
	},
	/// The credential was removed through sign-out.
	SignedOut {
		/// Instant the credential was removed.
		at: OffsetDateTime,
	},
}

/// Subscriber registry for [`SessionEvent`]s.
#[derive(Clone, Debug, Default)]
pub struct SessionEvents(Arc<Mutex<Vec<UnboundedSender<SessionEvent>>>>);
impl SessionEvents {
	/// Registers a new subscriber; events emitted before this call are not replayed.
	pub fn subscribe(&self) -> UnboundedReceiver<SessionEvent> {
		let (tx, rx) = mpsc::unbounded();

		self.0.lock().push(tx);

		rx
	}

	/// Number of subscribers that have not been pruned yet.
	pub fn subscriber_count(&self) -> usize {
		self.0.lock().len()
	}

	pub(crate) fn emit(&self, event: SessionEvent) {
		self.0.lock().retain(|tx| tx.unbounded_send(event.clone()).is_ok());
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use futures::StreamExt;
	// self
	use super::*;

	#[tokio::test]
	async fn every_subscriber_receives_expiry() {
		let events = SessionEvents::default();
		let mut first = events.subscribe();
		let mut second = events.subscribe();
		let error = RefreshError::Rejected { status: 401, message: "refresh token expired".into() };
		let at = OffsetDateTime::now_utc();

		events.emit(SessionEvent::Expired { error: error.clone(), at });

		for rx in [&mut first, &mut second] {
			assert_eq!(rx.next().await, Some(SessionEvent::Expired { error: error.clone(), at }));
		}
	}

	#[test]
	fn dropped_subscribers_are_pruned_on_emit() {
		let events = SessionEvents::default();
		let kept = events.subscribe();

		drop(events.subscribe());

		assert_eq!(events.subscriber_count(), 2);

		events.emit(SessionEvent::SignedOut { at: OffsetDateTime::now_utc() });

		assert_eq!(events.subscriber_count(), 1);

		drop(kept);
	}
}
