// self
use crate::{
	_prelude::*,
	obs::{FlowEvent, FlowKind},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by coordinator flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("session_refresh.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits `event` inside the current span (when tracing is enabled).
pub fn record_event(kind: FlowKind, event: &FlowEvent) {
	#[cfg(feature = "tracing")]
	{
		let flow = kind.as_str();

		match event {
			FlowEvent::RefreshStarted => tracing::debug!(flow, "refresh started"),
			FlowEvent::WaiterJoined { queued } =>
				tracing::debug!(flow, queued, "waiting on in-flight refresh"),
			FlowEvent::WaitersResolved { count } =>
				tracing::debug!(flow, count, "resolved refresh waiters"),
			FlowEvent::CredentialReused { fingerprint } =>
				tracing::debug!(flow, %fingerprint, "credential already refreshed; replaying"),
			FlowEvent::LeaderAbandoned { released } =>
				tracing::warn!(flow, released, "refresh leader dropped before concluding"),
			FlowEvent::RetryExhausted { status } =>
				tracing::warn!(flow, status, "replayed request failed authentication again"),
			FlowEvent::SessionExpired { reason } =>
				tracing::warn!(flow, %reason, "session expired"),
			FlowEvent::StoreReadFailed { reason } =>
				tracing::warn!(flow, %reason, "credential store read failed; refreshing"),
			FlowEvent::StoreClearFailed { reason } =>
				tracing::error!(flow, %reason, "expired credential could not be cleared"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, event);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_event_without_subscriber_is_harmless() {
		record_event(FlowKind::Refresh, &FlowEvent::WaitersResolved { count: 3 });
		record_event(FlowKind::Execute, &FlowEvent::StoreReadFailed { reason: "locked".into() });
		record_event(FlowKind::Refresh, &FlowEvent::StoreClearFailed { reason: "read-only".into() });
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
