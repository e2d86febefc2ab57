// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counts every attempt/success/failure as `session_refresh_flow_total{flow, outcome}`.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"session_refresh_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Adds the requests a refresh leader resolved to `session_refresh_waiters_resolved_total`.
///
/// Together with the `refresh` success count this gives the average fan-out per refresh.
pub fn record_waiters_resolved(count: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_refresh_waiters_resolved_total").increment(count as u64);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = count;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn every_flow_and_outcome_label_records_without_a_recorder() {
		for kind in [FlowKind::Execute, FlowKind::Refresh] {
			for outcome in [FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure] {
				record_flow_outcome(kind, outcome);
			}
		}

		record_waiters_resolved(0);
		record_waiters_resolved(4);
	}
}
