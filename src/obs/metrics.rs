// self
use crate::obs::{HandshakeStep, StepOutcome};

/// Records a handshake-step outcome via the global metrics recorder (when enabled).
pub fn record_step_outcome(step: HandshakeStep, outcome: StepOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth1_broker_handshake_total",
			"step" => step.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (step, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_step_outcome_noop_without_metrics() {
		record_step_outcome(HandshakeStep::SignedCall, StepOutcome::Failure);
	}
}
