//! Optional observability helpers for client flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every send and refresh inside a span named `authed_client.flow`
//!   with `flow` and `stage` fields, and to emit `warn` events when a refresh fails.
//! - Enable `metrics` to increment the `authed_client_flow_total` counter for every flow
//!   outcome, labeled by `flow` and `outcome`.

mod tracing;

pub use tracing::*;

// self
use crate::_prelude::*;

/// Client flows observed by the instrumentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// A caller-initiated request, including its interception steps.
	Send,
	/// Re-dispatch of a request after an authorization failure.
	Retry,
	/// Exchange of the refresh credential for new credentials.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Send => "send",
			FlowKind::Retry => "retry",
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
	/// Entry to a client flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated (or, for refreshes, absorbed).
	Failure,
	/// Flow ended without doing any work, such as a refresh with no refresh credential stored.
	Skipped,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Skipped => "skipped",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Label pairs attached to the `authed_client_flow_total` counter.
pub fn flow_labels(kind: FlowKind, outcome: FlowOutcome) -> [(&'static str, &'static str); 2] {
	[("flow", kind.as_str()), ("outcome", outcome.as_str())]
}

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		let labels = flow_labels(kind, outcome);

		metrics::counter!("authed_client_flow_total", &labels[..]).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
