// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapping one token flow invocation.
///
/// The span carries `flow` and `stage` from construction, an `endpoint` (token URL host) when
/// known, and an `outcome` filled in once the flow finishes. Secrets never reach span fields.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self::build(kind, stage, None)
	}

	/// Creates a span that also records the host of `token_url`.
	pub fn for_endpoint(kind: FlowKind, stage: &'static str, token_url: &str) -> Self {
		let host = Url::parse(token_url).ok().and_then(|url| url.host_str().map(str::to_owned));

		Self::build(kind, stage, host.as_deref())
	}

	fn build(kind: FlowKind, stage: &'static str, endpoint: Option<&str>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_client_credentials.flow",
				flow = kind.as_str(),
				stage,
				endpoint = endpoint.unwrap_or(""),
				outcome = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, endpoint);

			Self {}
		}
	}

	/// Records the final outcome on the span.
	pub fn record_outcome(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_preserves_output() {
		let span = FlowSpan::for_endpoint(
			FlowKind::ClientCredentials,
			"instrument_preserves_output",
			"https://auth.example.com/token",
		);
		let value = span.instrument(async { 42 }).await;

		span.record_outcome(FlowOutcome::Success);

		assert_eq!(value, 42);
	}

	#[test]
	fn unparsable_endpoint_still_builds_a_span() {
		let span = FlowSpan::for_endpoint(FlowKind::Cached, "test", "not a url");

		span.record_outcome(FlowOutcome::Failure);
	}
}
