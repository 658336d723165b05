// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by service operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("signalone.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
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

/// Logs why a credential was rejected.
///
/// Callers only ever see a uniform error; the reason stays in the debug log.
pub fn log_rejection(kind: OperationKind, reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = kind.as_str(), %reason, "credential rejected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, reason);
	}
}

/// Logs a non-fatal inconsistency the caller cannot act on.
pub fn log_inconsistency(kind: OperationKind, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation = kind.as_str(), %detail, "partial write");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, detail);
	}
}
