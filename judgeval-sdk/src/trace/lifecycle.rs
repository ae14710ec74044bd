//! On-start attribute inheritance (spec.md §4.D). Each processor copies one
//! attribute from the parent span, if present, to the child. Grounded on the
//! teacher's `SpanProcessor` chain (registration order = execution order)
//! but with judgeval-specific keys instead of OTel's generic ones.
use super::processor::SpanProcessor;
use super::span::SdkSpan;
use judgeval::keys;
use judgeval::trace::{Span, TraceResult};
use judgeval::Context;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Copies `key` from the parent span's attributes to the child, if the
/// parent span is present and carries that attribute. Swallows panics with a
/// warning (spec.md §4.D: "must not throw"); idempotent since it always
/// overwrites with the same source value.
fn inherit(key: &'static str, child: &SdkSpan, parent_cx: &Context) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let Some(parent) = parent_cx.span() else {
            return;
        };
        let Some(value) = parent.get_attribute(key) else {
            return;
        };
        child.set_attribute(judgeval::attributes::KeyValue::new(key, value));
    }));
    if result.is_err() {
        tracing::warn!(target: "judgeval", key, "lifecycle processor panicked; ignored");
    }
}

/// One attribute-inheritance rule, run in a fixed order by
/// `SdkTracerProvider` (customer → session → project-override, spec.md §4.D).
pub trait LifecycleProcessor: SpanProcessor {}

macro_rules! lifecycle_propagator {
    ($name:ident, $key:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Default)]
        pub struct $name;

        impl SpanProcessor for $name {
            fn on_start(&self, span: &SdkSpan, parent_cx: &Context) {
                inherit($key, span, parent_cx);
            }
            fn on_end(&self, _span: super::processor::SpanData) {}
            fn force_flush(&self) -> TraceResult<()> {
                Ok(())
            }
            fn shutdown(&self) -> TraceResult<()> {
                Ok(())
            }
        }

        impl LifecycleProcessor for $name {}
    };
}

lifecycle_propagator!(
    CustomerIdPropagator,
    keys::CUSTOMER_ID,
    "Inherits `judgment.customer_id` from the parent span."
);
lifecycle_propagator!(
    SessionIdPropagator,
    keys::SESSION_ID,
    "Inherits `judgment.session_id` from the parent span."
);
lifecycle_propagator!(
    ProjectOverridePropagator,
    keys::PROJECT_ID_OVERRIDE,
    "Inherits `judgment.project_id_override` from the parent span."
);
