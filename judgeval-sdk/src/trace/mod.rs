//! Concrete span recording, lifecycle processing, batching and the base
//! tracer (spec.md §4.D/§4.F/§4.G/§4.H), built on the trait vocabulary
//! declared in the `judgeval` crate.

mod batch_processor;
mod lifecycle;
mod processor;
mod provider;
mod span;
mod tracer;

pub use batch_processor::{BatchConfig, BatchSpanProcessor};
pub use lifecycle::{
    CustomerIdPropagator, LifecycleProcessor, ProjectOverridePropagator, SessionIdPropagator,
};
pub use processor::{NoopSpanProcessor, SpanData, SpanProcessor};
pub use provider::{SdkTracerProvider, SdkTracerProviderBuilder};
pub use span::SdkSpan;
pub use tracer::{erased_attribute, ObserveIter, ObserveStream, SdkTracer};
