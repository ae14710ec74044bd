//! The `SpanProcessor` seam between span recording and export, grounded on
//! `opentelemetry-sdk/src/trace/span_processor.rs`'s `SpanProcessor` trait.
use judgeval::attributes::KeyValue;
use judgeval::trace::{Event, SpanContext, SpanId, Status, TraceResult};
use judgeval::Context;
use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

/// An immutable record of a finished span, handed to the exporter. Carries
/// ids rather than in-memory pointers, per spec.md §3's "exported spans
/// preserve parent/child linkage via ids" invariant.
#[derive(Clone, Debug)]
pub struct SpanData {
    pub span_context: SpanContext,
    pub parent_span_id: Option<SpanId>,
    pub name: Cow<'static, str>,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub attributes: Vec<KeyValue>,
    pub events: Vec<Event>,
    pub status: Status,
    pub instrumentation_name: &'static str,
}

/// Hooks invoked at span start/end, run in registration order. Mirrors
/// `opentelemetry-sdk`'s `SpanProcessor` trait; `on_start` receives the
/// parent `Context` so lifecycle processors (spec.md §4.D) can read the
/// parent span's attributes.
pub trait SpanProcessor: Send + Sync + fmt::Debug {
    /// Called synchronously on the thread that started the span. Must not
    /// block or panic (spec.md §4.D: "must not throw").
    fn on_start(&self, span: &super::SdkSpan, parent_cx: &Context);
    /// Called synchronously within `Span::end`, after the end timestamp is
    /// set.
    fn on_end(&self, span: SpanData);
    fn force_flush(&self) -> TraceResult<()>;
    fn shutdown(&self) -> TraceResult<()>;
}

/// Used when no export is configured (spec.md §9 "No-op degradation"):
/// `with`/`observe` behave identically, but nothing is ever queued.
#[derive(Debug, Default)]
pub struct NoopSpanProcessor;

impl SpanProcessor for NoopSpanProcessor {
    fn on_start(&self, _span: &super::SdkSpan, _parent_cx: &Context) {}
    fn on_end(&self, _span: SpanData) {}
    fn force_flush(&self) -> TraceResult<()> {
        Ok(())
    }
    fn shutdown(&self) -> TraceResult<()> {
        Ok(())
    }
}
