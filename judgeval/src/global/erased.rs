//! Object-safe wrappers around [`Tracer`]/[`TracerProvider`], letting the
//! global proxy hold a single `Arc<dyn ErasedTracerProvider>` regardless of
//! the concrete provider's associated `Tracer`/`Span` types. Grounded on
//! `opentelemetry/src/global/trace.rs`'s `ObjectSafeTracerProvider`/
//! `ObjectSafeTracer`/`ObjectSafeSpan` trio, simplified because judgeval's
//! `Span` trait already takes `&self` everywhere and is object-safe on its
//! own.
use crate::trace::{Span, TraceResult, Tracer, TracerProvider};
use crate::Context;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Object-safe stand-in for [`Tracer`].
pub trait ErasedTracer: fmt::Debug + Send + Sync {
    fn start_erased(&self, name: Cow<'static, str>, parent_cx: &Context) -> Arc<dyn Span>;
}

impl<T: Tracer> ErasedTracer for T {
    fn start_erased(&self, name: Cow<'static, str>, parent_cx: &Context) -> Arc<dyn Span> {
        Arc::new(self.start(name, parent_cx))
    }
}

/// Object-safe stand-in for [`TracerProvider`].
pub trait ErasedTracerProvider: fmt::Debug + Send + Sync {
    fn get_tracer_erased(&self, name: &'static str) -> Arc<dyn ErasedTracer>;
    fn force_flush_erased(&self) -> Vec<TraceResult<()>>;
    fn shutdown_erased(&self) -> TraceResult<()>;
    fn has_recording_root_spans_erased(&self) -> bool;
}

impl<P> ErasedTracerProvider for P
where
    P: TracerProvider + fmt::Debug + Send + Sync + 'static,
    P::Tracer: 'static,
{
    fn get_tracer_erased(&self, name: &'static str) -> Arc<dyn ErasedTracer> {
        Arc::new(self.get_tracer(name))
    }
    fn force_flush_erased(&self) -> Vec<TraceResult<()>> {
        <P as TracerProvider>::force_flush(self)
    }
    fn shutdown_erased(&self) -> TraceResult<()> {
        <P as TracerProvider>::shutdown(self)
    }
    fn has_recording_root_spans_erased(&self) -> bool {
        <P as TracerProvider>::has_recording_root_spans(self)
    }
}

impl Span for Arc<dyn Span> {
    fn span_context(&self) -> &crate::trace::SpanContext {
        (**self).span_context()
    }
    fn is_recording(&self) -> bool {
        (**self).is_recording()
    }
    fn set_attribute(&self, attribute: crate::attributes::KeyValue) {
        (**self).set_attribute(attribute)
    }
    fn set_status(&self, status: crate::trace::Status) {
        (**self).set_status(status)
    }
    fn add_event(&self, event: crate::trace::Event) {
        (**self).add_event(event)
    }
    fn end_with_timestamp(&self, timestamp: std::time::SystemTime) {
        (**self).end_with_timestamp(timestamp)
    }
    fn get_attribute(&self, key: &str) -> Option<crate::attributes::Value> {
        (**self).get_attribute(key)
    }
}

/// A tracer backed by a type-erased provider, handed out by
/// `judgeval::global::tracer` so callers never hold a stale concrete tracer
/// across a provider swap.
#[derive(Debug, Clone)]
pub struct BoxedTracer {
    inner: Arc<dyn ErasedTracer>,
}

impl BoxedTracer {
    pub(crate) fn new(inner: Arc<dyn ErasedTracer>) -> Self {
        BoxedTracer { inner }
    }
}

impl Tracer for BoxedTracer {
    type Span = Arc<dyn Span>;

    fn start(&self, name: impl Into<Cow<'static, str>>, parent_cx: &Context) -> Self::Span {
        self.inner.start_erased(name.into(), parent_cx)
    }
}
