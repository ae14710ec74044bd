//! No-op trace implementation, used as the global proxy's delegate before
//! any platform tracer is registered, and substituted whenever `projectId`
//! fails to resolve (spec.md §4.I, §7 "Configuration error").
use super::{Event, Span, SpanContext, Status, Tracer, TracerProvider};
use crate::attributes::KeyValue;
use crate::Context;
use std::borrow::Cow;
use std::time::SystemTime;

#[derive(Debug, Default, Clone)]
pub struct NoopSpan {
    span_context: SpanContext,
}

impl NoopSpan {
    pub fn new() -> Self {
        NoopSpan {
            span_context: SpanContext::NONE,
        }
    }
}

impl Span for NoopSpan {
    fn span_context(&self) -> &SpanContext {
        &self.span_context
    }
    fn is_recording(&self) -> bool {
        false
    }
    fn set_attribute(&self, _attribute: KeyValue) {}
    fn set_status(&self, _status: Status) {}
    fn add_event(&self, _event: Event) {}
    fn end_with_timestamp(&self, _timestamp: SystemTime) {}
}

#[derive(Debug, Default, Clone)]
pub struct NoopTracer {
    _private: (),
}

impl NoopTracer {
    pub fn new() -> Self {
        NoopTracer::default()
    }
}

impl Tracer for NoopTracer {
    type Span = NoopSpan;

    fn start(&self, _name: impl Into<Cow<'static, str>>, _parent_cx: &Context) -> Self::Span {
        NoopSpan::new()
    }
}

#[derive(Debug, Default)]
pub struct NoopTracerProvider {
    _private: (),
}

impl NoopTracerProvider {
    pub fn new() -> Self {
        NoopTracerProvider::default()
    }
}

impl TracerProvider for NoopTracerProvider {
    type Tracer = NoopTracer;

    fn get_tracer(&self, _name: &'static str) -> Self::Tracer {
        NoopTracer::new()
    }
}
