//! The glue between [`crate::Context`] and the active [`Span`](super::Span).
use super::{Span, SpanContext};
use std::sync::Arc;

/// Type-erased handle to whatever span is active in a `Context`. Kept
/// separate from the `Context`'s generic value map because it's looked up on
/// essentially every `Tracer` call and deserves its own field rather than a
/// `TypeId` hash lookup.
#[derive(Debug)]
pub struct SynchronizedSpan {
    span_context: SpanContext,
    inner: Option<Arc<dyn Span>>,
}

impl SynchronizedSpan {
    pub fn span_context(&self) -> &SpanContext {
        &self.span_context
    }

    pub fn as_span(&self) -> Option<&Arc<dyn Span>> {
        self.inner.as_ref()
    }
}

impl From<SpanContext> for SynchronizedSpan {
    fn from(span_context: SpanContext) -> Self {
        SynchronizedSpan {
            span_context,
            inner: None,
        }
    }
}

impl<T: Span> From<T> for SynchronizedSpan {
    fn from(span: T) -> Self {
        let span_context = *span.span_context();
        SynchronizedSpan {
            span_context,
            inner: Some(Arc::new(span)),
        }
    }
}

impl crate::Context {
    /// Returns a new `Context` with `span` installed as active.
    pub fn with_span<T: Span>(&self, span: T) -> Self {
        self.with_synchronized_span(span.into())
    }

    /// The span active in this context, if any, as a type-erased handle.
    pub fn span(&self) -> Option<&Arc<dyn Span>> {
        self.span.as_ref()?.as_span()
    }

    /// The `SpanContext` of the active span, or `SpanContext::NONE` if there
    /// is none.
    pub fn span_context(&self) -> SpanContext {
        self.span
            .as_ref()
            .map(|s| *s.span_context())
            .unwrap_or(SpanContext::NONE)
    }
}
