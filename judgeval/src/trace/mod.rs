//! Core span/tracer vocabulary (spec.md §3–§4.H). This module defines the
//! *interfaces*; concrete span recording, lifecycle processors, batching and
//! export live in the `judgeval-sdk` crate, mirroring how `opentelemetry`
//! (api) only declares `Span`/`Tracer`/`TracerProvider` traits and
//! `opentelemetry-sdk` supplies the implementations.

mod context;
mod ids;
pub mod noop;

pub use context::SynchronizedSpan;
pub use ids::{SpanContext, SpanId, TraceFlags, TraceId};

use crate::attributes::KeyValue;
use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

/// The kind of work a span represents (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    Span,
    Llm,
    Tool,
    Chain,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Span => "span",
            SpanKind::Llm => "llm",
            SpanKind::Tool => "tool",
            SpanKind::Chain => "chain",
        }
    }
}

impl Default for SpanKind {
    fn default() -> Self {
        SpanKind::Span
    }
}

/// The terminal status of a span (spec.md §3: `ok | error{message}`).
///
/// `Unset` is the value before either is explicitly set (SPEC_FULL.md §3);
/// it exports identically to `Ok`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Status {
    #[default]
    Unset,
    Ok,
    Error {
        message: String,
    },
}

/// A timestamped, attributed point-in-time record attached to a span
/// (spec.md §3), including recorded exceptions.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: Cow<'static, str>,
    pub timestamp: SystemTime,
    pub attributes: Vec<KeyValue>,
}

impl Event {
    pub fn new(name: impl Into<Cow<'static, str>>, attributes: Vec<KeyValue>) -> Self {
        Event {
            name: name.into(),
            timestamp: SystemTime::now(),
            attributes,
        }
    }

    /// An `exception` event, matching the OTel semantic-convention attribute
    /// names the exporter already emits (`exception.message`,
    /// `exception.stacktrace`).
    pub fn exception(message: impl Into<String>, stacktrace: Option<String>) -> Self {
        let mut attrs = vec![KeyValue::new("exception.message", message.into())];
        if let Some(st) = stacktrace {
            attrs.push(KeyValue::new("exception.stacktrace", st));
        }
        Event::new("exception", attrs)
    }
}

/// Operations every span implementation must support so that `Context` and
/// the base tracer (`judgeval-sdk`) can drive it without knowing the
/// concrete type.
pub trait Span: fmt::Debug + Send + Sync + 'static {
    fn span_context(&self) -> &SpanContext;
    fn is_recording(&self) -> bool;
    fn set_attribute(&self, attribute: KeyValue);
    fn set_status(&self, status: Status);
    fn add_event(&self, event: Event);
    fn end(&self) {
        self.end_with_timestamp(SystemTime::now());
    }
    fn end_with_timestamp(&self, timestamp: SystemTime);

    /// Reads back a previously-set attribute. Used by the lifecycle
    /// processors (spec.md §4.D) to copy an attribute from a parent span to
    /// a child at start time; the default implementation (for span types
    /// that don't support readback, e.g. `noop::NoopSpan`) always returns
    /// `None`.
    fn get_attribute(&self, _key: &str) -> Option<crate::attributes::Value> {
        None
    }
}

/// Creates `Tracer`s scoped to an instrumentation name/version. Concrete
/// providers (the SDK's `SdkTracerProvider`, and the global proxy) implement
/// this; `get_tracer` is how `judgeval-sdk::init` and `global::tracer` obtain
/// a tracer without the caller needing the concrete SDK type.
pub trait TracerProvider {
    type Tracer: Tracer;

    fn get_tracer(&self, name: &'static str) -> Self::Tracer;

    /// Flushes any buffered spans. The default is a no-op, suitable for
    /// providers (like [`noop::NoopTracerProvider`]) with nothing to flush.
    fn force_flush(&self) -> Vec<TraceResult<()>> {
        Vec::new()
    }

    /// Releases resources and stops accepting new spans. The default is a
    /// no-op.
    fn shutdown(&self) -> TraceResult<()> {
        Ok(())
    }

    /// Whether this provider currently has a root span (one with no parent)
    /// recording. The global proxy (`judgeval::global`) consults this before
    /// replacing the active provider (spec.md §4.G).
    fn has_recording_root_spans(&self) -> bool {
        false
    }
}

/// The operations spec.md §4.H requires of the base tracer, minus
/// serialization/attribute-setting convenience wrappers (those live as
/// inherent methods on `judgeval_sdk::trace::SdkTracer`, which also
/// implements this trait so it can be boxed behind the global proxy).
pub trait Tracer: Clone + fmt::Debug + Send + Sync + 'static {
    type Span: Span;

    /// Starts a span without making it active (spec.md §4.H `span`).
    fn start(&self, name: impl Into<Cow<'static, str>>, parent_cx: &crate::Context) -> Self::Span;
}

/// Errors surfaced by the trace subsystem that are not user-body errors
/// (spec.md §7 "Invariant violation" / "Transport error").
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("no active span")]
    NoActiveSpan,
    #[error("span already ended")]
    AlreadyEnded,
    #[error("cannot swap the active tracer while a root span is recording")]
    ActiveTracerBusy,
    #[error("export failed: {0}")]
    ExportFailed(String),
    #[error("{0}")]
    Other(String),
}

pub type TraceResult<T> = Result<T, TraceError>;
