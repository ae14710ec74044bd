//! The concrete recording span, grounded on `opentelemetry-sdk/src/trace/span.rs`'s
//! `Span` (a `Mutex`-guarded mutable record behind an immutable, `Clone`-able
//! handle so many `Arc<SdkSpan>` holders can mutate the same underlying span).
use super::processor::SpanData;
use judgeval::attributes::KeyValue;
use judgeval::trace::{Event, SpanContext, SpanId};
use judgeval::trace::{Span, Status};
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use super::processor::SpanProcessor;

struct Recording {
    name: Cow<'static, str>,
    start_time: SystemTime,
    end_time: Option<SystemTime>,
    attributes: Vec<KeyValue>,
    events: Vec<Event>,
    status: Status,
}

/// A span being recorded by an `SdkTracer`. Cheap to clone (clones the
/// `Arc`); every clone mutates the same underlying recording.
#[derive(Clone, Debug)]
pub struct SdkSpan {
    span_context: SpanContext,
    parent_span_id: Option<SpanId>,
    instrumentation_name: &'static str,
    processors: Arc<Vec<Arc<dyn SpanProcessor>>>,
    recording: Arc<Mutex<Option<Recording>>>,
    /// Set only for root spans (no parent); decremented on `end`, mirroring
    /// the increment the tracer performs on `start`, so the global proxy's
    /// `has_recording_root_spans` (spec.md §4.G) stays accurate.
    root_recording: Option<Arc<AtomicUsize>>,
}

impl std::fmt::Debug for Recording {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recording")
            .field("name", &self.name)
            .field("ended", &self.end_time.is_some())
            .finish()
    }
}

impl SdkSpan {
    pub(crate) fn start(
        name: impl Into<Cow<'static, str>>,
        span_context: SpanContext,
        parent_span_id: Option<SpanId>,
        instrumentation_name: &'static str,
        processors: Arc<Vec<Arc<dyn SpanProcessor>>>,
        root_recording: Option<Arc<AtomicUsize>>,
    ) -> Self {
        let recording = Recording {
            name: name.into(),
            start_time: SystemTime::now(),
            end_time: None,
            attributes: Vec::new(),
            events: Vec::new(),
            status: Status::Unset,
        };
        SdkSpan {
            span_context,
            parent_span_id,
            instrumentation_name,
            processors,
            recording: Arc::new(Mutex::new(Some(recording))),
            root_recording,
        }
    }

    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }
}

impl Span for SdkSpan {
    fn span_context(&self) -> &SpanContext {
        &self.span_context
    }

    fn is_recording(&self) -> bool {
        self.recording
            .lock()
            .expect("span mutex poisoned")
            .as_ref()
            .is_some_and(|r| r.end_time.is_none())
    }

    fn set_attribute(&self, attribute: KeyValue) {
        if !self.span_context.is_sampled() {
            return;
        }
        let mut guard = self.recording.lock().expect("span mutex poisoned");
        if let Some(recording) = guard.as_mut() {
            if recording.end_time.is_none() {
                if let Some(existing) = recording
                    .attributes
                    .iter_mut()
                    .find(|kv| kv.key == attribute.key)
                {
                    existing.value = attribute.value;
                } else {
                    recording.attributes.push(attribute);
                }
            } else {
                tracing::warn!(
                    target: "judgeval",
                    span = %self.span_context.span_id(),
                    "set_attribute called on an already-ended span; ignored"
                );
            }
        }
    }

    fn set_status(&self, status: Status) {
        if !self.span_context.is_sampled() {
            return;
        }
        let mut guard = self.recording.lock().expect("span mutex poisoned");
        if let Some(recording) = guard.as_mut() {
            if recording.end_time.is_none() {
                recording.status = status;
            }
        }
    }

    fn add_event(&self, event: Event) {
        if !self.span_context.is_sampled() {
            return;
        }
        let mut guard = self.recording.lock().expect("span mutex poisoned");
        if let Some(recording) = guard.as_mut() {
            if recording.end_time.is_none() {
                recording.events.push(event);
            }
        }
    }

    fn get_attribute(&self, key: &str) -> Option<judgeval::attributes::Value> {
        let guard = self.recording.lock().expect("span mutex poisoned");
        guard
            .as_ref()?
            .attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.clone())
    }

    fn end_with_timestamp(&self, timestamp: SystemTime) {
        let data = {
            let mut guard = self.recording.lock().expect("span mutex poisoned");
            match guard.as_mut() {
                Some(recording) if recording.end_time.is_none() => {
                    recording.end_time = Some(timestamp);
                    guard.take()
                }
                Some(_) => {
                    tracing::warn!(
                        target: "judgeval",
                        span = %self.span_context.span_id(),
                        "end() called twice; ignored"
                    );
                    None
                }
                None => None,
            }
        };
        let Some(recording) = data else { return };
        if let Some(counter) = &self.root_recording {
            counter.fetch_sub(1, Ordering::AcqRel);
        }
        if !self.span_context.is_sampled() {
            return;
        }
        let span_data = SpanData {
            span_context: self.span_context,
            parent_span_id: self.parent_span_id,
            name: recording.name,
            start_time: recording.start_time,
            end_time: recording.end_time.unwrap_or(timestamp),
            attributes: recording.attributes,
            events: recording.events,
            status: recording.status,
            instrumentation_name: self.instrumentation_name,
        };
        if let Some((last, rest)) = self.processors.split_last() {
            for processor in rest {
                processor.on_end(span_data.clone());
            }
            last.on_end(span_data);
        }
    }
}
