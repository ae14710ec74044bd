//! In-memory span exporter for assertions (SPEC_FULL.md component N),
//! grounded on `opentelemetry-sdk/src/testing/trace/in_memory_exporter.rs`.
//! Gated behind the `testing` feature so it never ships in a release build.
use crate::error::ExportResult;
use crate::trace::SpanData;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Collects every exported batch in memory instead of shipping it anywhere.
/// Typically wrapped in a [`crate::trace::BatchSpanProcessor`] (to exercise
/// the real batching path) or attached directly via a custom `SpanProcessor`
/// when a test needs spans to show up synchronously on `end()`.
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    pub fn new() -> Self {
        InMemorySpanExporter::default()
    }

    /// Snapshot of every span exported so far, oldest first.
    pub fn exported_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .expect("in-memory exporter lock poisoned")
            .clone()
    }

    /// Finds the single exported span with the given name, panicking with a
    /// readable message if it's missing or duplicated — the shape most
    /// assertions in this SDK's own tests want.
    pub fn find_span(&self, name: &str) -> SpanData {
        let spans = self.exported_spans();
        let matches: Vec<&SpanData> = spans.iter().filter(|s| s.name == name).collect();
        match matches.as_slice() {
            [single] => (*single).clone(),
            [] => panic!("no exported span named {name:?} (have: {:?})", names(&spans)),
            _ => panic!("multiple exported spans named {name:?}"),
        }
    }

    pub fn reset(&self) {
        self.spans
            .lock()
            .expect("in-memory exporter lock poisoned")
            .clear();
    }
}

fn names(spans: &[SpanData]) -> Vec<String> {
    spans.iter().map(|s| s.name.to_string()).collect()
}

#[async_trait]
impl crate::export::SpanExporter for InMemorySpanExporter {
    async fn export(&self, mut batch: Vec<SpanData>) -> ExportResult {
        self.spans
            .lock()
            .expect("in-memory exporter lock poisoned")
            .append(&mut batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SpanExporter;
    use judgeval::attributes::KeyValue;
    use judgeval::trace::{SpanContext, SpanId, Status, TraceFlags, TraceId};
    use std::borrow::Cow;
    use std::time::SystemTime;

    fn sample_span(name: &'static str) -> SpanData {
        SpanData {
            span_context: SpanContext::new(
                TraceId::from_bytes([1; 16]),
                SpanId::from_bytes([2; 8]),
                TraceFlags::SAMPLED,
            ),
            parent_span_id: None,
            name: Cow::Borrowed(name),
            start_time: SystemTime::now(),
            end_time: SystemTime::now(),
            attributes: vec![KeyValue::new("k", "v")],
            events: Vec::new(),
            status: Status::Unset,
            instrumentation_name: "test",
        }
    }

    #[tokio::test]
    async fn collects_exported_batches() {
        let exporter = InMemorySpanExporter::new();
        exporter.export(vec![sample_span("a"), sample_span("b")]).await.unwrap();
        assert_eq!(exporter.exported_spans().len(), 2);
        assert_eq!(exporter.find_span("a").name, "a");
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let exporter = InMemorySpanExporter::new();
        exporter.export(vec![sample_span("a")]).await.unwrap();
        exporter.reset();
        assert!(exporter.exported_spans().is_empty());
    }

    #[tokio::test]
    #[should_panic(expected = "no exported span named")]
    async fn find_span_panics_when_missing() {
        let exporter = InMemorySpanExporter::new();
        exporter.find_span("missing");
    }
}
