//! The no-op exporter substituted whenever `projectId` fails to resolve
//! (spec.md §4.E "If `projectId` is unresolved..."), grounded on
//! `opentelemetry-sdk/src/testing/trace/in_memory_exporter.rs`'s sibling
//! `NoopSpanExporter`.
use super::SpanExporter;
use crate::error::ExportResult;
use crate::trace::SpanData;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct NoopSpanExporter;

#[async_trait]
impl SpanExporter for NoopSpanExporter {
    async fn export(&self, _batch: Vec<SpanData>) -> ExportResult {
        Ok(())
    }
}
