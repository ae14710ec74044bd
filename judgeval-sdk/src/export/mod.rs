//! Span export (spec.md §4.E).
mod http;
mod noop;

pub use http::HttpSpanExporter;
pub use noop::NoopSpanExporter;

use crate::error::ExportResult;
use crate::trace::SpanData;
use async_trait::async_trait;
use std::fmt;

/// Ships a batch of ended spans somewhere. Grounded on
/// `opentelemetry-sdk/src/export/trace.rs`'s `SpanExporter` trait.
#[async_trait]
pub trait SpanExporter: Send + Sync + fmt::Debug {
    async fn export(&self, batch: Vec<SpanData>) -> ExportResult;
    async fn shutdown(&self) {}
}
