//! Bounded queue, scheduled flush, force-flush, shutdown (spec.md §4.F).
//! Grounded on `opentelemetry-sdk/src/trace/span_processor.rs`'s
//! `BatchSpanProcessor`: a dedicated OS thread owns the queue and the
//! exporter; `on_end` is a non-blocking send; flush/shutdown are
//! request/response messages answered over a `crossbeam_channel` so the
//! calling task can block on completion without the worker blocking other
//! producers. Because every message (span, flush, shutdown) is handled by
//! one single-threaded loop, "at most one export in flight" and "forceFlush
//! waits for the timer's in-progress export" (spec.md §4.F concurrency
//! clause) fall out for free rather than needing their own lock.
use super::processor::{SpanData, SpanProcessor};
use super::span::SdkSpan;
use crate::export::SpanExporter;
use judgeval::trace::{TraceError, TraceResult};
use judgeval::Context;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Mirrors `opentelemetry-sdk`'s `OTEL_BSP_*` defaults.
#[derive(Clone, Copy, Debug)]
pub struct BatchConfig {
    pub max_queue_size: usize,
    pub max_export_batch_size: usize,
    pub scheduled_delay: Duration,
    pub export_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            max_queue_size: 2_048,
            max_export_batch_size: 512,
            scheduled_delay: Duration::from_millis(5_000),
            export_timeout: Duration::from_millis(30_000),
        }
    }
}

enum Message {
    Export(SpanData),
    Flush(crossbeam_channel::Sender<TraceResult<()>>),
    Shutdown(crossbeam_channel::Sender<TraceResult<()>>),
}

#[derive(Debug)]
pub struct BatchSpanProcessor {
    sender: crossbeam_channel::Sender<Message>,
    dropped: Arc<AtomicUsize>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Export(_) => f.write_str("Message::Export"),
            Message::Flush(_) => f.write_str("Message::Flush"),
            Message::Shutdown(_) => f.write_str("Message::Shutdown"),
        }
    }
}

impl BatchSpanProcessor {
    pub fn new(exporter: Arc<dyn SpanExporter>, config: BatchConfig) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(config.max_queue_size);
        let dropped = Arc::new(AtomicUsize::new(0));
        let worker_dropped = dropped.clone();
        thread::Builder::new()
            .name("judgeval-batch-processor".to_string())
            .spawn(move || run(receiver, exporter, config))
            .expect("failed to spawn judgeval batch processor thread");
        BatchSpanProcessor {
            sender,
            dropped: worker_dropped,
        }
    }

    /// Number of spans dropped because the queue was full. Exposed so
    /// callers can alert on sustained backpressure (SPEC_FULL.md §4.F open
    /// question on dropped-span accounting).
    pub fn dropped_spans_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    fn record_drop(&self) {
        let count = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_power_of_two() {
            tracing::warn!(
                target: "judgeval",
                dropped_total = count,
                "batch processor queue full; spans are being dropped"
            );
        }
    }
}

impl SpanProcessor for BatchSpanProcessor {
    fn on_start(&self, _span: &SdkSpan, _parent_cx: &Context) {}

    fn on_end(&self, span: SpanData) {
        if !span.span_context.is_sampled() {
            return;
        }
        if self.sender.try_send(Message::Export(span)).is_err() {
            self.record_drop();
        }
    }

    fn force_flush(&self) -> TraceResult<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.sender
            .send(Message::Flush(tx))
            .map_err(|e| TraceError::Other(e.to_string()))?;
        rx.recv().map_err(|e| TraceError::Other(e.to_string()))?
    }

    fn shutdown(&self) -> TraceResult<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.sender
            .send(Message::Shutdown(tx))
            .map_err(|e| TraceError::Other(e.to_string()))?;
        rx.recv().map_err(|e| TraceError::Other(e.to_string()))?
    }
}

fn run(
    receiver: crossbeam_channel::Receiver<Message>,
    exporter: Arc<dyn SpanExporter>,
    config: BatchConfig,
) {
    let ticker = crossbeam_channel::tick(config.scheduled_delay);
    let mut buffer: Vec<SpanData> = Vec::with_capacity(config.max_export_batch_size);

    loop {
        crossbeam_channel::select! {
            recv(receiver) -> msg => match msg {
                Ok(Message::Export(span)) => {
                    buffer.push(span);
                    if buffer.len() >= config.max_export_batch_size {
                        let batch = std::mem::replace(&mut buffer, Vec::with_capacity(config.max_export_batch_size));
                        export_batches(&exporter, batch, config.max_export_batch_size, config.export_timeout);
                    }
                }
                Ok(Message::Flush(reply)) => {
                    drain_pending(&receiver, &mut buffer);
                    let result = export_all(&exporter, std::mem::take(&mut buffer), config.max_export_batch_size, config.export_timeout);
                    let _ = reply.send(result);
                }
                Ok(Message::Shutdown(reply)) => {
                    drain_pending(&receiver, &mut buffer);
                    let result = export_all(&exporter, std::mem::take(&mut buffer), config.max_export_batch_size, config.export_timeout);
                    futures_executor::block_on(exporter.shutdown());
                    let _ = reply.send(result);
                    return;
                }
                Err(_) => return,
            },
            recv(ticker) -> _ => {
                if !buffer.is_empty() {
                    let batch = std::mem::replace(&mut buffer, Vec::with_capacity(config.max_export_batch_size));
                    export_batches(&exporter, batch, config.max_export_batch_size, config.export_timeout);
                }
            }
        }
    }
}

/// Non-blocking drain of whatever `Export` messages are already queued, for
/// `forceFlush`/`shutdown` to pick up spans that arrived but weren't yet
/// large enough to trigger a batch. A concurrent `Flush`/`Shutdown` racing
/// in is vanishingly rare (two callers force-flushing at once); rather than
/// silently swallow it (which would hang that caller forever) it is failed
/// immediately with an explicit error.
fn drain_pending(receiver: &crossbeam_channel::Receiver<Message>, buffer: &mut Vec<SpanData>) {
    while let Ok(msg) = receiver.try_recv() {
        match msg {
            Message::Export(span) => buffer.push(span),
            Message::Flush(reply) | Message::Shutdown(reply) => {
                let _ = reply.send(Err(TraceError::Other(
                    "superseded by a concurrent force_flush/shutdown".to_string(),
                )));
                break;
            }
        }
    }
}

fn export_batches(
    exporter: &Arc<dyn SpanExporter>,
    spans: Vec<SpanData>,
    max_batch: usize,
    timeout: Duration,
) {
    let _ = export_all(exporter, spans, max_batch, timeout);
}

fn export_all(
    exporter: &Arc<dyn SpanExporter>,
    spans: Vec<SpanData>,
    max_batch: usize,
    timeout: Duration,
) -> TraceResult<()> {
    let mut ok = true;
    for chunk in spans.chunks(max_batch) {
        if !export_with_timeout(exporter, chunk.to_vec(), timeout) {
            ok = false;
        }
    }
    if ok {
        Ok(())
    } else {
        Err(TraceError::ExportFailed(
            "one or more batches failed or timed out".to_string(),
        ))
    }
}

/// Runs the export on a helper thread and waits up to `timeout`; if the
/// export hasn't finished by then it is abandoned (spec.md §4.F: "the
/// in-flight batch is abandoned... the next cycle proceeds") and the helper
/// thread is left to finish in the background.
fn export_with_timeout(
    exporter: &Arc<dyn SpanExporter>,
    batch: Vec<SpanData>,
    timeout: Duration,
) -> bool {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let exporter = exporter.clone();
    thread::spawn(move || {
        let result = futures_executor::block_on(exporter.export(batch));
        let _ = tx.send(result.is_ok());
        if let Err(err) = result {
            tracing::warn!(target: "judgeval", error = %err, "span export failed");
        }
    });
    match rx.recv_timeout(timeout) {
        Ok(success) => success,
        Err(_) => {
            tracing::warn!(target: "judgeval", ?timeout, "span export timed out; batch abandoned");
            false
        }
    }
}
