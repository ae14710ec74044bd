//! Random trace/span id generation, grounded on
//! `opentelemetry-sdk/src/trace/id_generator/mod.rs`'s `RandomIdGenerator`.
use judgeval::trace::{SpanId, TraceId};
use rand::Rng;
use std::fmt;

pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn new_trace_id(&self) -> TraceId;
    fn new_span_id(&self) -> SpanId;
}

#[derive(Clone, Debug, Default)]
pub struct RandomIdGenerator {
    _private: (),
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        TraceId::from_bytes(rand::rng().random::<u128>().to_be_bytes())
    }

    fn new_span_id(&self) -> SpanId {
        SpanId::from_bytes(rand::rng().random::<u64>().to_be_bytes())
    }
}
