//! Core API crate for judgeval: context propagation, span/tracer vocabulary,
//! attribute types and the process-wide tracer provider proxy. Mirrors the
//! `opentelemetry` (api) / `opentelemetry_sdk` split — this crate has no
//! knowledge of batching, export, or the judgeval backend; `judgeval-sdk`
//! supplies all of that behind the traits declared here.

pub mod attributes;
mod context;
pub mod global;
pub mod keys;
pub mod serialize;
pub mod trace;

pub use context::{Context, ContextGuard, FutureExt, WithContext};
