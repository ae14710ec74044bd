//! Platform SDK for judgeval: concrete span recording, lifecycle
//! processors, batched export, evaluation submission, and the two
//! `init_tracer`/`init_tracer_blocking` entry points (spec.md §4.D–§4.J).
pub mod api_client;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod id_generator;
pub mod init;
pub mod resource;
pub mod scorer;
pub mod trace;

#[cfg(feature = "testing")]
pub mod testing;

pub use init::{init_tracer, init_tracer_blocking, InitError};
