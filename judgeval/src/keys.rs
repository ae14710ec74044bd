//! Namespaced attribute keys (spec.md §6 — exact strings matter for the
//! backend). Grounded on `opentelemetry-semantic-conventions`'s flat
//! `pub const` module layout, one constant per stable attribute.

/// `judgment.span_kind` — one of `span`, `llm`, `tool`, `chain`.
pub const SPAN_KIND: &str = "judgment.span_kind";
/// `judgment.input` — serialized input recorded via `set_input`/`observe`.
pub const INPUT: &str = "judgment.input";
/// `judgment.output` — serialized output recorded via `set_output`/`observe`.
pub const OUTPUT: &str = "judgment.output";
/// `judgment.customer_id` — inherited by the customer-id lifecycle processor.
pub const CUSTOMER_ID: &str = "judgment.customer_id";
/// `judgment.session_id` — inherited by the session-id lifecycle processor.
pub const SESSION_ID: &str = "judgment.session_id";
/// `judgment.project_id_override` — inherited by the project-override processor.
pub const PROJECT_ID_OVERRIDE: &str = "judgment.project_id_override";
/// `judgment.pending_trace_eval` — serialized `EvaluationRun` awaiting export.
pub const PENDING_TRACE_EVAL: &str = "judgment.pending_trace_eval";

/// Resource attribute keys, carried once per exported batch rather than per
/// span (spec.md §6).
pub mod resource {
    pub const SERVICE_NAME: &str = "service.name";
    pub const SDK_NAME: &str = "telemetry.sdk.name";
    pub const SDK_VERSION: &str = "telemetry.sdk.version";

    /// Fixed value of [`SDK_NAME`] (spec.md §4.E).
    pub const SDK_NAME_VALUE: &str = "judgeval";
}
