//! `Example` and `EvaluationRun` (spec.md §3/§4.J), the two payload shapes
//! submitted to the evaluation backend. Grounded on spec.md §6's literal
//! wire-form description (snake_case field names) rather than any teacher
//! type, since OTel has no equivalent concept — the teacher only supplies
//! the *pattern* (treat the payload as an opaque, boxed, externally-defined
//! contract, same as an exporter or sampler it never inspects).
use crate::scorer::ScorerConfig;
use judgeval::trace::{SpanId, TraceId};
use serde::Serialize;
use serde_json::{Map, Value};

/// An opaque input/output bundle submitted for scoring (spec.md §3).
#[derive(Clone, Debug)]
pub struct Example {
    pub example_id: String,
    pub created_at: String,
    pub name: Option<String>,
    pub properties: Map<String, Value>,
}

impl Example {
    /// `example_id`/`created_at` are derived if not supplied; `properties`
    /// values must already be JSON (use [`judgeval::serialize::serialize`]
    /// upstream for non-scalar data).
    pub fn create(properties: Map<String, Value>) -> Self {
        Example {
            example_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            name: None,
            properties,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Flattens `{example_id, created_at, name?}` with `properties` at the
    /// top level (spec.md §8 round-trip law).
    pub fn to_model(&self) -> Value {
        let mut map = Map::new();
        map.insert("example_id".to_string(), Value::String(self.example_id.clone()));
        map.insert("created_at".to_string(), Value::String(self.created_at.clone()));
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        for (k, v) in &self.properties {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

/// The two evaluation-run shapes (spec.md §3).
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum EvaluationRun {
    Example(ExampleEvaluationRun),
    Trace(TraceEvaluationRun),
}

#[derive(Clone, Debug, Serialize)]
pub struct ExampleEvaluationRun {
    pub project_name: String,
    pub eval_name: String,
    pub trace_id: String,
    pub trace_span_id: String,
    pub examples: Vec<Value>,
    pub judgment_scorers: Vec<ScorerConfig>,
    pub custom_scorers: Vec<Value>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TraceEvaluationRun {
    pub project_name: String,
    pub eval_name: String,
    pub trace_and_span_ids: Vec<(String, String)>,
    pub judgment_scorers: Vec<ScorerConfig>,
    pub custom_scorers: Vec<Value>,
    pub is_offline: bool,
}

impl ExampleEvaluationRun {
    /// `evalName = "async_evaluate_" + spanId` (spec.md §4.J).
    pub fn new(
        project_name: impl Into<String>,
        trace_id: TraceId,
        span_id: SpanId,
        example: &Example,
        judgment_scorers: Vec<ScorerConfig>,
    ) -> Self {
        ExampleEvaluationRun {
            project_name: project_name.into(),
            eval_name: format!("async_evaluate_{span_id}"),
            trace_id: trace_id.to_string(),
            trace_span_id: span_id.to_string(),
            examples: vec![example.to_model()],
            judgment_scorers,
            custom_scorers: Vec::new(),
        }
    }
}

impl TraceEvaluationRun {
    /// `evalName = "async_trace_evaluate_" + spanId` (spec.md §4.J).
    pub fn new(
        project_name: impl Into<String>,
        trace_id: TraceId,
        span_id: SpanId,
        judgment_scorers: Vec<ScorerConfig>,
    ) -> Self {
        TraceEvaluationRun {
            project_name: project_name.into(),
            eval_name: format!("async_trace_evaluate_{span_id}"),
            trace_and_span_ids: vec![(trace_id.to_string(), span_id.to_string())],
            judgment_scorers,
            custom_scorers: Vec::new(),
            is_offline: false,
        }
    }
}

