//! The opaque scorer contract (spec.md §1 "Deliberately OUT OF SCOPE":
//! "Built-in and prompt scorers... only their external contract — a name +
//! serializable config — matters to the core"). Grounded on how the teacher
//! treats exporters/samplers as boxed values it constructs but never
//! inspects.
use serde::Serialize;
use serde_json::Value;

/// `{name, config}`; judgeval-rust never interprets `config`, only
/// serializes it into an `EvaluationRun` payload.
#[derive(Clone, Debug, Serialize)]
pub struct ScorerConfig {
    pub name: String,
    pub config: Value,
}

impl ScorerConfig {
    pub fn new(name: impl Into<String>, config: impl Serialize) -> Self {
        ScorerConfig {
            name: name.into(),
            config: serde_json::to_value(config).unwrap_or(Value::Null),
        }
    }
}
