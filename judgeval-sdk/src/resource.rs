//! Resource attributes carried once per exported batch (spec.md §6),
//! grounded on the teacher's `Resource` type (`opentelemetry-sdk`) but kept
//! as a flat `Vec<KeyValue>` builder since judgeval has no resource-merge
//! semantics across multiple SDKs to worry about.
use judgeval::attributes::KeyValue;
use judgeval::keys::resource::{SDK_NAME, SDK_NAME_VALUE, SDK_VERSION, SERVICE_NAME};

/// `service.name`, `telemetry.sdk.name`, `telemetry.sdk.version`, plus any
/// user-supplied extras (spec.md §4.I, §6).
#[derive(Clone, Debug)]
pub struct Resource {
    attributes: Vec<KeyValue>,
}

impl Resource {
    pub fn new(project_name: impl Into<String>, extras: Vec<KeyValue>) -> Self {
        let mut attributes = vec![
            KeyValue::new(SERVICE_NAME, project_name.into()),
            KeyValue::new(SDK_NAME, SDK_NAME_VALUE),
            KeyValue::new(SDK_VERSION, env!("CARGO_PKG_VERSION")),
        ];
        attributes.extend(extras);
        Resource { attributes }
    }

    pub fn attributes(&self) -> &[KeyValue] {
        &self.attributes
    }
}
