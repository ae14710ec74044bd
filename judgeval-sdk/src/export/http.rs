//! HTTP OTLP-*shaped* JSON exporter (spec.md §4.E), grounded on
//! `opentelemetry-otlp`'s HTTP exporter for the request shape (POST a batch,
//! bearer-style auth headers) but hand-building `serde_json` types instead
//! of depending on `prost`-generated OTLP protobuf messages, since the
//! backend here speaks JSON, not protobuf (SPEC_FULL.md §4.E).
use super::SpanExporter;
use crate::error::{ExportError, ExportResult};
use crate::resource::Resource;
use crate::trace::SpanData;
use async_trait::async_trait;
use http::{HeaderValue, Method, Request};
use judgeval::attributes::Value as AttrValue;
use judgeval::trace::Status;
use judgeval_http::HttpClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

#[derive(Debug)]
pub struct HttpSpanExporter {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    api_key: String,
    org_id: String,
    project_id: String,
    resource: Resource,
    instrumentation_name: &'static str,
}

impl HttpSpanExporter {
    pub fn new(
        client: Arc<dyn HttpClient>,
        base_url: &str,
        api_key: impl Into<String>,
        org_id: impl Into<String>,
        project_id: impl Into<String>,
        resource: Resource,
        instrumentation_name: &'static str,
    ) -> Self {
        let endpoint = format!("{}/otel/v1/traces", base_url.trim_end_matches('/'));
        HttpSpanExporter {
            client,
            endpoint,
            api_key: api_key.into(),
            org_id: org_id.into(),
            project_id: project_id.into(),
            resource,
            instrumentation_name,
        }
    }
}

#[async_trait]
impl SpanExporter for HttpSpanExporter {
    async fn export(&self, batch: Vec<SpanData>) -> ExportResult {
        let envelope = build_envelope(&self.resource, self.instrumentation_name, &batch);
        let body = serde_json::to_vec(&envelope)?;

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ExportError::InvalidHeader(e.to_string()))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(&self.endpoint)
            .header("content-type", "application/json")
            .header("authorization", auth_value)
            .header("x-organization-id", self.org_id.as_str())
            .header("x-project-id", self.project_id.as_str())
            .body(body)
            .expect("well-formed export request");

        let response = self.client.send(request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ExportError::RejectedStatus(response.status().as_u16()))
        }
    }
}

#[derive(Serialize)]
struct Envelope {
    resource_spans: Vec<ResourceSpans>,
}

#[derive(Serialize)]
struct ResourceSpans {
    resource: ResourceJson,
    scope_spans: Vec<ScopeSpans>,
}

#[derive(Serialize)]
struct ResourceJson {
    attributes: Vec<AttributeJson>,
}

#[derive(Serialize)]
struct ScopeSpans {
    scope: ScopeJson,
    spans: Vec<SpanJson>,
}

#[derive(Serialize)]
struct ScopeJson {
    name: &'static str,
}

#[derive(Serialize)]
struct SpanJson {
    trace_id: String,
    span_id: String,
    parent_span_id: Option<String>,
    name: String,
    start_time_unix_nano: u128,
    end_time_unix_nano: u128,
    attributes: Vec<AttributeJson>,
    events: Vec<EventJson>,
    status: StatusJson,
}

#[derive(Serialize)]
struct EventJson {
    name: String,
    time_unix_nano: u128,
    attributes: Vec<AttributeJson>,
}

#[derive(Serialize)]
struct AttributeJson {
    key: String,
    value: serde_json::Value,
}

#[derive(Serialize)]
struct StatusJson {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn unix_nanos(t: std::time::SystemTime) -> u128 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos()
}

fn attribute_json(value: &AttrValue) -> serde_json::Value {
    value.to_json()
}

fn build_envelope(
    resource: &Resource,
    instrumentation_name: &'static str,
    batch: &[SpanData],
) -> Envelope {
    let spans = batch
        .iter()
        .map(|span| SpanJson {
            trace_id: span.span_context.trace_id().to_string(),
            span_id: span.span_context.span_id().to_string(),
            parent_span_id: span.parent_span_id.map(|id| id.to_string()),
            name: span.name.to_string(),
            start_time_unix_nano: unix_nanos(span.start_time),
            end_time_unix_nano: unix_nanos(span.end_time),
            attributes: span
                .attributes
                .iter()
                .map(|kv| AttributeJson {
                    key: kv.key.to_string(),
                    value: attribute_json(&kv.value),
                })
                .collect(),
            events: span
                .events
                .iter()
                .map(|event| EventJson {
                    name: event.name.to_string(),
                    time_unix_nano: unix_nanos(event.timestamp),
                    attributes: event
                        .attributes
                        .iter()
                        .map(|kv| AttributeJson {
                            key: kv.key.to_string(),
                            value: attribute_json(&kv.value),
                        })
                        .collect(),
                })
                .collect(),
            status: match &span.status {
                Status::Unset | Status::Ok => StatusJson {
                    code: "STATUS_CODE_OK",
                    message: None,
                },
                Status::Error { message } => StatusJson {
                    code: "STATUS_CODE_ERROR",
                    message: Some(message.clone()),
                },
            },
        })
        .collect();

    Envelope {
        resource_spans: vec![ResourceSpans {
            resource: ResourceJson {
                attributes: resource
                    .attributes()
                    .iter()
                    .map(|kv| AttributeJson {
                        key: kv.key.to_string(),
                        value: attribute_json(&kv.value),
                    })
                    .collect(),
            },
            scope_spans: vec![ScopeSpans {
                scope: ScopeJson {
                    name: instrumentation_name,
                },
                spans,
            }],
        }],
    }
}
