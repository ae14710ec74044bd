//! The backend API client (spec.md §1 "Deliberately OUT OF SCOPE": "treated
//! as a blackbox that exposes `projectsResolve`, `addToRunEvalQueueExamples`,
//! and an OTLP-compatible trace endpoint"). Only the two non-export methods
//! live here: trace export goes through `export::HttpSpanExporter`.
use crate::evaluation::ExampleEvaluationRun;
use async_trait::async_trait;
use judgeval_http::HttpClient;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport error: {0}")]
    Transport(#[from] judgeval_http::HttpError),
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("request rejected with status {0}")]
    RejectedStatus(u16),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The two backend calls the core makes outside of trace export (spec.md
/// §6): resolving a project name to an id, and enqueueing an example
/// evaluation run.
#[async_trait]
pub trait ApiClient: Send + Sync + fmt::Debug {
    async fn projects_resolve(&self, project_name: &str) -> Result<String, ApiError>;
    async fn add_to_run_eval_queue_examples(
        &self,
        run: &ExampleEvaluationRun,
    ) -> Result<(), ApiError>;
}

#[derive(Debug)]
pub struct HttpApiClient {
    client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
    org_id: String,
}

impl HttpApiClient {
    pub fn new(
        client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        org_id: impl Into<String>,
    ) -> Self {
        HttpApiClient {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            org_id: org_id.into(),
        }
    }

    fn auth_headers(&self, builder: http::request::Builder) -> http::request::Builder {
        builder
            .header("content-type", "application/json")
            .header(
                "authorization",
                format!("Bearer {}", self.api_key),
            )
            .header("x-organization-id", self.org_id.as_str())
    }
}

#[derive(Deserialize)]
struct ProjectResolveResponse {
    project_id: String,
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn projects_resolve(&self, project_name: &str) -> Result<String, ApiError> {
        let body = serde_json::to_vec(&serde_json::json!({ "project_name": project_name }))?;
        let request = self
            .auth_headers(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri(format!("{}/v1/projects/resolve", self.base_url.trim_end_matches('/'))),
            )
            .body(body)
            .expect("well-formed projects/resolve request");
        let response = self.client.send(request).await?;
        if response.status().as_u16() == 404 {
            return Err(ApiError::ProjectNotFound(project_name.to_string()));
        }
        if !response.status().is_success() {
            return Err(ApiError::RejectedStatus(response.status().as_u16()));
        }
        let parsed: ProjectResolveResponse = serde_json::from_slice(response.body())?;
        Ok(parsed.project_id)
    }

    async fn add_to_run_eval_queue_examples(
        &self,
        run: &ExampleEvaluationRun,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_vec(run)?;
        let request = self
            .auth_headers(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri(format!("{}/v1/eval/queue/examples", self.base_url.trim_end_matches('/'))),
            )
            .body(body)
            .expect("well-formed eval/queue/examples request");
        let response = self.client.send(request).await?;
        if !response.status().is_success() {
            return Err(ApiError::RejectedStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
