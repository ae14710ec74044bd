//! Platform tracer entry points (spec.md §4.I). `init_tracer` wires the full
//! async stack (tokio-friendly `reqwest` client, background batch thread);
//! `init_tracer_blocking` wires the same batch thread design behind
//! `reqwest::blocking`, for short-lived CLI-style programs with no tokio
//! runtime at all. Both resolve the project id exactly once and demote to
//! no-op export on failure (spec.md §4.I/§7), grounded on
//! `opentelemetry-otlp`'s split between its tokio and blocking HTTP
//! exporters.
use crate::api_client::{ApiClient, HttpApiClient};
use crate::config::ConfigBuilder;
use crate::error::ConfigError;
use crate::export::{HttpSpanExporter, SpanExporter};
use crate::resource::Resource;
use crate::trace::{BatchSpanProcessor, NoopSpanProcessor, SdkTracerProvider, SpanProcessor};
use judgeval::attributes::KeyValue;
use judgeval::global::ErasedTracerProvider;
use std::sync::Arc;
use thiserror::Error;

const INSTRUMENTATION_NAME: &str = "judgeval-rust";

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Overrides for `init_tracer`/`init_tracer_blocking`; any field left at its
/// `Default` falls back to the corresponding environment variable (spec.md
/// §6, SPEC_FULL.md §4.M).
#[derive(Clone, Debug)]
pub struct InitOptions {
    pub config: ConfigBuilder,
    pub resource_extras: Vec<KeyValue>,
    pub enable_evaluation: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        InitOptions {
            config: ConfigBuilder::new(),
            resource_extras: Vec::new(),
            enable_evaluation: true,
        }
    }
}

/// Full async platform tracer: a tokio-friendly `reqwest::Client` exporter
/// behind the same background batch thread both entry points share.
pub async fn init_tracer(
    project_name: impl Into<String>,
    options: InitOptions,
) -> Result<SdkTracerProvider, InitError> {
    let project_name = project_name.into();
    let InitOptions {
        config,
        resource_extras,
        enable_evaluation,
    } = options;
    let config = config.build()?;
    let http_client: Arc<dyn judgeval_http::HttpClient> =
        Arc::new(judgeval_http::ReqwestHttpClient::new(reqwest::Client::new()));
    let api_client: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(
        http_client.clone(),
        config.api_url.clone(),
        config.api_key.clone(),
        config.org_id.clone(),
    ));

    let resolved = api_client.projects_resolve(&project_name).await;
    let provider = assemble_provider(
        &project_name,
        resource_extras,
        enable_evaluation,
        config,
        http_client,
        api_client,
        resolved,
    );
    register_globally(&provider);
    Ok(provider)
}

/// `init_tracer`'s blocking sibling: a `reqwest::blocking::Client` exporter,
/// so the calling process never needs a tokio runtime. Project resolution
/// runs synchronously via `futures_executor::block_on`, same as the batch
/// processor's own per-export calls (`trace::batch_processor`).
pub fn init_tracer_blocking(
    project_name: impl Into<String>,
    options: InitOptions,
) -> Result<SdkTracerProvider, InitError> {
    let project_name = project_name.into();
    let InitOptions {
        config,
        resource_extras,
        enable_evaluation,
    } = options;
    let config = config.build()?;
    let http_client: Arc<dyn judgeval_http::HttpClient> = Arc::new(
        judgeval_http::BlockingHttpClient::new(reqwest::blocking::Client::new()),
    );
    let api_client: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(
        http_client.clone(),
        config.api_url.clone(),
        config.api_key.clone(),
        config.org_id.clone(),
    ));

    let resolved = futures_executor::block_on(api_client.projects_resolve(&project_name));
    let provider = assemble_provider(
        &project_name,
        resource_extras,
        enable_evaluation,
        config,
        http_client,
        api_client,
        resolved,
    );
    register_globally(&provider);
    Ok(provider)
}

#[allow(clippy::too_many_arguments)]
fn assemble_provider(
    project_name: &str,
    resource_extras: Vec<KeyValue>,
    enable_evaluation: bool,
    config: crate::config::Config,
    http_client: Arc<dyn judgeval_http::HttpClient>,
    api_client: Arc<dyn ApiClient>,
    resolved: Result<String, crate::api_client::ApiError>,
) -> SdkTracerProvider {
    let resource = Resource::new(project_name.to_string(), resource_extras);

    let mut builder = SdkTracerProvider::builder()
        .with_project_name(project_name.to_string())
        .with_enable_evaluation(enable_evaluation);

    let processor: Arc<dyn SpanProcessor> = match resolved {
        Ok(project_id) => {
            let exporter: Arc<dyn SpanExporter> = Arc::new(HttpSpanExporter::new(
                http_client,
                &config.api_url,
                config.api_key.clone(),
                config.org_id.clone(),
                project_id,
                resource,
                INSTRUMENTATION_NAME,
            ));
            builder = builder.with_api_client(api_client);
            Arc::new(BatchSpanProcessor::new(exporter, Default::default()))
        }
        Err(err) => {
            tracing::warn!(
                target: "judgeval",
                project_name,
                error = %err,
                "failed to resolve project id; tracer will record spans locally but export nothing"
            );
            Arc::new(NoopSpanProcessor)
        }
    };

    builder.with_span_processor(processor).build()
}

fn register_globally(provider: &SdkTracerProvider) {
    let erased: Arc<dyn ErasedTracerProvider> = Arc::new(provider.clone());
    judgeval::global::register_tracer_provider(erased.clone());
    judgeval::global::set_active_tracer_provider(erased);
}
