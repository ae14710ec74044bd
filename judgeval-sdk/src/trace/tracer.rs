//! The base tracer (spec.md §4.H): span creation, the `with`/`observe`
//! family, attribute/customer/session shorthands, and evaluation
//! submission (§4.J). Grounded on
//! `opentelemetry-sdk/src/trace/tracer.rs`'s `Tracer` (an instrumentation
//! name plus a handle shared with its provider), adapted so every
//! `SdkTracer` owns cloned `Arc` handles rather than borrowing its
//! provider — required because [`judgeval::trace::Tracer`] returns `Self`
//! by value and must be `'static`.
use super::processor::SpanProcessor;
use super::span::SdkSpan;
use crate::api_client::ApiClient;
use crate::evaluation::{Example, ExampleEvaluationRun, TraceEvaluationRun};
use crate::id_generator::IdGenerator;
use crate::scorer::ScorerConfig;
use judgeval::attributes::{KeyValue, Value as AttrValue};
use judgeval::keys;
use judgeval::trace::{Event, Span, SpanContext, SpanKind, Status, TraceFlags, Tracer};
use judgeval::{Context, FutureExt};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scoped to one instrumentation name; cheap to clone, every clone shares
/// the same processor chain, id generator and root-span counter.
#[derive(Clone)]
pub struct SdkTracer {
    name: &'static str,
    processors: Arc<Vec<Arc<dyn SpanProcessor>>>,
    id_generator: Arc<dyn IdGenerator>,
    default_trace_flags: TraceFlags,
    root_spans_recording: Arc<AtomicUsize>,
    project_name: Arc<str>,
    api_client: Option<Arc<dyn ApiClient>>,
    enable_evaluation: bool,
}

impl fmt::Debug for SdkTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkTracer").field("name", &self.name).finish()
    }
}

impl SdkTracer {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: &'static str,
        processors: Arc<Vec<Arc<dyn SpanProcessor>>>,
        id_generator: Arc<dyn IdGenerator>,
        default_trace_flags: TraceFlags,
        root_spans_recording: Arc<AtomicUsize>,
        project_name: Arc<str>,
        api_client: Option<Arc<dyn ApiClient>>,
        enable_evaluation: bool,
    ) -> Self {
        SdkTracer {
            name,
            processors,
            id_generator,
            default_trace_flags,
            root_spans_recording,
            project_name,
            api_client,
            enable_evaluation,
        }
    }

    /// Starts a span *without* making it active (spec.md §4.H `span`,
    /// "advanced, rarely wanted" — the caller owns `end()`/exception
    /// handling). `parent_cx` defaults to [`Context::current`].
    pub fn span(&self, name: impl Into<Cow<'static, str>>, parent_cx: Option<&Context>) -> SdkSpan {
        let owned;
        let parent_cx = match parent_cx {
            Some(cx) => cx,
            None => {
                owned = Context::current();
                &owned
            }
        };
        Tracer::start(self, name, parent_cx)
    }

    /// Starts, activates, runs `f(span)`, and ends the span on return.
    /// Panics are recorded as an exception event with `ERROR` status and
    /// re-raised after the span is ended (spec.md §4.H `with`).
    pub fn with<F, R>(&self, name: impl Into<Cow<'static, str>>, f: F) -> R
    where
        F: FnOnce(&SdkSpan) -> R,
    {
        let span = self.span(name, None);
        let cx = Context::current().with_span(span.clone());
        let _guard = cx.attach();
        let result = catch_unwind(AssertUnwindSafe(|| f(&span)));
        match result {
            Ok(value) => {
                span.end();
                value
            }
            Err(payload) => {
                record_panic(&span, &payload);
                span.end();
                std::panic::resume_unwind(payload);
            }
        }
    }

    /// `with`'s `Result`-returning sibling: an `Err` is recorded as an
    /// exception and the span is ended with `ERROR` status, then the error
    /// is returned to the caller (spec.md §4.H "record it and set ERROR
    /// status... propagate").
    pub fn with_result<F, T, E>(&self, name: impl Into<Cow<'static, str>>, f: F) -> Result<T, E>
    where
        F: FnOnce(&SdkSpan) -> Result<T, E>,
        E: fmt::Display,
    {
        self.with(name, |span| {
            let result = f(span);
            if let Err(err) = &result {
                span.add_event(Event::exception(err.to_string(), None));
                span.set_status(Status::Error {
                    message: err.to_string(),
                });
            }
            result
        })
    }

    /// Async counterpart of [`SdkTracer::with`]: correctly awaits `f`'s
    /// future before ending the span, keeping the span's `Context`
    /// attached across every `.await` point via
    /// [`judgeval::FutureExt::with_context`].
    pub async fn with_async<F, Fut, R>(&self, name: impl Into<Cow<'static, str>>, f: F) -> R
    where
        F: FnOnce(SdkSpan) -> Fut,
        Fut: Future<Output = R>,
    {
        let span = self.span(name, None);
        let cx = Context::current().with_span(span.clone());
        let result = f(span.clone()).with_context(cx).await;
        span.end();
        result
    }

    /// `with_async`'s `Result`-returning sibling.
    pub async fn with_result_async<F, Fut, T, E>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(SdkSpan) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.with_async(name, |span| async move {
            let result = f(span.clone()).await;
            if let Err(err) = &result {
                span.add_event(Event::exception(err.to_string(), None));
                span.set_status(Status::Error {
                    message: err.to_string(),
                });
            }
            result
        })
        .await
    }

    /// Wraps a synchronous call: starts+activates a span, sets the
    /// span-kind attribute, records `params` (paired with `names`,
    /// positional-index fallback per SPEC_FULL.md §4.H) as the input
    /// attribute, runs `f`, records its serialized return value as the
    /// output attribute, and ends the span (spec.md §4.H `observe`, sync
    /// shape).
    pub fn observe<F, R>(
        &self,
        kind: SpanKind,
        name: impl Into<Cow<'static, str>>,
        names: &'static [&'static str],
        params: &[AttrValue],
        f: F,
    ) -> R
    where
        F: FnOnce() -> R,
        R: Serialize,
    {
        self.with(name, |span| {
            span.set_attribute(KeyValue::new(keys::SPAN_KIND, kind.as_str()));
            set_input(span, names, params);
            let result = f();
            set_output(span, &result);
            result
        })
    }

    /// Async shape of [`SdkTracer::observe`].
    pub async fn observe_async<F, Fut, R>(
        &self,
        kind: SpanKind,
        name: impl Into<Cow<'static, str>>,
        names: &'static [&'static str],
        params: &[AttrValue],
        f: F,
    ) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
        R: Serialize,
    {
        self.with_async(name, |span| async move {
            span.set_attribute(KeyValue::new(keys::SPAN_KIND, kind.as_str()));
            set_input(&span, names, params);
            let result = f().await;
            set_output(&span, &result);
            result
        })
        .await
    }

    /// Iterator shape of `observe`: the span stays open across `next()`
    /// calls and is ended when the iterator is exhausted, matching spec.md
    /// §4.H's "span remains open across iterations" for generator-shaped
    /// wrapped functions. The final output attribute is the last yielded
    /// item.
    pub fn observe_iter<I>(
        &self,
        kind: SpanKind,
        name: impl Into<Cow<'static, str>>,
        names: &'static [&'static str],
        params: &[AttrValue],
        iter: I,
    ) -> ObserveIter<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        let span = self.span(name, None);
        span.set_attribute(KeyValue::new(keys::SPAN_KIND, kind.as_str()));
        set_input(&span, names, params);
        ObserveIter {
            span: Some(span),
            inner: iter.into_iter(),
            last_output: None,
        }
    }

    /// Async-iterator (`Stream`) shape of `observe`.
    pub fn observe_stream<S>(
        &self,
        kind: SpanKind,
        name: impl Into<Cow<'static, str>>,
        names: &'static [&'static str],
        params: &[AttrValue],
        stream: S,
    ) -> ObserveStream<S>
    where
        S: futures_util::Stream,
        S::Item: Serialize,
    {
        let span = self.span(name, None);
        span.set_attribute(KeyValue::new(keys::SPAN_KIND, kind.as_str()));
        set_input(&span, names, params);
        ObserveStream {
            span: Some(span),
            inner: stream,
            last_output: None,
        }
    }

    /// Serializes `data` and attaches it as `judgment.input` on the
    /// currently active span, if any.
    pub fn set_input(&self, data: &impl Serialize) {
        let cx = Context::current();
        if let Some(span) = cx.span() {
            set_output_like(span, keys::INPUT, data);
        }
    }

    /// Serializes `data` and attaches it as `judgment.output` on the
    /// currently active span, if any.
    pub fn set_output(&self, data: &impl Serialize) {
        let cx = Context::current();
        if let Some(span) = cx.span() {
            set_output_like(span, keys::OUTPUT, data);
        }
    }

    /// Attaches `value` to the currently active span. Skips a key that is
    /// empty (spec.md §4.H "validate non-empty key"); scalar values are
    /// stored natively, everything else via
    /// [`judgeval::serialize::serialize`].
    pub fn set_attribute<V: Into<AttrValue>>(&self, key: &'static str, value: V) {
        if key.is_empty() {
            return;
        }
        let cx = Context::current();
        if let Some(span) = cx.span() {
            span.set_attribute(KeyValue::new(key, value.into()));
        }
    }

    /// `set_attribute` for a batch, serializing non-scalar values.
    pub fn set_attributes(&self, attributes: &[(&'static str, &dyn erased_attribute::ToAttribute)]) {
        let cx = Context::current();
        if let Some(span) = cx.span() {
            for (key, value) in attributes {
                if key.is_empty() {
                    continue;
                }
                span.set_attribute(KeyValue::new(*key, value.to_attribute()));
            }
        }
    }

    /// Shorthand setting `judgment.span_kind = "llm"` (spec.md §4.H).
    pub fn set_llm_span(&self) {
        self.set_attribute(keys::SPAN_KIND, SpanKind::Llm.as_str());
    }

    /// Shorthand setting `judgment.span_kind = "tool"`.
    pub fn set_tool_span(&self) {
        self.set_attribute(keys::SPAN_KIND, SpanKind::Tool.as_str());
    }

    /// Shorthand setting `judgment.span_kind = "span"` (the default kind).
    pub fn set_general_span(&self) {
        self.set_attribute(keys::SPAN_KIND, SpanKind::Span.as_str());
    }

    /// Attaches `customer_id` to the currently active, sampled span; child
    /// spans inherit it via [`super::CustomerIdPropagator`] (spec.md §4.H).
    pub fn set_customer_id(&self, customer_id: impl Into<String>) {
        self.set_sampled_attribute(keys::CUSTOMER_ID, customer_id.into());
    }

    /// Attaches `session_id` to the currently active, sampled span; child
    /// spans inherit it via [`super::SessionIdPropagator`].
    pub fn set_session_id(&self, session_id: impl Into<String>) {
        self.set_sampled_attribute(keys::SESSION_ID, session_id.into());
    }

    fn set_sampled_attribute(&self, key: &'static str, value: String) {
        let cx = Context::current();
        if let Some(span) = cx.span() {
            if span.span_context().is_sampled() {
                span.set_attribute(KeyValue::new(key, value));
            }
        }
    }

    /// Example evaluation (spec.md §4.J, flow 1): fire-and-forget. Builds
    /// the run payload and hands it to the API client's
    /// `addToRunEvalQueueExamples`; failures are logged, never surfaced,
    /// and the originating span is unaffected. Silently a no-op unless
    /// evaluation is enabled and the currently active span is sampled.
    pub fn async_evaluate(&self, scorers: Vec<ScorerConfig>, example: Example) {
        if !self.enable_evaluation {
            return;
        }
        let cx = Context::current();
        let Some(span) = cx.span() else {
            return;
        };
        if !span.span_context().is_sampled() {
            return;
        }
        let Some(api_client) = self.api_client.clone() else {
            return;
        };
        let trace_id = span.span_context().trace_id();
        let span_id = span.span_context().span_id();
        let run = ExampleEvaluationRun::new(
            self.project_name.to_string(),
            trace_id,
            span_id,
            &example,
            scorers,
        );
        spawn_enqueue(api_client, run);
    }

    /// Trace evaluation (spec.md §4.J, flow 2): builds the run payload and
    /// attaches it as `judgment.pending_trace_eval` on the currently active
    /// span, for the exporter to carry to the backend. Silently a no-op
    /// unless evaluation is enabled and the span is sampled.
    pub fn async_trace_evaluate(&self, scorers: Vec<ScorerConfig>) {
        if !self.enable_evaluation {
            return;
        }
        let cx = Context::current();
        let Some(span) = cx.span() else {
            return;
        };
        if !span.span_context().is_sampled() {
            return;
        }
        let trace_id = span.span_context().trace_id();
        let span_id = span.span_context().span_id();
        let run = TraceEvaluationRun::new(self.project_name.to_string(), trace_id, span_id, scorers);
        match serde_json::to_string(&run) {
            Ok(json) => span.set_attribute(KeyValue::new(keys::PENDING_TRACE_EVAL, json)),
            Err(err) => tracing::warn!(target: "judgeval", error = %err, "failed to serialize pending trace evaluation"),
        }
    }
}

impl Tracer for SdkTracer {
    type Span = SdkSpan;

    fn start(&self, name: impl Into<Cow<'static, str>>, parent_cx: &Context) -> Self::Span {
        let parent_span_context = parent_cx.span_context();
        let (span_context, parent_span_id, is_root) = if parent_span_context.is_valid() {
            (
                SpanContext::new(
                    parent_span_context.trace_id(),
                    self.id_generator.new_span_id(),
                    parent_span_context.trace_flags(),
                ),
                Some(parent_span_context.span_id()),
                false,
            )
        } else {
            (
                SpanContext::new(
                    self.id_generator.new_trace_id(),
                    self.id_generator.new_span_id(),
                    self.default_trace_flags,
                ),
                None,
                true,
            )
        };

        let root_recording = if is_root {
            Some(self.root_spans_recording.clone())
        } else {
            None
        };
        if is_root {
            self.root_spans_recording.fetch_add(1, Ordering::AcqRel);
        }

        let span = SdkSpan::start(
            name,
            span_context,
            parent_span_id,
            self.name,
            self.processors.clone(),
            root_recording,
        );
        for processor in self.processors.iter() {
            processor.on_start(&span, parent_cx);
        }
        span
    }
}

fn record_panic(span: &SdkSpan, payload: &(dyn std::any::Any + Send)) {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic of unknown type".to_string()
    };
    span.add_event(Event::exception(message.clone(), None));
    span.set_status(Status::Error { message });
}

fn set_output_like(span: &Arc<dyn Span>, key: &'static str, data: &impl Serialize) {
    match judgeval::serialize::serialize(data) {
        Ok(json) => span.set_attribute(KeyValue::new(key, json)),
        Err(err) => {
            tracing::warn!(target: "judgeval", error = %err, key, "failed to serialize attribute");
            span.add_event(Event::exception(err.to_string(), None));
            span.set_status(Status::Error {
                message: err.to_string(),
            });
        }
    }
}

fn set_input(span: &SdkSpan, names: &'static [&'static str], params: &[AttrValue]) {
    let mut object = serde_json::Map::with_capacity(params.len());
    for (i, value) in params.iter().enumerate() {
        let key = names.get(i).map(|s| s.to_string()).unwrap_or_else(|| format!("arg{i}"));
        object.insert(key, value.to_json());
    }
    span.set_attribute(KeyValue::new(
        keys::INPUT,
        serde_json::Value::Object(object).to_string(),
    ));
}

fn set_output<R: Serialize>(span: &SdkSpan, result: &R) {
    match judgeval::serialize::serialize(result) {
        Ok(json) => span.set_attribute(KeyValue::new(keys::OUTPUT, json)),
        Err(err) => {
            tracing::warn!(target: "judgeval", error = %err, "failed to serialize observe output");
            span.add_event(Event::exception(err.to_string(), None));
            span.set_status(Status::Error {
                message: err.to_string(),
            });
        }
    }
}

fn spawn_enqueue(api_client: Arc<dyn ApiClient>, run: ExampleEvaluationRun) {
    std::thread::spawn(move || {
        if let Err(err) = futures_executor::block_on(api_client.add_to_run_eval_queue_examples(&run)) {
            tracing::warn!(target: "judgeval", error = %err, "failed to enqueue example evaluation");
        }
    });
}

/// Returned by [`SdkTracer::observe_iter`]. Keeps the wrapped span open
/// across iterations; ends it (recording the last yielded item as the
/// output attribute) once the inner iterator is exhausted or dropped
/// before exhaustion.
///
/// The last item is serialized eagerly in `next()` rather than kept as
/// `I::Item` and serialized in `Drop`: a `Drop` impl may not impose trait
/// bounds beyond the struct's own generic bounds (E0367), and the struct
/// only bounds `I: Iterator`, not `I::Item: Serialize`.
pub struct ObserveIter<I: Iterator> {
    span: Option<SdkSpan>,
    inner: I,
    last_output: Option<String>,
}

impl<I: Iterator> Iterator for ObserveIter<I>
where
    I::Item: Serialize,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(span) = &self.span else { return None };
        let cx = Context::current().with_span(span.clone());
        let _guard = cx.attach();
        match self.inner.next() {
            Some(item) => {
                match judgeval::serialize::serialize(&item) {
                    Ok(json) => self.last_output = Some(json),
                    Err(err) => {
                        tracing::warn!(target: "judgeval", error = %err, "failed to serialize observe output");
                        span.add_event(Event::exception(err.to_string(), None));
                        span.set_status(Status::Error {
                            message: err.to_string(),
                        });
                    }
                }
                Some(item)
            }
            None => {
                self.end();
                None
            }
        }
    }
}

impl<I: Iterator> ObserveIter<I> {
    fn end(&mut self) {
        if let Some(span) = self.span.take() {
            if let Some(json) = self.last_output.take() {
                span.set_attribute(KeyValue::new(keys::OUTPUT, json));
            }
            span.end();
        }
    }
}

impl<I: Iterator> Drop for ObserveIter<I> {
    fn drop(&mut self) {
        self.end();
    }
}

/// `Stream` counterpart of [`ObserveIter`]. As with `ObserveIter`, the last
/// yielded item is serialized eagerly in `poll_next` rather than kept as
/// `S::Item` and serialized in `Drop`, since a `Drop` impl cannot impose a
/// `Serialize` bound the struct itself doesn't declare.
pub struct ObserveStream<S> {
    span: Option<SdkSpan>,
    inner: S,
    last_output: Option<String>,
}

impl<S> futures_util::Stream for ObserveStream<S>
where
    S: futures_util::Stream + Unpin,
    S::Item: Serialize,
{
    type Item = S::Item;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use futures_util::Stream;
        // `S: Unpin` makes `ObserveStream<S>: Unpin`, so this is a plain
        // `&mut Self` behind the `Pin` wrapper.
        let this = self.get_mut();
        let Some(span) = this.span.clone() else {
            return std::task::Poll::Ready(None);
        };
        let guard_cx = Context::current().with_span(span);
        let _guard = guard_cx.attach();
        match std::pin::Pin::new(&mut this.inner).poll_next(cx) {
            std::task::Poll::Ready(Some(item)) => {
                match judgeval::serialize::serialize(&item) {
                    Ok(json) => this.last_output = Some(json),
                    Err(err) => {
                        tracing::warn!(target: "judgeval", error = %err, "failed to serialize observe output");
                        if let Some(span) = &this.span {
                            span.add_event(Event::exception(err.to_string(), None));
                            span.set_status(Status::Error {
                                message: err.to_string(),
                            });
                        }
                    }
                }
                std::task::Poll::Ready(Some(item))
            }
            std::task::Poll::Ready(None) => {
                this.end();
                std::task::Poll::Ready(None)
            }
            std::task::Poll::Pending => std::task::Poll::Pending,
        }
    }
}

impl<S> ObserveStream<S> {
    fn end(&mut self) {
        if let Some(span) = self.span.take() {
            if let Some(json) = self.last_output.take() {
                span.set_attribute(KeyValue::new(keys::OUTPUT, json));
            }
            span.end();
        }
    }
}

impl<S> Drop for ObserveStream<S> {
    fn drop(&mut self) {
        self.end();
    }
}

/// Minimal erasure so [`SdkTracer::set_attributes`] can accept a
/// heterogeneous batch of scalar and non-scalar values in one call.
pub mod erased_attribute {
    use judgeval::attributes::Value;
    use serde::Serialize;

    pub trait ToAttribute {
        fn to_attribute(&self) -> Value;
    }

    impl<T: Serialize> ToAttribute for T {
        fn to_attribute(&self) -> Value {
            match serde_json::to_value(self) {
                Ok(serde_json::Value::Bool(b)) => Value::Bool(b),
                Ok(serde_json::Value::Number(n)) if n.is_i64() => Value::I64(n.as_i64().unwrap()),
                Ok(serde_json::Value::Number(n)) => Value::F64(n.as_f64().unwrap_or_default()),
                Ok(serde_json::Value::String(s)) => Value::String(s.into()),
                Ok(other) => Value::String(other.to_string().into()),
                Err(_) => Value::String("<unserializable>".into()),
            }
        }
    }
}
