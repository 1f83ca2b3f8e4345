//! Orchestrator: resolves requested units, runs them under a bounded worker
//! pool, persists the run and renders its charts.
use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::error::StatrunError;
use crate::record::{Graphic, GraphicOutcome, MethodRequest, Params, Record, ResultEntry};
use crate::registry::{ChartRegistry, MethodRegistry};
use crate::store::{RunStore, SavedRun};
use crate::unit::UnitInput;
use serde_json::Value;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, error, info, info_span, warn, Instrument};

pub struct Orchestrator {
    config: EngineConfig,
    methods: Arc<MethodRegistry>,
    charts: Arc<ChartRegistry>,
    store: RunStore,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, methods: MethodRegistry, charts: ChartRegistry) -> Self {
        let store = RunStore::new(config.results_root.clone());
        Self {
            config,
            methods: Arc::new(methods),
            charts: Arc::new(charts),
            store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn charts(&self) -> &ChartRegistry {
        &self.charts
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    /// Handle one record in place: fill `results`, persist a snapshot, then
    /// replace `graphics` with render outcomes.
    ///
    /// Per-unit failures become entries. Only persistence errors are
    /// returned, in which case `graphics` is left untouched.
    pub async fn handle(&self, record: &mut Record) -> Result<SavedRun, StatrunError> {
        let ctx = RunContext::for_record(record);
        let span = info_span!("statrun.handle", run_id = %ctx.run_id, dataset = %ctx.dataset_key);
        self.run(record, &ctx).instrument(span).await
    }

    /// Blocking wrapper around [`Orchestrator::handle`] on a private runtime.
    /// Must not be called from inside an async context.
    pub fn handle_blocking(&self, record: &mut Record) -> Result<SavedRun, StatrunError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.config.workers())
            .enable_all()
            .build()
            .map_err(|e| StatrunError::Runtime(e.to_string()))?;
        let outcome = runtime.block_on(self.handle(record));
        // a timed-out unit may still occupy a blocking thread
        runtime.shutdown_background();
        outcome
    }

    async fn run(&self, record: &mut Record, ctx: &RunContext) -> Result<SavedRun, StatrunError> {
        let requests = record.method_requests();
        info!(
            methods = requests.len(),
            skipped = record.methods.len() - requests.len(),
            graphics = record.graphics.len(),
            "handling request"
        );

        let results = self.compute(record, &requests).await;
        record.results = results;
        record.summary_text = record.summarize();

        let saved = self.store.save(record).map_err(|e| {
            error!(error = %e, "failed to persist run");
            e
        })?;
        info!(snapshot = %saved.snapshot.display(), digest = %saved.digest, "run persisted");

        let graphics = std::mem::take(&mut record.graphics);
        let outcomes = self.render(graphics, record, &saved.folder).await;
        record.graphics = outcomes;

        let failed = record.results.iter().filter(|r| !r.ok).count();
        info!(failed, elapsed_ms = ctx.elapsed_ms(), "request handled");
        Ok(saved)
    }

    /// One task per request, at most `max_workers` computing at once.
    /// Entries come back in request order whatever the completion order.
    async fn compute(&self, record: &Record, requests: &[MethodRequest]) -> Vec<ResultEntry> {
        let permits = Arc::new(Semaphore::new(self.config.workers()));
        let timeout = self.config.unit_timeout();

        let inputs = record.inputs();
        let mut tasks = Vec::with_capacity(requests.len());
        for request in requests {
            let input = UnitInput {
                id: request.id.clone(),
                data: inputs.data(&request.id),
                metadata: inputs.metadata(&request.id),
                params: request.params.clone(),
            };
            let task = tokio::spawn(
                dispatch(self.methods.clone(), permits.clone(), input, timeout).in_current_span(),
            );
            tasks.push((request, task));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (request, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(err) => Err(join_message(err)),
            };
            let entry = outcome.unwrap_or_else(|message| {
                warn!(method = %request.id, error = %message, "method failed unexpectedly");
                ResultEntry::failure(&request.id, message, request.params.clone())
            });
            results.push(entry);
        }
        results
    }

    /// Render charts one at a time into the results folder.
    async fn render(&self, graphics: Vec<Graphic>, record: &Record, folder: &Path) -> Vec<Graphic> {
        let inputs = record.inputs();
        let (data, metadata) = (inputs.shared_data(), inputs.shared_metadata());

        let mut outcomes = Vec::with_capacity(graphics.len());
        for graphic in graphics {
            let request = graphic.into_request();
            let params = relocate(request.params, folder);
            let chart_type = request.chart_type;

            let found = chart_type
                .as_deref()
                .and_then(|t| self.charts.lookup(t).map(|ctor| (t.to_string(), ctor)));
            let outcome = match found {
                Some((id, ctor)) => {
                    let input = UnitInput {
                        id,
                        data: data.clone(),
                        metadata: metadata.clone(),
                        params: params.clone(),
                    };
                    match tokio::task::spawn_blocking(move || ctor(input).create_graphic()).await {
                        Ok(outcome) => outcome,
                        Err(err) => GraphicOutcome::failure(chart_type, join_message(err), params),
                    }
                }
                None => GraphicOutcome::not_found(chart_type, params),
            };

            if outcome.ok {
                debug!(chart = ?outcome.chart_type, path = ?outcome.path, "chart rendered");
            } else {
                warn!(chart = ?outcome.chart_type, error = ?outcome.error, "chart failed");
            }
            outcomes.push(Graphic::Outcome(outcome));
        }
        outcomes
    }
}

/// Look up and run one method. `Err` carries the message of a panic or a
/// timeout; expected failures are already entries.
async fn dispatch(
    methods: Arc<MethodRegistry>,
    permits: Arc<Semaphore>,
    input: UnitInput,
    timeout: Option<Duration>,
) -> Result<ResultEntry, String> {
    let Some(ctor) = methods.lookup(&input.id) else {
        warn!(method = %input.id, "method not found");
        return Ok(ResultEntry::not_found(&input.id, input.params));
    };

    let permit = permits
        .acquire_owned()
        .await
        .map_err(|_| "worker pool closed".to_string())?;
    let id = input.id.clone();
    debug!(method = %id, "computing");

    let work = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        ctor(input).compute()
    });
    let joined = match timeout {
        None => work.await,
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| format!("Method {} timed out after {} ms.", id, limit.as_millis()))?,
    };
    joined.map_err(join_message)
}

/// Keep only the file name of the requested path and place it in `folder`.
/// A path without a file name is dropped so the chart fails closed.
fn relocate(mut params: Params, folder: &Path) -> Params {
    let Some(original) = params.get("path").and_then(Value::as_str).map(str::to_owned) else {
        return params;
    };
    match Path::new(&original).file_name() {
        Some(name) => {
            let target = folder.join(name);
            params.insert("path".to_string(), Value::String(target.to_string_lossy().into_owned()));
        }
        None => {
            params.remove("path");
        }
    }
    params
}

fn join_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        err.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unit panicked".to_string()
    }
}
