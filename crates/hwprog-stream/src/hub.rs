use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::consumer::StreamConsumer;
use crate::dispatch::StreamSummary;
use crate::error::StreamError;
use crate::form::FormData;
use crate::handler::RecordHandler;
use crate::shared::{Guarded, Shared};
use crate::sink::OutputSink;

type BoxedSink = Box<dyn OutputSink + Send>;
type BoxedHandler = Box<dyn RecordHandler + Send>;

/// Result of one finished submission task.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub form_id: String,
    pub submission_id: Uuid,
    pub result: Result<StreamSummary, StreamError>,
    generation: u64,
}

struct Binding {
    endpoint: String,
    sink: Shared<BoxedSink>,
    handler: Shared<BoxedHandler>,
    generation: Arc<AtomicU64>,
    in_flight: Option<AbortHandle>,
}

/// Forms attached to streaming endpoints, each submission running as its own task.
///
/// Submitting a form that is still streaming cancels the earlier submission
/// and restarts with a cleared output. Finished tasks are collected on every
/// submit and only the newest outcome per form is kept until `join_all`.
pub struct StreamHub {
    client: Client,
    bindings: HashMap<String, Binding>,
    tasks: JoinSet<SubmissionOutcome>,
    finished: HashMap<String, SubmissionOutcome>,
}

impl StreamHub {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            bindings: HashMap::new(),
            tasks: JoinSet::new(),
            finished: HashMap::new(),
        }
    }

    /// Registers `form_id` to post to `endpoint`. Log text goes to `sink`;
    /// every record also reaches `handler` when one is given.
    pub fn attach<S, H>(
        &mut self,
        form_id: &str,
        endpoint: impl Into<String>,
        sink: S,
        handler: Option<H>,
    ) where
        S: OutputSink + Send + 'static,
        H: RecordHandler + Send + 'static,
    {
        let binding = Binding {
            endpoint: endpoint.into(),
            sink: Shared::new(Box::new(sink) as BoxedSink),
            handler: Shared::new(Box::new(handler) as BoxedHandler),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
        };
        if let Some(previous) = self.bindings.insert(form_id.to_string(), binding) {
            if let Some(handle) = previous.in_flight {
                handle.abort();
            }
        }
    }

    pub fn is_attached(&self, form_id: &str) -> bool {
        self.bindings.contains_key(form_id)
    }

    pub fn is_in_flight(&self, form_id: &str) -> bool {
        self.bindings
            .get(form_id)
            .and_then(|binding| binding.in_flight.as_ref())
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Tasks still held by the hub, running or finished but not yet collected.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Starts streaming `form` to the endpoint attached as `form_id`.
    pub fn submit(&mut self, form_id: &str, form: FormData) -> Result<Uuid, StreamError> {
        let binding = self
            .bindings
            .get_mut(form_id)
            .ok_or_else(|| StreamError::UnknownForm(form_id.to_string()))?;

        let generation = binding.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(handle) = binding.in_flight.take() {
            if !handle.is_finished() {
                info!(form_id, "cancelling in-flight submission");
            }
            handle.abort();
        }

        let submission_id = Uuid::new_v4();
        let sink = Guarded::new(
            binding.sink.clone(),
            Arc::clone(&binding.generation),
            generation,
        );
        let handler = Guarded::new(
            binding.handler.clone(),
            Arc::clone(&binding.generation),
            generation,
        );
        let consumer = StreamConsumer::with_client(self.client.clone(), binding.endpoint.clone());
        let form_id_owned = form_id.to_string();

        debug!(form_id, %submission_id, generation, "spawning submission");
        let abort = self.tasks.spawn(async move {
            let mut error_sink = sink.clone();
            let result = consumer.submit(&form, sink, handler).await;
            if let Err(err) = &result {
                warn!(form_id = %form_id_owned, %submission_id, "stream error: {err}");
                error_sink.append(&format!("\nstream error: {err}\n"));
                error_sink.scroll_to_end();
            }
            SubmissionOutcome {
                form_id: form_id_owned,
                submission_id,
                result,
                generation,
            }
        });
        binding.in_flight = Some(abort);
        self.reap_finished();
        Ok(submission_id)
    }

    /// Waits for every running submission and returns the newest outcome of
    /// each form. Cancelled submissions are left out.
    pub async fn join_all(&mut self) -> Vec<SubmissionOutcome> {
        while let Some(joined) = self.tasks.join_next().await {
            self.keep_outcome(joined);
        }
        self.finished.drain().map(|(_, outcome)| outcome).collect()
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            self.keep_outcome(joined);
        }
    }

    fn keep_outcome(&mut self, joined: Result<SubmissionOutcome, JoinError>) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => {
                debug!("submission cancelled");
                return;
            }
            Err(err) => {
                warn!("submission task failed: {err}");
                return;
            }
        };
        match self.finished.get(&outcome.form_id) {
            Some(kept) if kept.generation > outcome.generation => {
                debug!(
                    form_id = %outcome.form_id,
                    submission_id = %outcome.submission_id,
                    "dropping superseded outcome"
                );
            }
            _ => {
                self.finished.insert(outcome.form_id.clone(), outcome);
            }
        }
    }
}
