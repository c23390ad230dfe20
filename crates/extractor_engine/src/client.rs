use std::future::Future;
use std::sync::mpsc;
use std::time::Duration;

use bytes::Bytes;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn, redact_url};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::format::format_places;
use crate::ndjson::StreamBuffer;
use crate::places::{ApiResponse, PlaceRecord, PollContext, PollState, RunData};
use crate::progress::progress_at;
use crate::{
    ClientSettings, EngineEvent, FailureKind, JobEvent, JobId, JobMode, JobOutcome, JobRequest,
};

const START_STEP: usize = 0;
const WAIT_STEP: usize = 1;
const FETCH_STEP: usize = 2;

/// Request steps advance by this much per tick and stay at or below the cap
/// until the response arrives.
const REQUEST_PROGRESS_STEP: u8 = 10;
const REQUEST_PROGRESS_CAP: u8 = 90;
const MIN_TICK: Duration = Duration::from_millis(1);

pub trait EventSink: Send + Sync {
    fn emit(&self, event: JobEvent);
}

/// Tags events with their job id and forwards them over a channel.
pub struct ChannelEventSink {
    job_id: JobId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(job_id: JobId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { job_id, tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: JobEvent) {
        let _ = self.tx.send(EngineEvent {
            job_id: self.job_id,
            event,
        });
    }
}

/// Runs one job to its outcome. Implementations emit every non-terminal event
/// to `sink`; the terminal `JobCompleted`/`JobFailed` is left to the caller.
#[async_trait::async_trait]
pub trait JobRunner: Send + Sync {
    async fn execute(
        &self,
        request: &JobRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FailureKind>;
}

#[derive(Debug, Clone)]
pub struct JobClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl JobClient {
    pub fn new(settings: ClientSettings) -> Result<Self, FailureKind> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| {
            engine_error!("Failed to build HTTP client: {}", err);
            FailureKind::Connection
        })?;
        Ok(Self { http, settings })
    }

    /// Runs `request` in its mode and finishes with exactly one terminal event.
    pub async fn run(
        &self,
        request: &JobRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FailureKind> {
        let result = self.execute(request, sink, cancel).await;
        emit_terminal(&result, sink);
        result
    }

    pub async fn run_streaming(
        &self,
        request: &JobRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FailureKind> {
        let result = self.stream_job(request, sink, cancel).await;
        emit_terminal(&result, sink);
        result
    }

    pub async fn run_polling(
        &self,
        request: &JobRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FailureKind> {
        let result = self.poll_job(request, sink, cancel).await;
        emit_terminal(&result, sink);
        result
    }

    async fn stream_job(
        &self,
        request: &JobRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FailureKind> {
        let url = parse_endpoint(&request.endpoint)?;
        engine_info!("POST {} (stream)", redact_url(&url));

        let response = cancellable(cancel, self.http.post(url).json(&request.payload).send())
            .await?
            .map_err(map_transport_error)?;

        let status = response.status();
        engine_info!("Stream response status {}", status);
        if !status.is_success() {
            let body = cancellable(cancel, response.text())
                .await?
                .unwrap_or_default();
            return Err(FailureKind::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let mut buffer = StreamBuffer::new();
        let mut text = String::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = cancellable(cancel, stream.next()).await? {
            let chunk: Bytes = chunk.map_err(map_transport_error)?;
            for content in buffer.push(&chunk) {
                append_content(&mut text, content, sink);
            }
        }
        if let Some(content) = buffer.finish() {
            append_content(&mut text, content, sink);
        }

        engine_info!("Stream complete ({} chars)", text.chars().count());
        Ok(JobOutcome {
            final_text: text,
            result_count: None,
        })
    }

    async fn poll_job(
        &self,
        request: &JobRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FailureKind> {
        let started = Instant::now();
        let context = PollContext::from_payload(&request.payload);
        let mut state = PollState::new(self.settings.poll_wait);

        sink.emit(JobEvent::StepStarted {
            step_index: START_STEP,
        });
        let run = self
            .with_request_progress(START_STEP, self.start_run(request, cancel), sink)
            .await?;
        engine_info!(
            "Crawl run started: {} (status {}, dataset {})",
            run.id,
            run.status.as_deref().unwrap_or("unknown"),
            run.default_dataset_id.as_deref().unwrap_or("unknown")
        );
        state.run_id = Some(run.id);
        sink.emit(JobEvent::StepCompleted {
            step_index: START_STEP,
            summary: Some(context.start_summary()),
        });

        sink.emit(JobEvent::StepStarted {
            step_index: WAIT_STEP,
        });
        self.wait_with_progress(WAIT_STEP, state.wait_budget, sink, cancel)
            .await?;
        sink.emit(JobEvent::StepCompleted {
            step_index: WAIT_STEP,
            summary: None,
        });

        sink.emit(JobEvent::StepStarted {
            step_index: FETCH_STEP,
        });
        let run_id = state.run_id.as_deref().unwrap_or_default();
        let records = self
            .with_request_progress(FETCH_STEP, self.fetch_items(run_id, cancel), sink)
            .await?;
        state.result_count = Some(records.len());

        let elapsed = started.elapsed();
        engine_info!(
            "Fetched {} results for run {} in {:.1}s",
            records.len(),
            run_id,
            elapsed.as_secs_f64()
        );
        let final_text = format_places(&context, &records, elapsed);
        sink.emit(JobEvent::StepCompleted {
            step_index: FETCH_STEP,
            summary: Some(format!(
                "{} results processed | elapsed {:.1} s",
                records.len(),
                elapsed.as_secs_f64()
            )),
        });

        Ok(JobOutcome {
            final_text,
            result_count: state.result_count,
        })
    }

    async fn start_run(
        &self,
        request: &JobRequest,
        cancel: &CancellationToken,
    ) -> Result<RunData, FailureKind> {
        let url = self.with_token(parse_endpoint(&request.endpoint)?);
        engine_info!("POST {} (start run)", redact_url(&url));

        let response = cancellable(cancel, self.http.post(url).json(&request.payload).send())
            .await?
            .map_err(|err| FailureKind::StartError(err.without_url().to_string()))?;

        let status = response.status();
        engine_info!("Start response status {}", status);
        if !status.is_success() {
            let body = cancellable(cancel, response.text())
                .await?
                .unwrap_or_default();
            engine_warn!("Failed to start crawl: {}", body);
            return Err(FailureKind::StartError(format!("status {}", status.as_u16())));
        }

        let body: ApiResponse<RunData> = cancellable(cancel, response.json())
            .await?
            .map_err(|err| {
                FailureKind::StartError(format!("unexpected response: {}", err.without_url()))
            })?;
        Ok(body.data)
    }

    async fn wait_with_progress(
        &self,
        step_index: usize,
        budget: Duration,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<(), FailureKind> {
        engine_debug!("Waiting {:?} for the crawl to finish", budget);
        let started = Instant::now();
        let deadline = tokio::time::sleep_until(started + budget);
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval(self.settings.progress_tick.max(MIN_TICK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last = 0u8;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FailureKind::Cancelled),
                _ = &mut deadline => break,
                _ = ticker.tick() => {
                    last = last.max(progress_at(started.elapsed(), budget));
                    sink.emit(JobEvent::StepProgress { step_index, percent: last });
                }
            }
        }

        sink.emit(JobEvent::StepProgress {
            step_index,
            percent: 100,
        });
        Ok(())
    }

    /// Drives `request` while reporting capped progress on `step_index`.
    async fn with_request_progress<F: Future>(
        &self,
        step_index: usize,
        request: F,
        sink: &dyn EventSink,
    ) -> F::Output {
        tokio::pin!(request);
        let mut ticker = tokio::time::interval(self.settings.progress_tick.max(MIN_TICK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut percent = 0u8;
        loop {
            tokio::select! {
                biased;
                output = &mut request => return output,
                _ = ticker.tick() => {
                    if percent < REQUEST_PROGRESS_CAP {
                        percent = (percent + REQUEST_PROGRESS_STEP).min(REQUEST_PROGRESS_CAP);
                        sink.emit(JobEvent::StepProgress { step_index, percent });
                    }
                }
            }
        }
    }

    async fn fetch_items(
        &self,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlaceRecord>, FailureKind> {
        let url = self.results_url(run_id)?;
        engine_info!("GET {} (results)", redact_url(&url));

        let response = cancellable(cancel, self.http.get(url).send())
            .await?
            .map_err(|err| FailureKind::FetchError(err.without_url().to_string()))?;

        let status = response.status();
        engine_info!("Results response status {}", status);
        if !status.is_success() {
            let body = cancellable(cancel, response.text())
                .await?
                .unwrap_or_default();
            engine_warn!("Failed to get results: {}", body);
            return Err(FailureKind::FetchError(format!("status {}", status.as_u16())));
        }

        let items: Vec<Value> = cancellable(cancel, response.json())
            .await?
            .map_err(|err| {
                FailureKind::FetchError(format!("unexpected response: {}", err.without_url()))
            })?;

        Ok(items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).unwrap_or_else(|err| {
                    engine_warn!("Result {} has an unexpected shape: {}", index, err);
                    PlaceRecord::default()
                })
            })
            .collect())
    }

    fn results_url(&self, run_id: &str) -> Result<Url, FailureKind> {
        let mut url = Url::parse(&self.settings.api_base).map_err(|_| FailureKind::InvalidUrl)?;
        url.path_segments_mut()
            .map_err(|_| FailureKind::InvalidUrl)?
            .pop_if_empty()
            .extend(["actor-runs", run_id, "dataset", "items"]);
        Ok(self.with_token(url))
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = self.settings.api_token.as_deref() {
            url.query_pairs_mut().append_pair("token", token);
        }
        url
    }
}

#[async_trait::async_trait]
impl JobRunner for JobClient {
    async fn execute(
        &self,
        request: &JobRequest,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, FailureKind> {
        match request.mode {
            JobMode::Stream => self.stream_job(request, sink, cancel).await,
            JobMode::Poll => self.poll_job(request, sink, cancel).await,
        }
    }
}

pub(crate) fn emit_terminal(result: &Result<JobOutcome, FailureKind>, sink: &dyn EventSink) {
    match result {
        Ok(outcome) => sink.emit(JobEvent::JobCompleted {
            final_text: outcome.final_text.clone(),
        }),
        Err(reason) => {
            engine_warn!("Job failed: {}", reason);
            sink.emit(JobEvent::JobFailed {
                reason: reason.clone(),
            });
        }
    }
}

fn append_content(text: &mut String, content: String, sink: &dyn EventSink) {
    text.push_str(&content);
    sink.emit(JobEvent::ContentAppended { text: content });
}

fn parse_endpoint(endpoint: &str) -> Result<Url, FailureKind> {
    let url = Url::parse(endpoint).map_err(|err| {
        engine_warn!("Invalid endpoint: {}", err);
        FailureKind::InvalidUrl
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FailureKind::InvalidUrl),
    }
}

/// Races `fut` against cancellation. Dropping `fut` aborts any transport work
/// it owns.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, FailureKind> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FailureKind::Cancelled),
        output = fut => Ok(output),
    }
}

fn map_transport_error(err: reqwest::Error) -> FailureKind {
    let err = err.without_url();
    if err.is_timeout() {
        engine_warn!("Request timed out: {}", err);
        return FailureKind::Timeout;
    }
    engine_warn!("Transport error: {}", err);
    FailureKind::Connection
}
