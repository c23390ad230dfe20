use std::fmt;

use serde_json::Value;

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    /// The backend answers with a chunked newline-delimited JSON body.
    Stream,
    /// Start a run, wait a fixed budget, then fetch its results.
    Poll,
}

/// One submission. Built once per user submit and dropped when the job ends.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub mode: JobMode,
    pub endpoint: String,
    /// JSON object sent as the request body.
    pub payload: Value,
}

impl JobRequest {
    pub fn stream(endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            mode: JobMode::Stream,
            endpoint: endpoint.into(),
            payload,
        }
    }

    pub fn poll(endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            mode: JobMode::Poll,
            endpoint: endpoint.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    StepStarted {
        step_index: usize,
    },
    /// Percent is within 0..=100 and never decreases inside a step.
    StepProgress {
        step_index: usize,
        percent: u8,
    },
    StepCompleted {
        step_index: usize,
        summary: Option<String>,
    },
    /// Streaming mode only. Consumers append `text` to what they already have.
    ContentAppended {
        text: String,
    },
    JobCompleted {
        final_text: String,
    },
    JobFailed {
        reason: FailureKind,
    },
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::JobCompleted { .. } | JobEvent::JobFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub job_id: JobId,
    pub event: JobEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub final_text: String,
    /// Number of fetched records; only set in poll mode.
    pub result_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// Transport failed before or while reading a response.
    Connection,
    Timeout,
    ServerError { status: u16, body: String },
    StartError(String),
    FetchError(String),
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid endpoint url"),
            FailureKind::Connection => write!(
                f,
                "could not connect to the server; make sure the webhook is running and reachable"
            ),
            FailureKind::Timeout => write!(f, "request timed out"),
            FailureKind::ServerError { status, body } => {
                if body.is_empty() {
                    write!(f, "server error ({status})")
                } else {
                    write!(f, "server error ({status}): {body}")
                }
            }
            FailureKind::StartError(detail) => write!(f, "failed to start crawl: {detail}"),
            FailureKind::FetchError(detail) => write!(f, "failed to get results: {detail}"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
