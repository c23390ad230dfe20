//! Extractor engine: job client, stream decoding and the background runner.
mod client;
mod engine;
mod format;
mod ndjson;
mod places;
mod progress;
mod settings;
mod types;

pub use client::{ChannelEventSink, EventSink, JobClient, JobRunner};
pub use engine::{EngineHandle, SubmitError};
pub use format::format_places;
pub use ndjson::StreamBuffer;
pub use places::{PlaceRecord, PlacesQuery, PollContext, PollState, RunData};
pub use progress::progress_at;
pub use settings::{ClientSettings, DEFAULT_API_BASE};
pub use types::{EngineEvent, FailureKind, JobEvent, JobId, JobMode, JobOutcome, JobRequest};
