use crate::{JobId, MapsForm, ServiceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob {
        job_id: JobId,
        service: ServiceKind,
        submission: Submission,
    },
    CancelJob { job_id: JobId },
}

/// What to send, independent of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// `{ "job": .. }` to the general webhook.
    Job(String),
    /// `{ "message": .. }` to the maps webhook.
    Message(String),
    /// Start a place crawl with these parameters.
    PlacesCrawl(MapsForm),
}
