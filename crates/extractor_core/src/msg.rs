#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a service card.
    ServiceSelected(crate::ServiceKind),
    /// User edited the single input box.
    InputChanged(String),
    /// User edited the map crawl form.
    MapsFormChanged(crate::MapsForm),
    /// User pressed submit.
    Submitted,
    /// User asked to abort the running job.
    CancelRequested,
    /// Engine started a step.
    StepStarted { job_id: crate::JobId, step_index: usize },
    /// Engine progress for a step.
    StepProgress {
        job_id: crate::JobId,
        step_index: usize,
        percent: u8,
    },
    /// Engine finished a step.
    StepCompleted {
        job_id: crate::JobId,
        step_index: usize,
        summary: Option<String>,
    },
    /// Engine streamed more result text.
    ContentAppended { job_id: crate::JobId, text: String },
    /// Engine finished the job.
    JobCompleted {
        job_id: crate::JobId,
        final_text: String,
    },
    /// Engine gave up on the job.
    JobFailed { job_id: crate::JobId, message: String },
}
