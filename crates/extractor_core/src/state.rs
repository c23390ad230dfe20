use crate::service::{InputKind, JobModeKind};
use crate::view_model::{AppViewModel, StepRowView};
use crate::{ServiceKind, Submission};

pub type JobId = u64;

/// Lifecycle of the one job the front-end can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    /// Request built and handed to the engine; nothing heard back yet.
    Submitting,
    Streaming,
    Polling,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            JobPhase::Submitting | JobPhase::Streaming | JobPhase::Polling
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapsForm {
    pub location_query: String,
    pub search_terms: String,
    pub max_places: u32,
    pub language: String,
    pub scrape_reviews_personal_data: bool,
    pub max_reviews: u32,
}

impl Default for MapsForm {
    fn default() -> Self {
        Self {
            location_query: String::new(),
            search_terms: String::new(),
            max_places: 10,
            language: "ar".to_string(),
            scrape_reviews_personal_data: true,
            max_reviews: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A one-shot message for the user, like a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StepState {
    name: &'static str,
    status: StepStatus,
    progress: Option<u8>,
    data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    service: Option<ServiceKind>,
    input: String,
    maps_form: MapsForm,
    phase: JobPhase,
    next_job_id: JobId,
    active_job: Option<JobId>,
    job_service: Option<ServiceKind>,
    steps: Vec<StepState>,
    result: Option<String>,
    notice: Option<Notice>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            service: None,
            input: String::new(),
            maps_form: MapsForm::default(),
            phase: JobPhase::Idle,
            next_job_id: 1,
            active_job: None,
            job_service: None,
            steps: Vec::new(),
            result: None,
            notice: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            service: self.service,
            phase: self.phase,
            input: self.input.clone(),
            steps: self
                .steps
                .iter()
                .enumerate()
                .map(|(index, step)| StepRowView {
                    index,
                    name: step.name,
                    status: step.status,
                    progress: step.progress,
                    data: step.data.clone(),
                })
                .collect(),
            result: self.result.clone(),
            notice: self.notice.clone(),
            can_submit: self.service.is_some() && !self.phase.is_active(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn service(&self) -> Option<ServiceKind> {
        self.service
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn maps_form(&self) -> &MapsForm {
        &self.maps_form
    }

    pub fn active_job(&self) -> Option<JobId> {
        self.active_job
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn select_service(&mut self, service: ServiceKind) {
        if self.service != Some(service) {
            self.service = Some(service);
            self.input.clear();
            self.mark_dirty();
        }
    }

    pub(crate) fn set_input(&mut self, input: String) {
        self.input = input;
        self.mark_dirty();
    }

    pub(crate) fn set_maps_form(&mut self, form: MapsForm) {
        self.maps_form = form;
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    /// Whether `job_id` is the job currently running. Events for older jobs
    /// are dropped.
    pub(crate) fn is_current(&self, job_id: JobId) -> bool {
        self.phase.is_active() && self.active_job == Some(job_id)
    }

    /// Moves to `Submitting` for a new job. `shown_input` is what the user
    /// entered, echoed on the step rows.
    pub(crate) fn begin_job(
        &mut self,
        service: ServiceKind,
        submission: &Submission,
        shown_input: &str,
    ) -> JobId {
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        self.active_job = Some(job_id);
        self.job_service = Some(service);
        self.phase = JobPhase::Submitting;
        self.result = None;
        self.notice = None;
        self.steps = initial_steps(service, submission, shown_input);
        self.mark_dirty();
        job_id
    }

    pub(crate) fn start_step(&mut self, index: usize) {
        self.enter_running();
        if let Some(step) = self.steps.get_mut(index) {
            if step.status == StepStatus::Pending {
                step.status = StepStatus::Active;
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_progress(&mut self, index: usize, percent: u8) {
        self.enter_running();
        if let Some(step) = self.steps.get_mut(index) {
            let percent = percent.min(100);
            step.progress = Some(step.progress.map_or(percent, |p| p.max(percent)));
        }
        self.mark_dirty();
    }

    pub(crate) fn complete_step(&mut self, index: usize, summary: Option<String>) {
        self.enter_running();
        if let Some(step) = self.steps.get_mut(index) {
            step.status = StepStatus::Completed;
            if step.progress.is_some() {
                step.progress = Some(100);
            }
            if summary.is_some() {
                step.data = summary;
            }
        }
        // Completing a step activates the next pending one.
        if let Some(next) = self.steps.get_mut(index + 1) {
            if next.status == StepStatus::Pending {
                next.status = StepStatus::Active;
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn append_content(&mut self, text: &str) {
        self.enter_running();
        self.result.get_or_insert_with(String::new).push_str(text);
        self.mark_dirty();
    }

    pub(crate) fn complete_job(&mut self, final_text: String) {
        for step in &mut self.steps {
            step.status = StepStatus::Completed;
            if step.progress.is_some() {
                step.progress = Some(100);
            }
        }
        // A polling job reports its result count and duration on the last step.
        let message = match self.job_service.map(ServiceKind::mode) {
            Some(JobModeKind::Polling) => self.steps.last().and_then(|step| step.data.clone()),
            _ => None,
        }
        .unwrap_or_else(|| "Your request was processed successfully".to_string());
        self.result = Some(final_text);
        self.phase = JobPhase::Completed;
        self.notice = Some(Notice::success("Done", message));
        self.mark_dirty();
    }

    pub(crate) fn fail_job(&mut self, message: String) {
        self.steps.clear();
        self.phase = JobPhase::Failed;
        self.notice = Some(Notice::error("Request failed", message));
        self.mark_dirty();
    }

    fn enter_running(&mut self) {
        if self.phase != JobPhase::Submitting {
            return;
        }
        self.phase = match self.job_service.map(ServiceKind::mode) {
            Some(JobModeKind::Polling) => JobPhase::Polling,
            _ => JobPhase::Streaming,
        };
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

fn initial_steps(
    service: ServiceKind,
    submission: &Submission,
    shown_input: &str,
) -> Vec<StepState> {
    let names = service.step_names();
    match submission {
        Submission::PlacesCrawl(form) => names
            .into_iter()
            .enumerate()
            .map(|(index, name)| StepState {
                name,
                status: if index == 0 {
                    StepStatus::Active
                } else {
                    StepStatus::Pending
                },
                progress: Some(0),
                data: (index == 0).then(|| {
                    format!(
                        "Location: {} | Search: {}",
                        form.location_query, form.search_terms
                    )
                }),
            })
            .collect(),
        Submission::Job(_) | Submission::Message(_) => {
            let data = match service.input_kind() {
                InputKind::Url => shown_input.to_string(),
                _ => format!("Query: {shown_input}"),
            };
            names
                .into_iter()
                .map(|name| StepState {
                    name,
                    status: StepStatus::Active,
                    progress: None,
                    data: Some(data.clone()),
                })
                .collect()
        }
    }
}
