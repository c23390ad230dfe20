use crate::{JobPhase, Notice, ServiceKind, StepStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub service: Option<ServiceKind>,
    pub phase: JobPhase,
    pub input: String,
    pub steps: Vec<StepRowView>,
    pub result: Option<String>,
    pub notice: Option<Notice>,
    pub can_submit: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRowView {
    pub index: usize,
    pub name: &'static str,
    pub status: StepStatus,
    /// `None` for steps that show a spinner instead of a percentage.
    pub progress: Option<u8>,
    pub data: Option<String>,
}
