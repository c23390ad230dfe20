//! Extractor core: pure state machine, service catalog and view-model helpers.
mod effect;
mod msg;
mod service;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Submission};
pub use msg::Msg;
pub use service::{normalize_site_url, InputKind, JobModeKind, ServiceKind};
pub use state::{AppState, JobId, JobPhase, MapsForm, Notice, NoticeKind, StepStatus};
pub use update::update;
pub use view_model::{AppViewModel, StepRowView};
