use crate::service::{normalize_site_url, InputKind};
use crate::{AppState, Effect, MapsForm, Msg, Notice, ServiceKind, Submission};

const MISSING_INFO_TITLE: &str = "Missing information";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ServiceSelected(service) => {
            // The service is locked while a job runs.
            if !state.phase().is_active() {
                state.select_service(service);
            }
            Vec::new()
        }
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::MapsFormChanged(form) => {
            state.set_maps_form(form);
            Vec::new()
        }
        Msg::Submitted => submit(&mut state),
        Msg::CancelRequested => match state.active_job() {
            Some(job_id) if state.phase().is_active() => vec![Effect::CancelJob { job_id }],
            _ => Vec::new(),
        },
        Msg::StepStarted { job_id, step_index } => {
            if state.is_current(job_id) {
                state.start_step(step_index);
            }
            Vec::new()
        }
        Msg::StepProgress {
            job_id,
            step_index,
            percent,
        } => {
            if state.is_current(job_id) {
                state.apply_progress(step_index, percent);
            }
            Vec::new()
        }
        Msg::StepCompleted {
            job_id,
            step_index,
            summary,
        } => {
            if state.is_current(job_id) {
                state.complete_step(step_index, summary);
            }
            Vec::new()
        }
        Msg::ContentAppended { job_id, text } => {
            if state.is_current(job_id) {
                state.append_content(&text);
            }
            Vec::new()
        }
        Msg::JobCompleted { job_id, final_text } => {
            if state.is_current(job_id) {
                state.complete_job(final_text);
            }
            Vec::new()
        }
        Msg::JobFailed { job_id, message } => {
            if state.is_current(job_id) {
                state.fail_job(message);
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if state.phase().is_active() {
        return Vec::new();
    }
    let Some(service) = state.service() else {
        state.set_notice(Notice::error(
            MISSING_INFO_TITLE,
            "Please choose a service and enter the required data",
        ));
        return Vec::new();
    };

    match build_submission(service, state.input(), state.maps_form()) {
        Ok((submission, shown_input)) => {
            let job_id = state.begin_job(service, &submission, &shown_input);
            vec![Effect::SubmitJob {
                job_id,
                service,
                submission,
            }]
        }
        Err(message) => {
            state.set_notice(Notice::error(MISSING_INFO_TITLE, message));
            Vec::new()
        }
    }
}

/// Validates the user's input for `service` and returns what to send together
/// with the input as it should be echoed back.
fn build_submission(
    service: ServiceKind,
    input: &str,
    form: &MapsForm,
) -> Result<(Submission, String), &'static str> {
    match service.input_kind() {
        InputKind::Url => {
            // Validated as a URL, but sent as the user typed it.
            let typed = input.trim();
            if normalize_site_url(typed).is_none() {
                return Err("Please enter a valid website URL");
            }
            let job = service
                .job_text(typed)
                .unwrap_or_else(|| typed.to_string());
            Ok((Submission::Job(job), typed.to_string()))
        }
        InputKind::Text => {
            let query = input.trim();
            if query.is_empty() {
                return Err("Please enter a query");
            }
            let submission = if service == ServiceKind::MapsAdvanced {
                Submission::Message(query.to_string())
            } else {
                Submission::Job(service.job_text(query).unwrap_or_else(|| query.to_string()))
            };
            Ok((submission, query.to_string()))
        }
        InputKind::Places => {
            let location = form.location_query.trim();
            let search = form.search_terms.trim();
            if location.is_empty() || search.is_empty() {
                return Err("Please enter a location and what to search for");
            }
            if form.max_places == 0 {
                return Err("The number of places must be at least 1");
            }
            let form = MapsForm {
                location_query: location.to_string(),
                search_terms: search.to_string(),
                ..form.clone()
            };
            let shown = format!("{location} | {search}");
            Ok((Submission::PlacesCrawl(form), shown))
        }
    }
}
