use std::sync::mpsc;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use extractor_core::{Effect, MapsForm, Msg, Submission};
use extractor_engine::{EngineEvent, EngineHandle, FailureKind, JobEvent, JobRequest, PlacesQuery};
use serde_json::json;

use super::settings::Settings;

/// Carries core effects out on the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    settings: Settings,
    interrupts: mpsc::Receiver<Msg>,
}

impl EffectRunner {
    pub fn new(settings: Settings) -> Result<Self, FailureKind> {
        let engine = EngineHandle::new(settings.client_settings())?;

        let (interrupt_tx, interrupts) = mpsc::channel();
        engine.on_interrupt(move || {
            let _ = interrupt_tx.send(Msg::CancelRequested);
        });

        Ok(Self {
            engine,
            settings,
            interrupts,
        })
    }

    /// Applies `effects`. Returns messages for effects that failed on the spot.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut immediate = Vec::new();
        for effect in effects {
            match effect {
                Effect::SubmitJob {
                    job_id,
                    service,
                    submission,
                } => {
                    let request = job_request(&self.settings, &submission);
                    engine_info!("SubmitJob job_id={} service={:?}", job_id, service);
                    if let Err(err) = self.engine.submit(job_id, request) {
                        engine_warn!("Job {} was not started: {}", job_id, err);
                        immediate.push(Msg::JobFailed {
                            job_id,
                            message: err.to_string(),
                        });
                    }
                }
                Effect::CancelJob { job_id } => {
                    engine_info!("CancelJob job_id={}", job_id);
                    self.engine.cancel();
                }
            }
        }
        immediate
    }

    /// Waits up to `timeout` for the next engine event or interrupt.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        if let Ok(msg) = self.interrupts.try_recv() {
            return Some(msg);
        }
        self.engine.recv_timeout(timeout).map(event_to_msg)
    }
}

/// Builds the engine request for `submission` against the configured endpoints.
pub fn job_request(settings: &Settings, submission: &Submission) -> JobRequest {
    match submission {
        Submission::Job(job) => JobRequest::stream(&settings.webhook_url, json!({ "job": job })),
        Submission::Message(message) => JobRequest::stream(
            &settings.maps_webhook_url,
            json!({ "message": message }),
        ),
        Submission::PlacesCrawl(form) => {
            JobRequest::poll(settings.start_run_url(), places_query(form).to_payload())
        }
    }
}

fn places_query(form: &MapsForm) -> PlacesQuery {
    PlacesQuery {
        location_query: form.location_query.clone(),
        search_terms: form.search_terms.clone(),
        max_places: form.max_places,
        language: form.language.clone(),
        scrape_reviews_personal_data: form.scrape_reviews_personal_data,
        max_reviews: form.max_reviews,
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    let job_id = event.job_id;
    match event.event {
        JobEvent::StepStarted { step_index } => Msg::StepStarted { job_id, step_index },
        JobEvent::StepProgress {
            step_index,
            percent,
        } => Msg::StepProgress {
            job_id,
            step_index,
            percent,
        },
        JobEvent::StepCompleted {
            step_index,
            summary,
        } => Msg::StepCompleted {
            job_id,
            step_index,
            summary,
        },
        JobEvent::ContentAppended { text } => Msg::ContentAppended { job_id, text },
        JobEvent::JobCompleted { final_text } => Msg::JobCompleted { job_id, final_text },
        JobEvent::JobFailed { reason } => {
            engine_warn!("Job {} failed: {}", job_id, reason);
            Msg::JobFailed {
                job_id,
                message: reason.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extractor_engine::JobMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn jobs_and_messages_go_to_their_webhooks() {
        let settings = Settings::default();

        let job = job_request(&settings, &Submission::Job("Crawl the website".into()));
        assert_eq!(job.mode, JobMode::Stream);
        assert_eq!(job.endpoint, settings.webhook_url);
        assert_eq!(job.payload, json!({ "job": "Crawl the website" }));

        let message = job_request(&settings, &Submission::Message("cafes in Tripoli".into()));
        assert_eq!(message.endpoint, settings.maps_webhook_url);
        assert_eq!(message.payload, json!({ "message": "cafes in Tripoli" }));
    }

    #[test]
    fn place_crawls_poll_the_actor() {
        let settings = Settings::default();
        let form = MapsForm {
            location_query: "Sabha".into(),
            search_terms: "pharmacy, clinic".into(),
            max_places: 4,
            ..MapsForm::default()
        };

        let request = job_request(&settings, &Submission::PlacesCrawl(form));
        assert_eq!(request.mode, JobMode::Poll);
        assert_eq!(
            request.endpoint,
            "https://api.apify.com/v2/acts/compass~crawler-google-places/runs"
        );
        assert_eq!(request.payload["locationQuery"], json!("Sabha"));
        assert_eq!(request.payload["searchStringsArray"], json!(["pharmacy", "clinic"]));
        assert_eq!(request.payload["maxCrawledPlacesPerSearch"], json!(4));
    }

    #[test]
    fn failures_carry_a_readable_message() {
        let msg = event_to_msg(EngineEvent {
            job_id: 7,
            event: JobEvent::JobFailed {
                reason: FailureKind::ServerError {
                    status: 502,
                    body: String::new(),
                },
            },
        });
        assert_eq!(
            msg,
            Msg::JobFailed {
                job_id: 7,
                message: "server error (502)".into()
            }
        );
    }
}
