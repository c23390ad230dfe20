use std::sync::{Arc, Mutex};

use extractor_engine::{EventSink, JobEvent};

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<JobEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<JobEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: JobEvent) {
        self.events.lock().unwrap().push(event);
    }
}
