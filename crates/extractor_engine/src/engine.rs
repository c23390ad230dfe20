use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::client::{emit_terminal, ChannelEventSink, JobRunner};
use crate::{ClientSettings, EngineEvent, FailureKind, JobClient, JobId, JobRequest};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a job is already running")]
    Busy,
    #[error("engine has shut down")]
    Closed,
}

enum EngineCommand {
    Submit {
        job_id: JobId,
        request: JobRequest,
        cancel: CancellationToken,
    },
}

/// Runs jobs on a background tokio runtime, one at a time.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    busy: Arc<AtomicBool>,
    current: Arc<Mutex<Option<CancellationToken>>>,
    runtime: tokio::runtime::Handle,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, FailureKind> {
        let client = JobClient::new(settings)?;
        Self::with_runner(Arc::new(client))
    }

    pub fn with_runner(runner: Arc<dyn JobRunner>) -> Result<Self, FailureKind> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| {
                engine_error!("Failed to start engine runtime: {}", err);
                FailureKind::Connection
            })?;
        let handle = runtime.handle().clone();

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let busy = Arc::new(AtomicBool::new(false));
        let current = Arc::new(Mutex::new(None));

        let worker_busy = busy.clone();
        let worker_current = current.clone();
        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let runner = runner.clone();
                let event_tx = event_tx.clone();
                let busy = worker_busy.clone();
                let current = worker_current.clone();
                runtime.spawn(async move {
                    handle_command(runner.as_ref(), command, event_tx, &busy, &current).await;
                });
            }
            engine_info!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            busy,
            current,
            runtime: handle,
        })
    }

    /// Starts `request` unless a job is already in flight.
    pub fn submit(&self, job_id: JobId, request: JobRequest) -> Result<(), SubmitError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            engine_warn!("Rejected job {}: another job is running", job_id);
            return Err(SubmitError::Busy);
        }

        let cancel = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            *current = Some(cancel.clone());
        }

        engine_info!("Submitting job {} ({:?})", job_id, request.mode);
        self.cmd_tx
            .send(EngineCommand::Submit {
                job_id,
                request,
                cancel,
            })
            .map_err(|_| {
                self.busy.store(false, Ordering::SeqCst);
                SubmitError::Closed
            })
    }

    /// Cancels the in-flight job, if any.
    pub fn cancel(&self) {
        if let Ok(current) = self.current.lock() {
            if let Some(token) = current.as_ref() {
                engine_info!("Cancelling in-flight job");
                token.cancel();
            }
        }
    }

    /// Calls `on_interrupt` every time the process receives Ctrl-C.
    pub fn on_interrupt<F>(&self, on_interrupt: F)
    where
        F: Fn() + Send + 'static,
    {
        self.runtime.spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                engine_info!("Interrupt received");
                on_interrupt();
            }
        });
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    runner: &dyn JobRunner,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
    busy: &AtomicBool,
    current: &Mutex<Option<CancellationToken>>,
) {
    match command {
        EngineCommand::Submit {
            job_id,
            request,
            cancel,
        } => {
            let sink = ChannelEventSink::new(job_id, event_tx);
            let result = runner.execute(&request, &sink, &cancel).await;

            // Free the slot before the terminal event so a consumer reacting to
            // it can submit again straight away.
            if let Ok(mut current) = current.lock() {
                *current = None;
            }
            busy.store(false, Ordering::SeqCst);
            emit_terminal(&result, &sink);
        }
    }
}
