use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use engine_logging::engine_info;
use extractor_core::{update, AppState, AppViewModel, JobPhase, Msg};

use super::effects::EffectRunner;
use super::settings::Settings;
use super::ui::render::{render, TerminalCommand};
use crate::cli::ServiceCommand;

const EVENT_WAIT: Duration = Duration::from_millis(75);

/// Runs one job to completion. Returns whether it succeeded.
pub fn run_app(command: ServiceCommand, settings: Settings) -> anyhow::Result<bool> {
    let effects = EffectRunner::new(settings)
        .map_err(|err| anyhow!("could not start the job engine: {err}"))?;
    let mut app = TerminalApp::new(effects);

    let started = Instant::now();
    app.inbox.extend(command.into_msgs());

    loop {
        app.process_pending_messages()?;

        match app.state.phase() {
            JobPhase::Completed => {
                if app.state.result().is_some_and(|text| !text.ends_with('\n')) {
                    println!();
                }
                let elapsed = started.elapsed().as_secs_f64();
                engine_info!("Job finished in {:.1} s", elapsed);
                eprintln!("Completed in {elapsed:.1} s");
                return Ok(true);
            }
            // Idle here means the input was rejected before anything was sent.
            JobPhase::Failed | JobPhase::Idle => return Ok(false),
            JobPhase::Submitting | JobPhase::Streaming | JobPhase::Polling => {}
        }

        if let Some(msg) = app.effects.next_msg(EVENT_WAIT) {
            app.inbox.push_back(msg);
        }
    }
}

struct TerminalApp {
    state: AppState,
    shown: AppViewModel,
    effects: EffectRunner,
    inbox: VecDeque<Msg>,
}

impl TerminalApp {
    fn new(effects: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            shown: AppViewModel::default(),
            effects,
            inbox: VecDeque::new(),
        }
    }

    fn process_pending_messages(&mut self) -> io::Result<()> {
        while let Some(msg) = self.inbox.pop_front() {
            self.dispatch_msg(msg)?;
        }
        Ok(())
    }

    fn dispatch_msg(&mut self, msg: Msg) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        let view = state.view();
        self.state = state;

        self.inbox.extend(self.effects.enqueue(effects));

        if was_dirty {
            let commands = render(&self.shown, &view);
            self.shown = view;
            write_commands(commands)?;
        }
        Ok(())
    }
}

fn write_commands(commands: Vec<TerminalCommand>) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for command in commands {
        match command {
            TerminalCommand::Status(line) => eprintln!("{line}"),
            TerminalCommand::Content(text) => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
        }
    }
    Ok(())
}
