//! Turns view-model changes into terminal output.
//!
//! Status lines (service banner, step rows, notices) go to stderr. Result text
//! goes to stdout, so it can be piped on its own.

use extractor_core::{AppViewModel, NoticeKind, StepRowView, StepStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Status(String),
    /// Raw result text, written without an added newline.
    Content(String),
}

/// Diffs `previous` against `view` and returns what to print.
pub fn render(previous: &AppViewModel, view: &AppViewModel) -> Vec<TerminalCommand> {
    let mut commands = Vec::new();

    if view.service != previous.service {
        if let Some(service) = view.service {
            commands.push(TerminalCommand::Status(format!(
                "== {} == {}",
                service.title(),
                service.description()
            )));
        }
    }

    if view.input != previous.input && !view.input.is_empty() {
        if let Some(service) = view.service {
            commands.push(TerminalCommand::Status(format!(
                "{}: {}",
                service.input_label(),
                view.input
            )));
        }
    }

    for step in &view.steps {
        let before = previous.steps.iter().find(|row| row.index == step.index);
        if before.map_or(true, |before| step_changed(before, step)) {
            commands.push(TerminalCommand::Status(step_line(step)));
        }
    }

    if let Some(text) = new_content(previous.result.as_deref(), view.result.as_deref()) {
        commands.push(TerminalCommand::Content(text.to_string()));
    }

    if view.notice != previous.notice {
        if let Some(notice) = &view.notice {
            let prefix = match notice.kind {
                NoticeKind::Success => "",
                NoticeKind::Error => "error: ",
            };
            commands.push(TerminalCommand::Status(format!(
                "{prefix}{}: {}",
                notice.title, notice.message
            )));
        }
    }

    commands
}

/// Progress is only reported in steps of ten so a long wait does not flood
/// the terminal.
fn step_changed(before: &StepRowView, step: &StepRowView) -> bool {
    before.status != step.status
        || before.data != step.data
        || before.progress.map(|p| p / 10) != step.progress.map(|p| p / 10)
}

fn step_line(step: &StepRowView) -> String {
    let marker = match step.status {
        StepStatus::Pending => "[  ]",
        StepStatus::Active => "[..]",
        StepStatus::Completed => "[ok]",
    };
    let mut line = format!("{marker} {}", step.name);
    if let Some(progress) = step.progress {
        line.push_str(&format!(" {progress:>3}%"));
    }
    if let Some(data) = &step.data {
        line.push_str(" | ");
        line.push_str(data);
    }
    line
}

fn new_content<'a>(previous: Option<&str>, current: Option<&'a str>) -> Option<&'a str> {
    let current = current?;
    let tail = match previous {
        Some(previous) if current.starts_with(previous) => &current[previous.len()..],
        _ => current,
    };
    (!tail.is_empty()).then_some(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extractor_core::{JobPhase, Notice, ServiceKind};
    use pretty_assertions::assert_eq;

    fn row(status: StepStatus, progress: Option<u8>) -> StepRowView {
        StepRowView {
            index: 1,
            name: "Analysing data",
            status,
            progress,
            data: None,
        }
    }

    #[test]
    fn streamed_text_is_printed_once() {
        let first = AppViewModel {
            result: Some("Hello ".into()),
            ..AppViewModel::default()
        };
        let second = AppViewModel {
            result: Some("Hello world".into()),
            ..first.clone()
        };

        assert_eq!(
            render(&AppViewModel::default(), &first),
            vec![TerminalCommand::Content("Hello ".into())]
        );
        assert_eq!(
            render(&first, &second),
            vec![TerminalCommand::Content("world".into())]
        );
        assert!(render(&second, &second.clone()).is_empty());
    }

    #[test]
    fn progress_lines_are_throttled() {
        let at = |percent| AppViewModel {
            phase: JobPhase::Polling,
            steps: vec![row(StepStatus::Active, Some(percent))],
            ..AppViewModel::default()
        };

        assert!(render(&at(41), &at(47)).is_empty());
        assert_eq!(
            render(&at(47), &at(52)),
            vec![TerminalCommand::Status("[..] Analysing data  52%".into())]
        );
    }

    #[test]
    fn service_banner_steps_and_notice() {
        let view = AppViewModel {
            service: Some(ServiceKind::Crawl),
            steps: vec![StepRowView {
                index: 0,
                name: "Crawler",
                status: StepStatus::Active,
                progress: None,
                data: Some("https://example.com/".into()),
            }],
            notice: Some(Notice::error("Request failed", "request timed out")),
            ..AppViewModel::default()
        };

        assert_eq!(
            render(&AppViewModel::default(), &view),
            vec![
                TerminalCommand::Status(
                    "== Website crawl == Extract the full content and data of any website".into()
                ),
                TerminalCommand::Status("[..] Crawler | https://example.com/".into()),
                TerminalCommand::Status("error: Request failed: request timed out".into()),
            ]
        );
    }

    #[test]
    fn input_is_echoed_under_its_label() {
        let view = AppViewModel {
            service: Some(ServiceKind::Search),
            input: "rust async".into(),
            ..AppViewModel::default()
        };
        let previous = AppViewModel {
            input: String::new(),
            ..view.clone()
        };
        assert_eq!(
            render(&previous, &view),
            vec![TerminalCommand::Status(
                "What do you want to search for?: rust async".into()
            )]
        );
    }

    #[test]
    fn replaced_result_is_printed_whole() {
        let before = AppViewModel {
            result: Some("partial".into()),
            ..AppViewModel::default()
        };
        let after = AppViewModel {
            result: Some("# Google Maps results\n".into()),
            ..AppViewModel::default()
        };
        assert_eq!(
            render(&before, &after),
            vec![TerminalCommand::Content("# Google Maps results\n".into())]
        );
        assert!(render(&after, &AppViewModel::default()).is_empty());
    }
}
