use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use qmjob::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// What the bar shows for a phase the engine announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Deduplication,
    Generation,
    Other(&'static str),
}

impl Stage {
    fn from_phase(name: &'static str) -> Self {
        match name {
            "Deduplication" => Stage::Deduplication,
            "Generation" => Stage::Generation,
            other => Stage::Other(other),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Stage::Deduplication => "Comparing conformers",
            Stage::Generation => "Writing job decks",
            Stage::Other(name) => name,
        }
    }

    /// What one step of a counted task means in this stage.
    fn unit(self) -> &'static str {
        match self {
            Stage::Deduplication => "alignments",
            Stage::Generation | Stage::Other(_) => "steps",
        }
    }

    fn finished(self, steps: u64) -> String {
        match self {
            Stage::Deduplication if steps > 0 => {
                format!("✓ Conformers compared ({steps} alignments)")
            }
            Stage::Deduplication => "✓ Nothing to compare".to_string(),
            Stage::Generation => "✓ Job decks written".to_string(),
            Stage::Other(name) => format!("✓ {name} done"),
        }
    }
}

struct BarState {
    bar: ProgressBar,
    stage: Option<Stage>,
}

/// Renders deduplication and generation progress on one stderr bar.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        bar.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(BarState { bar, stage: None })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();
        Box::new(move |event: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress state lock was poisoned; dropping event.");
                return;
            };
            state.apply(event);
        })
    }
}

impl BarState {
    fn apply(&mut self, event: Progress) {
        match event {
            Progress::PhaseStart { name } => {
                let stage = Stage::from_phase(name);
                self.stage = Some(stage);
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.set_message(stage.label());
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                let stage = self.stage.take().unwrap_or(Stage::Other("Phase"));
                let steps = self.bar.length().unwrap_or(0);
                self.bar.disable_steady_tick();
                self.bar.finish_with_message(stage.finished(steps));
            }
            Progress::TaskStart { total_steps } => {
                let stage = self.stage.unwrap_or(Stage::Other("Working"));
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_length(total_steps);
                self.bar.set_style(bar_style(stage.unit()));
                self.bar.set_message(stage.label());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskAdvance { steps } => self.bar.inc(steps),
            Progress::TaskFinish => {
                if let Some(length) = self.bar.length() {
                    self.bar.set_position(length);
                }
                self.bar.finish();
            }
            Progress::Message(msg) => match self.stage {
                Some(stage) if !self.bar.is_finished() => {
                    self.bar.println(format!("  [{}] {msg}", stage.label()));
                }
                _ => self.bar.set_message(msg),
            },
        }
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style(unit: &str) -> ProgressStyle {
    let template = format!("{{msg:<22}} {{wide_bar:.cyan/blue}} {{pos}}/{{len}} {unit} [{{eta}}]");
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn message(handler: &CliProgressHandler) -> String {
        handler.state.lock().unwrap().bar.message()
    }

    #[test]
    fn handler_starts_idle() {
        let handler = CliProgressHandler::hidden();
        let state = handler.state.lock().unwrap();
        assert_eq!(state.bar.length(), Some(0));
        assert!(state.bar.is_finished());
        assert!(state.stage.is_none());
    }

    #[test]
    fn deduplication_phase_counts_alignments() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Deduplication",
        });
        assert_eq!(message(&handler), "Comparing conformers");

        callback(Progress::TaskStart { total_steps: 6 });
        callback(Progress::TaskAdvance { steps: 3 });
        callback(Progress::TaskIncrement);
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.bar.length(), Some(6));
            assert_eq!(state.bar.position(), 4);
            assert_eq!(state.bar.message(), "Comparing conformers");
        }

        callback(Progress::TaskFinish);
        assert_eq!(handler.state.lock().unwrap().bar.position(), 6);

        callback(Progress::PhaseFinish);
        assert_eq!(message(&handler), "✓ Conformers compared (6 alignments)");
        assert!(handler.state.lock().unwrap().stage.is_none());
    }

    #[test]
    fn deduplication_without_pairs_says_so() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();
        callback(Progress::PhaseStart {
            name: "Deduplication",
        });
        callback(Progress::PhaseFinish);
        assert_eq!(message(&handler), "✓ Nothing to compare");
    }

    #[test]
    fn generation_phase_reports_written_decks() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();
        callback(Progress::PhaseStart { name: "Generation" });
        assert_eq!(message(&handler), "Writing job decks");
        callback(Progress::PhaseFinish);
        assert_eq!(message(&handler), "✓ Job decks written");
    }

    #[test]
    fn unknown_phase_keeps_its_name() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();
        callback(Progress::PhaseStart { name: "Packing" });
        assert_eq!(message(&handler), "Packing");
        callback(Progress::PhaseFinish);
        assert_eq!(message(&handler), "✓ Packing done");
    }

    #[test]
    fn message_while_idle_replaces_label() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();
        callback(Progress::Message("3 of 5 conformers kept".to_string()));
        assert_eq!(message(&handler), "3 of 5 conformers kept");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Generation" });
            callback(Progress::TaskIncrement);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let state = handler.state.lock().unwrap();
        assert!(state.bar.is_finished());
        assert_eq!(state.bar.message(), "✓ Job decks written");
    }
}
