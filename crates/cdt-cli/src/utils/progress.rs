use cdtpp::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct BarState {
    bar: ProgressBar,
    phase: &'static str,
}

/// Renders engine [`Progress`] events as a single indicatif bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        bar.set_draw_target(target);
        bar.disable_steady_tick();
        bar.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(BarState { bar, phase: "" })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = Arc::clone(&self.state);

        Box::new(move |progress: Progress| {
            let Ok(mut guard) = state.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    guard.phase = name;
                    let pb = &guard.bar;
                    pb.reset();
                    pb.set_length(0);
                    pb.set_style(Self::spinner_style());
                    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb.set_message(name);
                }
                Progress::PhaseFinish => {
                    let message = format!("✓ {}", guard.phase);
                    guard.bar.disable_steady_tick();
                    guard.bar.finish_with_message(message);
                }
                Progress::TaskStart { total_steps } => {
                    let pb = &guard.bar;
                    pb.disable_steady_tick();
                    pb.reset();
                    pb.set_length(total_steps);
                    pb.set_position(0);
                    pb.set_style(Self::bar_style());
                }
                Progress::TaskIncrement => {
                    guard.bar.inc(1);
                }
                Progress::TaskFinish => {
                    let pb = &guard.bar;
                    let length = pb.length().unwrap_or(0);
                    if pb.position() < length {
                        pb.set_position(length);
                    }
                    pb.finish();
                }
                Progress::Status(text) => {
                    let message = format!("{} ({})", guard.phase, text);
                    guard.bar.set_message(message);
                }
                Progress::Message(msg) => {
                    if guard.bar.is_finished() {
                        guard.bar.set_message(msg);
                    } else {
                        guard.bar.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        match ProgressStyle::with_template("{msg:<40} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
            Ok(style) => style
                .with_key(
                    "eta",
                    |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                        let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                    },
                )
                .progress_chars("##-"),
            Err(_) => ProgressStyle::default_bar(),
        }
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hidden() -> CliProgressHandler {
        CliProgressHandler::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = hidden();
        let state = handler.state.lock().unwrap();
        assert_eq!(state.bar.length(), Some(0));
        assert!(state.bar.is_finished());
    }

    #[test]
    fn callback_updates_progress_bar_state() {
        let handler = hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Sampling" });
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.bar.message(), "Sampling");
            assert!(!state.bar.is_finished());
        }

        callback(Progress::TaskStart { total_steps: 100 });
        callback(Progress::TaskIncrement);
        callback(Progress::Status("N3 6400".to_string()));
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.bar.length(), Some(100));
            assert_eq!(state.bar.position(), 1);
            assert_eq!(state.bar.message(), "Sampling (N3 6400)");
        }

        callback(Progress::TaskFinish);
        {
            let state = handler.state.lock().unwrap();
            assert!(state.bar.is_finished());
            assert_eq!(state.bar.position(), 100);
        }

        callback(Progress::PhaseFinish);
        let state = handler.state.lock().unwrap();
        assert_eq!(state.bar.message(), "✓ Sampling");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Thread Test",
            });
            callback(Progress::TaskIncrement);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let state = handler.state.lock().unwrap();
        assert!(state.bar.is_finished());
        assert_eq!(state.bar.message(), "✓ Thread Test");
    }
}
