/// Events emitted by long-running engine operations.
///
/// A phase brackets a named stage of a workflow. Inside a phase, a task with
/// a known number of steps may run; for a simulation one step is one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// Replaces the status text shown next to the running task.
    Status(String),
    /// A one-off line to show above any progress display.
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `f` between a `PhaseStart`/`PhaseFinish` pair.
    ///
    /// `PhaseFinish` is emitted even when `f` returns an error, so displays
    /// never keep a stale phase open.
    pub fn phase<T>(&self, name: &'static str, f: impl FnOnce() -> T) -> T {
        self.report(Progress::PhaseStart { name });
        let result = f();
        self.report(Progress::PhaseFinish);
        result
    }
}
