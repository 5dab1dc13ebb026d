/// Events emitted while a batch is deduplicated and generated.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// A countable task begins; `total_steps` is the number of increments to expect.
    TaskStart { total_steps: u64 },
    TaskIncrement,
    /// Several steps completed at once (e.g. one full row of pairwise alignments).
    TaskAdvance { steps: u64 },
    TaskFinish,

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::PhaseStart { name: "noop" });
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        reporter.report(Progress::TaskStart { total_steps: 3 });
        reporter.report(Progress::TaskAdvance { steps: 2 });
        reporter.report(Progress::TaskFinish);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Progress::TaskStart { total_steps: 3 },
                Progress::TaskAdvance { steps: 2 },
                Progress::TaskFinish,
            ]
        );
    }
}
