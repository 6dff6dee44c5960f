use std::sync::mpsc::{Sender, SyncSender};

/// Receives completion percentages while a query is scored.
///
/// Percentages are advisory. A sink that cannot deliver (a closed channel)
/// drops the update; it never fails the query.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

impl ProgressSink for SyncSender<u8> {
    fn report(&mut self, percent: u8) {
        let _ = self.send(percent);
    }
}

impl ProgressSink for Sender<u8> {
    fn report(&mut self, percent: u8) {
        let _ = self.send(percent);
    }
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Turns "done of total" counts into a strictly increasing percentage
/// stream: `0` first, `100` exactly once at the end, and at most 99 before.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    last: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    /// Wrap `sink` and report 0.
    pub fn start(sink: &'a mut dyn ProgressSink) -> Self {
        let mut reporter = Self { sink, last: None };
        reporter.emit(0);
        reporter
    }

    /// Report `done / total`, floored, if it moved forward.
    pub fn update(&mut self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = ((done.min(total) as u128 * 100) / total as u128).min(99) as u8;
        self.emit(percent);
    }

    pub fn finish(mut self) {
        self.emit(100);
    }

    fn emit(&mut self, percent: u8) {
        if self.last.map_or(true, |last| percent > last) {
            self.last = Some(percent);
            self.sink.report(percent);
        }
    }
}
