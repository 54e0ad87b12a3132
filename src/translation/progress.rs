/*!
 * Progress reporting for a running batch.
 *
 * Tasks bump a shared completion counter and push (percent, message) events
 * to a `ProgressSink`; the batch ends with exactly one `finished` event.
 */

use log::{error, info};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Event delivered to presentation layers
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Intermediate progress, percent in 0..=100
    Progress { percent: u8, message: String },
    /// Terminal signal: success carries the output location, failure the reason
    Finished { success: bool, message: String },
}

/// Consumer of progress events, owned by the presentation layer
pub trait ProgressSink: Send + Sync {
    fn progress(&self, percent: u8, message: &str);

    fn finished(&self, success: bool, message: &str);
}

/// Forwards events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn progress(&self, percent: u8, message: &str) {
        // A dropped receiver only means nobody is watching anymore
        let _ = self.sender.send(ProgressEvent::Progress {
            percent,
            message: message.to_string(),
        });
    }

    fn finished(&self, success: bool, message: &str) {
        let _ = self.sender.send(ProgressEvent::Finished {
            success,
            message: message.to_string(),
        });
    }
}

/// Writes events through the log facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn progress(&self, percent: u8, message: &str) {
        info!("[{:>3}%] {}", percent, message);
    }

    fn finished(&self, success: bool, message: &str) {
        if success {
            info!("Translation succeeded: {}", message);
        } else {
            error!("Translation failed: {}", message);
        }
    }
}

/// Monotonic count of completed tasks
///
/// Increments and the report that follows them happen under one lock, so the
/// counts seen by a sink never go backwards.
#[derive(Debug)]
pub struct ProgressTracker {
    completed: AtomicUsize,
    total: usize,
    report_lock: Mutex<()>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            report_lock: Mutex::new(()),
        }
    }

    /// Count one more finished task, hand the new count to `report`, return it
    pub fn complete_one<F: FnOnce(usize)>(&self, report: F) -> usize {
        let _ordered = self.report_lock.lock();
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        report(completed);
        completed
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Percentage for a given completion count, clamped to 100
    pub fn percent_of(&self, completed: usize) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (completed.min(self.total) * 100 / self.total) as u8
    }
}
