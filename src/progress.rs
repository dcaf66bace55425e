use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Where a batch job currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Matching,
    /// Encoding clip `current` (1-based) of `total`
    Encoding { current: usize, total: usize },
    Merging { clips: usize },
    Complete { clips: Vec<PathBuf> },
    Failed(String),
}

/// Advisory progress sink. A closed or missing receiver never fails a job.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<mpsc::UnboundedSender<JobState>>,
}

impl ProgressReporter {
    pub fn new(sender: mpsc::UnboundedSender<JobState>) -> Self {
        Self { sender: Some(sender) }
    }

    /// Reporter that drops every update
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, state: JobState) {
        debug!("Job state: {:?}", state);
        if let Some(sender) = &self.sender {
            // Nobody listening is fine
            let _ = sender.send(state);
        }
    }
}

/// Read side of a cancellation flag, checked between steps of a job.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    receiver: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// Signal that is never raised
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// Write side of a cancellation flag.
#[derive(Debug, Clone)]
pub struct JobCanceller {
    sender: Arc<watch::Sender<bool>>,
}

impl JobCanceller {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

pub fn cancel_pair() -> (JobCanceller, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (
        JobCanceller { sender: Arc::new(sender) },
        CancelSignal { receiver: Some(receiver) },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_ignores_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ProgressReporter::new(tx).report(JobState::Matching);
        ProgressReporter::silent().report(JobState::Idle);
    }

    #[test]
    fn test_reporter_delivers_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ProgressReporter::new(tx);
        reporter.report(JobState::Matching);
        reporter.report(JobState::Encoding { current: 1, total: 2 });

        assert_eq!(rx.try_recv().unwrap(), JobState::Matching);
        assert_eq!(rx.try_recv().unwrap(), JobState::Encoding { current: 1, total: 2 });
    }

    #[test]
    fn test_cancel_pair() {
        let (canceller, signal) = cancel_pair();
        let observer = signal.clone();
        assert!(!signal.is_cancelled());

        canceller.clone().cancel();
        assert!(signal.is_cancelled());
        assert!(observer.is_cancelled());
        assert!(!CancelSignal::never().is_cancelled());
    }
}
