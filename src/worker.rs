use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::{ClipError, Result};
use crate::progress::{cancel_pair, CancelSignal, JobCanceller, JobState, ProgressReporter};
use crate::workflow::{ClipOutcome, ClipRequest, Workflow};

/// Jobs that may wait behind the running one
const QUEUE_DEPTH: usize = 8;

struct QueuedJob {
    id: Uuid,
    request: ClipRequest,
    progress: ProgressReporter,
    cancel: CancelSignal,
    result: oneshot::Sender<Result<ClipOutcome>>,
}

/// Background worker that runs batch jobs one at a time.
pub struct ClipWorker {
    sender: mpsc::Sender<QueuedJob>,
    task: JoinHandle<()>,
}

impl ClipWorker {
    pub fn spawn(workflow: Arc<Workflow>) -> Self {
        let (sender, mut receiver) = mpsc::channel::<QueuedJob>(QUEUE_DEPTH);

        let task = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let span = info_span!("clip_job", id = %job.id, word = %job.request.word);
                let result = workflow
                    .create_clips(&job.request, &job.progress, &job.cancel)
                    .instrument(span)
                    .await;

                if let Err(e) = &result {
                    job.progress.report(JobState::Failed(e.to_string()));
                }
                if job.result.send(result).is_err() {
                    debug!("Job {} finished after its handle was dropped", job.id);
                }
            }
            info!("Clip worker stopped");
        });

        Self { sender, task }
    }

    /// Queue a job; it starts once every earlier job has finished
    pub async fn submit(&self, request: ClipRequest) -> Result<JobHandle> {
        let id = Uuid::new_v4();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();
        let (canceller, cancel) = cancel_pair();

        info!("Queueing job {} for '{}'", id, request.word);
        self.sender
            .send(QueuedJob {
                id,
                request,
                progress: ProgressReporter::new(progress_tx),
                cancel,
                result: result_tx,
            })
            .await
            .map_err(|_| ClipError::Media("clip worker is not running".to_string()))?;

        Ok(JobHandle {
            id,
            progress: progress_rx,
            outcome: JobOutcome(result_rx),
            canceller,
        })
    }

    /// Stop accepting jobs and wait for queued ones to drain
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.task.await {
            debug!("Clip worker task ended abnormally: {}", e);
        }
    }
}

/// Caller side of a queued job.
pub struct JobHandle {
    pub id: Uuid,
    pub progress: mpsc::UnboundedReceiver<JobState>,
    pub outcome: JobOutcome,
    canceller: JobCanceller,
}

impl JobHandle {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Wait for the result, discarding progress
    pub async fn wait(self) -> Result<ClipOutcome> {
        self.outcome.await
    }
}

/// Resolves to the job's result.
pub struct JobOutcome(oneshot::Receiver<Result<ClipOutcome>>);

impl Future for JobOutcome {
    type Output = Result<ClipOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(ClipError::Media("clip worker stopped before finishing the job".to_string()))
            })
        })
    }
}
