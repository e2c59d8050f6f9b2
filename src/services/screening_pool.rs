use crate::services::screening_service::ScreeningService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct ScreeningJob {
    pub candidate_id: Uuid,
    pub job_description: Option<String>,
}

/// Bounded in-process pool for fire-and-forget screenings. A fixed queue
/// feeds named workers: `core` of them start eagerly and more are added up
/// to `max` while the queue runs hot. When the queue is full the submitting
/// task runs the job itself (caller-runs back-pressure), so jobs are never
/// dropped. Shutdown closes the queue and waits up to 60 seconds for
/// in-flight work to drain.
#[derive(Clone)]
pub struct ScreeningPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    service: ScreeningService,
    sender: std::sync::Mutex<Option<mpsc::Sender<ScreeningJob>>>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<ScreeningJob>>>,
    queue_capacity: usize,
    max_workers: usize,
    worker_count: AtomicUsize,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl ScreeningPool {
    pub fn new(service: ScreeningService, core: usize, max: usize, queue: usize) -> Self {
        let core = core.max(1);
        let max = max.max(core);
        let queue = queue.max(1);
        let (sender, receiver) = mpsc::channel(queue);

        let pool = Self {
            inner: Arc::new(PoolInner {
                service,
                sender: std::sync::Mutex::new(Some(sender)),
                receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
                queue_capacity: queue,
                max_workers: max,
                worker_count: AtomicUsize::new(0),
                handles: std::sync::Mutex::new(Vec::new()),
            }),
        };

        for _ in 0..core {
            pool.try_spawn_worker();
        }
        info!(core, max, queue, "screening pool started");
        pool
    }

    /// Enqueues a screening; runs it inline when the queue is full.
    pub async fn submit(&self, job: ScreeningJob) {
        let sender = self.inner.sender.lock().expect("pool lock poisoned").clone();
        let Some(sender) = sender else {
            // Pool already shutting down; do the work here rather than lose it.
            run_job(&self.inner.service, job).await;
            return;
        };

        if sender.capacity() < self.inner.queue_capacity / 2 {
            self.try_spawn_worker();
        }

        match sender.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                warn!(candidate_id = %job.candidate_id, "screening queue full, running job on caller");
                run_job(&self.inner.service, job).await;
            }
            Err(TrySendError::Closed(job)) => {
                run_job(&self.inner.service, job).await;
            }
        }
    }

    /// Closes the queue and waits for workers to drain the backlog, bounded
    /// by the shutdown grace period.
    pub async fn shutdown(&self) {
        self.inner.sender.lock().expect("pool lock poisoned").take();

        let handles: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.inner.handles.lock().expect("pool lock poisoned"));
        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;

        for handle in handles {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if tokio::time::timeout(remaining, handle).await.is_err() {
                warn!("screening pool shutdown timed out with jobs still in flight");
                return;
            }
        }
        info!("screening pool drained");
    }

    fn try_spawn_worker(&self) -> bool {
        let inner = &self.inner;
        let mut current = inner.worker_count.load(Ordering::SeqCst);
        loop {
            if current >= inner.max_workers {
                return false;
            }
            match inner.worker_count.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        let worker = current + 1;
        let receiver = inner.receiver.clone();
        let service = inner.service.clone();
        let span =
            tracing::info_span!("screening_worker", worker = %format!("screening-worker-{worker}"));

        let handle = tokio::spawn(
            async move {
                debug!("worker started");
                loop {
                    // Lock only to dequeue; jobs run with the queue released
                    // so workers process concurrently.
                    let job = { receiver.lock().await.recv().await };
                    match job {
                        Some(job) => run_job(&service, job).await,
                        None => break,
                    }
                }
                debug!("worker exiting");
            }
            .instrument(span),
        );

        inner
            .handles
            .lock()
            .expect("pool lock poisoned")
            .push(handle);
        true
    }
}

async fn run_job(service: &ScreeningService, job: ScreeningJob) {
    match service
        .screen_candidate(job.candidate_id, job.job_description.as_deref())
        .await
    {
        Ok(screening) => info!(
            candidate_id = %job.candidate_id,
            match_score = screening.match_score,
            "async screening finished"
        ),
        Err(e) => error!(
            candidate_id = %job.candidate_id,
            error = %e,
            "async screening failed"
        ),
    }
}
