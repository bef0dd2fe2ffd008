//! Dispatching work onto serial execution queues.
//!
//! A [`SchedulerQueue`] is a cloneable handle onto a serial queue of jobs.
//! Background queues are drained by a dedicated worker thread. The main queue
//! is drained by the host through its [`MainLoop`], the way a UI run loop would.

use crate::error::SchedulerError;
use futures::channel::mpsc;
use futures::StreamExt;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueInner {
    label: String,
    sender: mpsc::UnboundedSender<Job>,
}

/// Handle onto a serial job queue.
#[derive(Clone)]
pub struct SchedulerQueue {
    inner: Arc<QueueInner>,
}

impl SchedulerQueue {
    /// Create a main queue whose jobs run only when the host drives the
    /// returned [`MainLoop`].
    pub fn main(label: impl Into<String>) -> (Self, MainLoop) {
        let label = label.into();
        let (sender, receiver) = mpsc::unbounded();
        let queue = Self::from_parts(label.clone(), sender);
        (queue, MainLoop { label, receiver })
    }

    /// Create a queue drained by its own worker thread.
    pub fn background(label: impl Into<String>) -> Result<Self, SchedulerError> {
        QueueBuilder::new(label).spawn()
    }

    pub fn builder(label: impl Into<String>) -> QueueBuilder {
        QueueBuilder::new(label)
    }

    fn from_parts(label: String, sender: mpsc::UnboundedSender<Job>) -> Self {
        Self {
            inner: Arc::new(QueueInner { label, sender }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Whether the consuming side of the queue is gone.
    pub fn is_closed(&self) -> bool {
        self.inner.sender.is_closed()
    }

    fn enqueue(&self, job: Job) -> Result<(), SchedulerError> {
        self.inner
            .sender
            .unbounded_send(job)
            .map_err(|_| SchedulerError::QueueClosed {
                label: self.inner.label.clone(),
            })
    }
}

impl fmt::Debug for SchedulerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerQueue")
            .field("label", &self.inner.label)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Configuration for a background queue's worker thread.
#[derive(Debug)]
pub struct QueueBuilder {
    label: String,
    stack_size: Option<usize>,
}

impl QueueBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stack_size: None,
        }
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Spawn the worker thread. It exits once every queue handle is dropped.
    pub fn spawn(self) -> Result<SchedulerQueue, SchedulerError> {
        let (sender, receiver) = mpsc::unbounded::<Job>();

        let mut builder = thread::Builder::new().name(self.label.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let label = self.label.clone();
        builder
            .spawn(move || {
                tracing::debug!(queue = %label, "queue worker started");
                futures::executor::block_on(receiver.for_each(|job| {
                    run_job(&label, job);
                    futures::future::ready(())
                }));
                tracing::debug!(queue = %label, "queue worker stopped");
            })
            .map_err(|source| SchedulerError::SpawnWorker {
                label: self.label.clone(),
                source,
            })?;

        Ok(SchedulerQueue::from_parts(self.label, sender))
    }
}

/// The consuming side of a main queue.
pub struct MainLoop {
    label: String,
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl MainLoop {
    /// Run every job queued so far without blocking. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            run_job(&self.label, job);
            ran += 1;
        }
        ran
    }

    /// Run jobs until every queue handle has been dropped.
    pub fn run(mut self) {
        futures::executor::block_on(async {
            while let Some(job) = self.receiver.next().await {
                run_job(&self.label, job);
            }
        });
    }
}

impl fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainLoop")
            .field("label", &self.label)
            .finish()
    }
}

fn run_job(label: &str, job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::error!(queue = %label, "scheduled job panicked");
    }
}

/// Dispatches work onto the queue it was created for.
#[derive(Clone, Debug)]
pub struct Scheduler {
    queue: SchedulerQueue,
}

impl Scheduler {
    pub fn new(queue: SchedulerQueue) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &SchedulerQueue {
        &self.queue
    }

    /// Schedule `work` without blocking. Work sent to a closed queue is
    /// dropped.
    pub fn dispatch_async(&self, work: impl FnOnce() + Send + 'static) {
        if let Err(err) = self.try_dispatch_async(work) {
            tracing::warn!(error = %err, "dropping scheduled work");
        }
    }

    /// Schedule `work`, reporting a closed queue.
    pub fn try_dispatch_async(
        &self,
        work: impl FnOnce() + Send + 'static,
    ) -> Result<(), SchedulerError> {
        tracing::trace!(queue = %self.queue.label(), "dispatching work");
        self.queue.enqueue(Box::new(work))
    }
}
