use thiserror::Error;

/// Errors raised when scheduling work onto a queue.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler queue `{label}` is closed")]
    QueueClosed { label: String },

    #[error("failed to spawn worker thread for queue `{label}`")]
    SpawnWorker {
        label: String,
        #[source]
        source: std::io::Error,
    },
}
