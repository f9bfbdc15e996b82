use std::sync::Arc;

/// Progress callback for hosts driving a batch (CLI bars, GUIs, tests).
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress events emitted while a batch runs.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Started { task: String, total: u64 },
    Progress { task: String, current: u64, total: u64 },
    Message { task: String, message: String },
    Completed { task: String },
    Error { task: String, error: String },
}

pub(crate) fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}
