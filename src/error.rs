use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifeSyncError {
    #[error("Login failed: {0}")]
    Auth(String),

    #[error("Cloud sync failed: {0}")]
    Sync(String),

    #[error("Could not parse task. Please try again.")]
    Parse,

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Local storage failure: {0:#}")]
    StorageFault(#[source] anyhow::Error),
}

impl LifeSyncError {
    pub fn storage(err: anyhow::Error) -> Self {
        LifeSyncError::StorageFault(err)
    }
}

pub type Result<T> = std::result::Result<T, LifeSyncError>;
