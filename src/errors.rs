use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures that end the whole process: without a feed there is nothing to follow.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Cli(String),

    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("cannot infer cluster config: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("pod watch failed: {0}")]
    Watch(#[from] kube_runtime::watcher::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Failures contained within a single follower.
#[derive(Debug, Error)]
pub enum FollowError {
    #[error("failed to open log stream: {0}")]
    StreamOpen(#[source] BoxError),

    #[error("failed to create {}: {source}", .path.display())]
    FileCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read log stream: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
