pub mod dev;
pub mod dispatcher;
pub mod kube;
pub mod mock;
pub mod pipe;
pub mod registry;

use std::pin::Pin;

use async_trait::async_trait;
use futures::AsyncBufRead;

use crate::errors::BoxError;
use crate::types::PodKey;

/// Buffered byte stream of one container's log output.
pub type LogReader<'a> = Pin<Box<dyn AsyncBufRead + Send + 'a>>;

/// Resolves a pod container to something whose log can be opened.
pub trait LogSource: Send + Sync {
    fn target(&self, pod: &PodKey, container: &str) -> Box<dyn LogTarget>;
}

/// One container's log. The reader it opens may borrow from the target, so the
/// target must outlive the read loop.
#[async_trait]
pub trait LogTarget: Send + Sync {
    async fn open<'a>(&'a self) -> Result<LogReader<'a>, BoxError>;
}
