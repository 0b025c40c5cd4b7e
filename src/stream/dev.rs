use std::io;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::time::{sleep, Duration};

use crate::errors::BoxError;
use crate::stream::{LogReader, LogSource, LogTarget};
use crate::types::PodKey;

/// Synthetic log source for running without a cluster.
#[derive(Clone, Debug)]
pub struct DevLogSource {
    rate_ms: u64,
    max_lines: Option<u64>,
}

impl DevLogSource {
    pub fn new(rate_ms: u64, max_lines: Option<u64>) -> Self {
        Self { rate_ms, max_lines }
    }
}

impl LogSource for DevLogSource {
    fn target(&self, pod: &PodKey, container: &str) -> Box<dyn LogTarget> {
        Box::new(DevLogTarget {
            prefix: format!("{}/{}", pod.name, container),
            rate_ms: self.rate_ms,
            max_lines: self.max_lines,
        })
    }
}

struct DevLogTarget {
    prefix: String,
    rate_ms: u64,
    max_lines: Option<u64>,
}

#[async_trait]
impl LogTarget for DevLogTarget {
    async fn open<'a>(&'a self) -> Result<LogReader<'a>, BoxError> {
        let rate = Duration::from_millis(self.rate_ms);
        let max_lines = self.max_lines;
        let prefix = self.prefix.clone();

        let lines = stream::unfold(0u64, move |counter| {
            let prefix = prefix.clone();
            async move {
                if max_lines.is_some_and(|max| counter >= max) {
                    return None;
                }
                if counter > 0 {
                    sleep(rate).await;
                }
                let line = format!("{prefix} log line {}\n", counter + 1);
                Some((Ok::<_, io::Error>(line.into_bytes()), counter + 1))
            }
        });

        Ok(Box::pin(lines.boxed().into_async_read()))
    }
}
