//! Scripted log source for exercising followers without a cluster

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use parking_lot::Mutex;

use crate::errors::BoxError;
use crate::stream::{LogReader, LogSource, LogTarget};
use crate::types::PodKey;

/// How the stream of one container behaves once opened.
#[derive(Clone, Debug)]
enum Script {
    /// Deliver the chunks, then end of stream.
    Finish(Vec<Vec<u8>>),
    /// Deliver the chunks, then never produce anything again.
    Hang(Vec<Vec<u8>>),
    /// Deliver the chunks, then fail the read.
    FailRead(Vec<Vec<u8>>),
    /// Refuse to open.
    FailOpen,
}

/// Log source whose per-container behaviour is configured up front.
///
/// Containers without a script open successfully and end immediately.
#[derive(Clone, Debug, Default)]
pub struct MockLogSource {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    opens: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream `chunks` for `container`, then end.
    pub fn finishing(self, container: &str, chunks: &[&[u8]]) -> Self {
        self.script(container, Script::Finish(to_owned(chunks)))
    }

    /// Stream `chunks` for `container`, then stay open forever.
    pub fn hanging(self, container: &str, chunks: &[&[u8]]) -> Self {
        self.script(container, Script::Hang(to_owned(chunks)))
    }

    /// Stream `chunks` for `container`, then fail with a read error.
    pub fn failing_read(self, container: &str, chunks: &[&[u8]]) -> Self {
        self.script(container, Script::FailRead(to_owned(chunks)))
    }

    /// Fail every attempt to open `container`.
    pub fn failing_open(self, container: &str) -> Self {
        self.script(container, Script::FailOpen)
    }

    /// Number of times the stream for `container` was opened.
    pub fn open_count(&self, container: &str) -> usize {
        self.opens.lock().get(container).copied().unwrap_or(0)
    }

    fn script(self, container: &str, script: Script) -> Self {
        self.scripts.lock().insert(container.to_string(), script);
        self
    }
}

fn to_owned(chunks: &[&[u8]]) -> Vec<Vec<u8>> {
    chunks.iter().map(|c| c.to_vec()).collect()
}

fn chunks(c: &[Vec<u8>]) -> BoxStream<'static, io::Result<Vec<u8>>> {
    stream::iter(c.to_vec().into_iter().map(Ok)).boxed()
}

impl LogSource for MockLogSource {
    fn target(&self, _pod: &PodKey, container: &str) -> Box<dyn LogTarget> {
        let script = self
            .scripts
            .lock()
            .get(container)
            .cloned()
            .unwrap_or(Script::Finish(Vec::new()));

        Box::new(MockLogTarget {
            container: container.to_string(),
            script,
            opens: self.opens.clone(),
        })
    }
}

struct MockLogTarget {
    container: String,
    script: Script,
    opens: Arc<Mutex<HashMap<String, usize>>>,
}

#[async_trait]
impl LogTarget for MockLogTarget {
    async fn open<'a>(&'a self) -> Result<LogReader<'a>, BoxError> {
        *self.opens.lock().entry(self.container.clone()).or_default() += 1;

        let body: BoxStream<'static, io::Result<Vec<u8>>> = match &self.script {
            Script::FailOpen => {
                return Err(format!("mock: cannot open log of {}", self.container).into());
            }
            Script::Finish(c) => chunks(c),
            Script::Hang(c) => chunks(c).chain(stream::pending()).boxed(),
            Script::FailRead(c) => chunks(c)
                .chain(stream::once(async {
                    Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "mock: stream reset",
                    ))
                }))
                .boxed(),
        };

        Ok(Box::pin(body.into_async_read()))
    }
}
