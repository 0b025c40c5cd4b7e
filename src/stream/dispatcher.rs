use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};

use crate::errors::FollowError;
use crate::naming::log_file_path;
use crate::stream::pipe::pipe_to_file;
use crate::stream::registry::{FollowerRegistry, Rejected};
use crate::stream::LogSource;
use crate::types::{FollowKey, FollowOutcome, FollowSummary, PodEvent, PodSnapshot};

/// Turns pod lifecycle events into follower tasks.
///
/// Every ready container of an added or modified pod is offered to the registry;
/// accepted keys get their own task, so a slow stream never holds up the next event.
/// Deleted pods keep their followers until the remote stream ends.
pub struct Dispatcher {
    registry: FollowerRegistry,
    source: Arc<dyn LogSource>,
    out_dir: PathBuf,
    tasks: JoinSet<FollowOutcome>,
}

impl Dispatcher {
    pub fn new(registry: FollowerRegistry, source: Arc<dyn LogSource>, out_dir: PathBuf) -> Self {
        Self {
            registry,
            source,
            out_dir,
            tasks: JoinSet::new(),
        }
    }

    pub fn registry(&self) -> &FollowerRegistry {
        &self.registry
    }

    /// Handles one event. Returns the keys whose follower was started by it.
    pub fn dispatch(&mut self, event: PodEvent) -> Vec<FollowKey> {
        match event {
            PodEvent::Added(pod) | PodEvent::Modified(pod) => self.follow_ready(&pod),
            PodEvent::Deleted(pod) => {
                tracing::debug!(
                    namespace = %pod.key.namespace,
                    pod = %pod.key.name,
                    uid = %pod.key.uid,
                    "pod deleted; followers run until their streams end"
                );
                Vec::new()
            }
            PodEvent::Error(message) => {
                tracing::warn!(error = %message, "pod watch reported an error");
                Vec::new()
            }
        }
    }

    fn follow_ready(&mut self, pod: &PodSnapshot) -> Vec<FollowKey> {
        let mut started = Vec::new();

        for container in pod.ready_containers() {
            let key = FollowKey::new(pod.key.clone(), container);

            let guard = match self.registry.acquire(key.clone()) {
                Ok(guard) => guard,
                Err(Rejected::AlreadyFollowed) => {
                    tracing::debug!(
                        pod = %key.pod.name,
                        container = %key.container,
                        "already following"
                    );
                    continue;
                }
                Err(Rejected::AtCapacity) => {
                    tracing::warn!(
                        pod = %key.pod.name,
                        container = %key.container,
                        active = self.registry.len(),
                        "follower limit reached; waiting for the next pod event"
                    );
                    continue;
                }
            };

            let path = log_file_path(&self.out_dir, &key);
            let source = self.source.clone();
            let task_key = key.clone();

            self.tasks.spawn(async move {
                let result = pipe_to_file(&*source, guard, &path).await;
                report(&task_key, &path, &result);
                FollowOutcome {
                    key: task_key,
                    path,
                    result,
                }
            });

            started.push(key);
        }

        started
    }

    /// Number of follower tasks that have not been collected yet.
    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    /// Collects every follower that has already finished, without waiting.
    pub fn reap(&mut self) -> Vec<FollowOutcome> {
        let mut done = Vec::new();
        while let Some(res) = self.tasks.try_join_next() {
            if let Some(outcome) = collect(res) {
                done.push(outcome);
            }
        }
        done
    }

    /// Waits for the next follower to finish. `None` once no followers remain.
    pub async fn join_next(&mut self) -> Option<FollowOutcome> {
        while let Some(res) = self.tasks.join_next().await {
            if let Some(outcome) = collect(res) {
                return Some(outcome);
            }
        }
        None
    }
}

fn collect(res: Result<FollowOutcome, JoinError>) -> Option<FollowOutcome> {
    match res {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!(error = %e, "follower task failed");
            None
        }
    }
}

fn report(key: &FollowKey, path: &Path, result: &Result<FollowSummary, FollowError>) {
    match result {
        Ok(summary) => tracing::info!(
            namespace = %key.pod.namespace,
            pod = %key.pod.name,
            container = %key.container,
            path = %path.display(),
            bytes = summary.bytes,
            lines = summary.lines,
            "end of log"
        ),
        Err(e) => tracing::warn!(
            namespace = %key.pod.namespace,
            pod = %key.pod.name,
            container = %key.container,
            path = %path.display(),
            error = %e,
            "failed to follow container log"
        ),
    }
}
