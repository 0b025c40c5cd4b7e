use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use k8s_openapi::api::core::v1::Pod;
use kube::{Resource, ResourceExt};

use crate::errors::FollowError;

/// Pod identity (use UID to avoid confusing replaced pods).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PodKey {
    pub namespace: String,
    pub name: String,
    pub uid: String,
}

/// Follow identity = Pod + Container.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FollowKey {
    pub pod: PodKey,
    pub container: String,
}

impl FollowKey {
    pub fn new(pod: PodKey, container: impl Into<String>) -> Self {
        Self {
            pod,
            container: container.into(),
        }
    }
}

impl fmt::Display for FollowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}[{}]/{}",
            self.pod.namespace, self.pod.name, self.pod.uid, self.container
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
}

/// Point-in-time view of a pod as delivered with a lifecycle event.
#[derive(Clone, Debug, PartialEq)]
pub struct PodSnapshot {
    pub key: PodKey,
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<ContainerStatus>,
}

impl PodSnapshot {
    /// Builds a snapshot from an API object. Pods without a UID cannot be keyed and yield `None`.
    pub fn from_pod(pod: &Pod, namespace: &str) -> Option<Self> {
        let uid = pod.meta().uid.clone()?;
        let namespace = pod.namespace().unwrap_or_else(|| namespace.to_string());

        let containers = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|cs| ContainerStatus {
                        name: cs.name.clone(),
                        ready: cs.ready,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            key: PodKey {
                namespace,
                name: pod.name_any(),
                uid,
            },
            labels: pod.labels().clone(),
            containers,
        })
    }

    /// Names of the containers currently reporting ready.
    pub fn ready_containers(&self) -> impl Iterator<Item = &str> {
        self.containers
            .iter()
            .filter(|c| c.ready)
            .map(|c| c.name.as_str())
    }
}

/// Pod lifecycle events consumed by the dispatcher, in delivery order.
#[derive(Clone, Debug)]
pub enum PodEvent {
    Added(PodSnapshot),
    Modified(PodSnapshot),
    Deleted(PodSnapshot),
    /// Error reported in-band by the apiserver; the feed itself is still alive.
    Error(String),
}

impl PodEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PodEvent::Added(_) => "Added",
            PodEvent::Modified(_) => "Modified",
            PodEvent::Deleted(_) => "Deleted",
            PodEvent::Error(_) => "Error",
        }
    }
}

/// What a finished follower managed to copy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FollowSummary {
    pub bytes: u64,
    pub lines: u64,
}

/// Terminal result of one pipe task.
#[derive(Debug)]
pub struct FollowOutcome {
    pub key: FollowKey,
    pub path: PathBuf,
    pub result: Result<FollowSummary, FollowError>,
}
