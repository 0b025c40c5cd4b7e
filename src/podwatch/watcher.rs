use std::collections::HashSet;

use futures::{pin_mut, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::AppResult;
use crate::types::{PodEvent, PodSnapshot};

/// Watches pods in `namespace` and forwards their lifecycle as [`PodEvent`]s.
///
/// The task ends with `Ok` when the receiver goes away, and with an error when the
/// watch itself fails. Errors the apiserver reports inside an otherwise healthy
/// watch are forwarded as [`PodEvent::Error`].
pub fn spawn_pod_watcher(
    client: Client,
    namespace: String,
    selector: Option<String>,
    tx: mpsc::Sender<PodEvent>,
) -> JoinHandle<AppResult<()>> {
    tokio::spawn(async move {
        let api: Api<Pod> = Api::namespaced(client, &namespace);

        let mut wc = watcher::Config::default();
        if let Some(selector) = selector.as_deref() {
            wc = wc.labels(selector);
        }

        let stream = watcher(api, wc);
        pin_mut!(stream);

        let mut classifier = EventClassifier::default();

        while let Some(item) = stream.next().await {
            let ev = match item {
                Ok(ev) => ev,
                Err(watcher::Error::WatchError(e)) => {
                    if tx.send(PodEvent::Error(e.to_string())).await.is_err() {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let event = match ev {
                watcher::Event::Apply(pod) | watcher::Event::InitApply(pod) => {
                    classifier.applied(&pod, &namespace)
                }
                watcher::Event::Delete(pod) => classifier.deleted(&pod, &namespace),
                watcher::Event::Init | watcher::Event::InitDone => None,
            };

            if let Some(event) = event {
                if tx.send(event).await.is_err() {
                    return Ok(());
                }
            }
        }

        Ok(())
    })
}

/// Splits the watcher's "applied" events into first sightings and updates.
#[derive(Debug, Default)]
struct EventClassifier {
    seen: HashSet<String>,
}

impl EventClassifier {
    fn applied(&mut self, pod: &Pod, namespace: &str) -> Option<PodEvent> {
        let Some(snapshot) = PodSnapshot::from_pod(pod, namespace) else {
            tracing::debug!(pod = %pod.name_any(), "skipping pod without uid");
            return None;
        };

        if self.seen.insert(snapshot.key.uid.clone()) {
            Some(PodEvent::Added(snapshot))
        } else {
            Some(PodEvent::Modified(snapshot))
        }
    }

    fn deleted(&mut self, pod: &Pod, namespace: &str) -> Option<PodEvent> {
        let snapshot = PodSnapshot::from_pod(pod, namespace)?;
        self.seen.remove(&snapshot.key.uid);
        Some(PodEvent::Deleted(snapshot))
    }
}
