use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use crate::errors::AppResult;
use crate::types::{ContainerStatus, PodEvent, PodKey, PodSnapshot};

/// Scripted pod lifecycle for running without a cluster: `app` becomes ready first,
/// `sidecar` follows on a later update, then the pod goes away and the feed ends.
pub fn spawn_dev_pods(
    namespace: String,
    step: Duration,
    tx: mpsc::Sender<PodEvent>,
) -> tokio::task::JoinHandle<AppResult<()>> {
    tokio::spawn(async move {
        tracing::info!("starting dev-mode pod source");

        let key = PodKey {
            namespace,
            name: "dev-pod-1".to_string(),
            uid: "dev-uid-1".to_string(),
        };

        let snapshot = |sidecar_ready: bool| PodSnapshot {
            key: key.clone(),
            labels: BTreeMap::from([("app".to_string(), "dev".to_string())]),
            containers: vec![
                ContainerStatus {
                    name: "app".to_string(),
                    ready: true,
                },
                ContainerStatus {
                    name: "sidecar".to_string(),
                    ready: sidecar_ready,
                },
            ],
        };

        let script = [
            PodEvent::Added(snapshot(false)),
            PodEvent::Modified(snapshot(true)),
            PodEvent::Modified(snapshot(true)),
            PodEvent::Deleted(snapshot(true)),
        ];

        for event in script {
            if tx.send(event).await.is_err() {
                return Ok(());
            }
            sleep(step).await;
        }

        tracing::info!("dev-mode pod source finished");

        Ok(())
    })
}
