use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kube_lograb::errors::FollowError;
use kube_lograb::naming::log_file_path;
use kube_lograb::stream::dispatcher::Dispatcher;
use kube_lograb::stream::mock::MockLogSource;
use kube_lograb::stream::registry::FollowerRegistry;
use kube_lograb::types::{ContainerStatus, FollowKey, PodEvent, PodKey, PodSnapshot};
use tempfile::TempDir;
use tokio::time::{sleep, timeout, Duration};

fn pod_key() -> PodKey {
    PodKey {
        namespace: "che".into(),
        name: "workspace-1".into(),
        uid: "uid-1".into(),
    }
}

fn snapshot(containers: &[(&str, bool)]) -> PodSnapshot {
    PodSnapshot {
        key: pod_key(),
        labels: BTreeMap::new(),
        containers: containers
            .iter()
            .map(|(name, ready)| ContainerStatus {
                name: name.to_string(),
                ready: *ready,
            })
            .collect(),
    }
}

fn key(container: &str) -> FollowKey {
    FollowKey::new(pod_key(), container)
}

fn dispatcher(dir: &TempDir, source: &MockLogSource, registry: FollowerRegistry) -> Dispatcher {
    Dispatcher::new(
        registry,
        Arc::new(source.clone()),
        dir.path().to_path_buf(),
    )
}

fn path_of(dir: &TempDir, container: &str) -> PathBuf {
    log_file_path(dir.path(), &key(container))
}

async fn wait_for_contents(path: &Path, expected: &[u8]) {
    let waited = timeout(Duration::from_secs(5), async {
        loop {
            if std::fs::read(path).map(|b| b == expected).unwrap_or(false) {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(
        waited.is_ok(),
        "{} never contained {:?}",
        path.display(),
        String::from_utf8_lossy(expected)
    );
}

#[tokio::test]
async fn added_then_modified_follows_each_ready_container_once() {
    let dir = TempDir::new().unwrap();
    let source = MockLogSource::new()
        .hanging("a", &[b"a1\n"])
        .finishing("b", &[b"b1\n", b"b2\n"]);
    let mut dispatcher = dispatcher(&dir, &source, FollowerRegistry::new());

    let started = dispatcher.dispatch(PodEvent::Added(snapshot(&[("a", true), ("b", false)])));
    assert_eq!(started, vec![key("a")]);
    assert!(!path_of(&dir, "b").exists());

    wait_for_contents(&path_of(&dir, "a"), b"a1\n").await;

    let started =
        dispatcher.dispatch(PodEvent::Modified(snapshot(&[("a", true), ("b", true)])));
    assert_eq!(started, vec![key("b")]);

    let outcome = dispatcher.join_next().await.unwrap();
    assert_eq!(outcome.key, key("b"));
    assert_eq!(outcome.result.unwrap().lines, 2);
    assert_eq!(std::fs::read(path_of(&dir, "b")).unwrap(), b"b1\nb2\n");

    // The first follower kept its stream and its file.
    assert_eq!(source.open_count("a"), 1);
    assert_eq!(source.open_count("b"), 1);
    assert_eq!(std::fs::read(path_of(&dir, "a")).unwrap(), b"a1\n");
    assert!(dispatcher.registry().contains(&key("a")));
    assert!(!dispatcher.registry().contains(&key("b")));
    assert_eq!(dispatcher.active(), 1);
}

#[tokio::test]
async fn failed_open_does_not_affect_other_containers() {
    let dir = TempDir::new().unwrap();
    let source = MockLogSource::new()
        .finishing("a", &[b"from a\n"])
        .failing_open("c")
        .finishing("d", &[b"from d"]);
    let mut dispatcher = dispatcher(&dir, &source, FollowerRegistry::new());

    let started = dispatcher.dispatch(PodEvent::Added(snapshot(&[
        ("a", true),
        ("c", true),
        ("d", true),
    ])));
    assert_eq!(started.len(), 3);

    let mut failed = Vec::new();
    while let Some(outcome) = dispatcher.join_next().await {
        if let Err(e) = outcome.result {
            assert!(matches!(e, FollowError::StreamOpen(_)));
            failed.push(outcome.key);
        }
    }

    assert_eq!(failed, vec![key("c")]);
    assert!(!path_of(&dir, "c").exists());
    assert_eq!(std::fs::read(path_of(&dir, "a")).unwrap(), b"from a\n");
    assert_eq!(std::fs::read(path_of(&dir, "d")).unwrap(), b"from d");
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test]
async fn next_event_retries_a_failed_follower() {
    let dir = TempDir::new().unwrap();
    let source = MockLogSource::new().failing_open("a");
    let mut dispatcher = dispatcher(&dir, &source, FollowerRegistry::new());

    dispatcher.dispatch(PodEvent::Added(snapshot(&[("a", true)])));
    let outcome = dispatcher.join_next().await.unwrap();
    assert!(outcome.result.is_err());
    assert!(dispatcher.registry().is_empty());

    // The container recovers; only a later pod event picks it up again.
    let _ = source.clone().finishing("a", &[b"back\n"]);
    assert_eq!(source.open_count("a"), 1);

    let started = dispatcher.dispatch(PodEvent::Modified(snapshot(&[("a", true)])));
    assert_eq!(started, vec![key("a")]);

    let outcome = dispatcher.join_next().await.unwrap();
    assert!(outcome.result.is_ok());
    assert_eq!(source.open_count("a"), 2);
    assert_eq!(std::fs::read(path_of(&dir, "a")).unwrap(), b"back\n");
}

#[tokio::test]
async fn deleted_and_error_events_start_nothing_and_stop_nothing() {
    let dir = TempDir::new().unwrap();
    let source = MockLogSource::new().hanging("a", &[b"still here\n"]);
    let mut dispatcher = dispatcher(&dir, &source, FollowerRegistry::new());

    dispatcher.dispatch(PodEvent::Added(snapshot(&[("a", true)])));
    wait_for_contents(&path_of(&dir, "a"), b"still here\n").await;

    assert!(dispatcher
        .dispatch(PodEvent::Deleted(snapshot(&[("a", true), ("b", true)])))
        .is_empty());
    assert!(dispatcher
        .dispatch(PodEvent::Error("too old resource version".into()))
        .is_empty());

    assert!(dispatcher.registry().contains(&key("a")));
    assert_eq!(dispatcher.active(), 1);
    assert!(dispatcher.reap().is_empty());
    assert!(!path_of(&dir, "b").exists());
}

#[tokio::test]
async fn modified_while_following_does_not_reopen_or_truncate() {
    let dir = TempDir::new().unwrap();
    let source = MockLogSource::new().hanging("a", &[b"first\n"]);
    let mut dispatcher = dispatcher(&dir, &source, FollowerRegistry::new());

    dispatcher.dispatch(PodEvent::Added(snapshot(&[("a", true)])));
    wait_for_contents(&path_of(&dir, "a"), b"first\n").await;

    for _ in 0..5 {
        let started = dispatcher.dispatch(PodEvent::Modified(snapshot(&[("a", true)])));
        assert!(started.is_empty());
    }

    sleep(Duration::from_millis(50)).await;
    assert_eq!(source.open_count("a"), 1);
    assert_eq!(std::fs::read(path_of(&dir, "a")).unwrap(), b"first\n");
}

#[tokio::test]
async fn follower_limit_defers_until_a_slot_frees() {
    let dir = TempDir::new().unwrap();
    let source = MockLogSource::new()
        .finishing("a", &[b"a\n"])
        .finishing("b", &[b"b\n"]);
    let mut dispatcher = dispatcher(&dir, &source, FollowerRegistry::with_limit(1));

    let started = dispatcher.dispatch(PodEvent::Added(snapshot(&[("a", true), ("b", true)])));
    assert_eq!(started, vec![key("a")]);

    dispatcher.join_next().await.unwrap().result.unwrap();

    let started =
        dispatcher.dispatch(PodEvent::Modified(snapshot(&[("a", false), ("b", true)])));
    assert_eq!(started, vec![key("b")]);

    dispatcher.join_next().await.unwrap().result.unwrap();
    assert_eq!(std::fs::read(path_of(&dir, "b")).unwrap(), b"b\n");
}

#[tokio::test]
async fn replaced_pod_gets_its_own_follower() {
    let dir = TempDir::new().unwrap();
    let source = MockLogSource::new().hanging("a", &[b"x\n"]);
    let mut dispatcher = dispatcher(&dir, &source, FollowerRegistry::new());

    dispatcher.dispatch(PodEvent::Added(snapshot(&[("a", true)])));

    let mut replacement = snapshot(&[("a", true)]);
    replacement.key.uid = "uid-2".into();
    let started = dispatcher.dispatch(PodEvent::Added(replacement));

    assert_eq!(started.len(), 1);
    assert_eq!(started[0].pod.uid, "uid-2");
    assert_eq!(dispatcher.registry().len(), 2);
}
