pub mod cli;
pub mod config;
pub mod dev;
pub mod errors;
pub mod kube;
pub mod logging;
pub mod naming;
pub mod podwatch;
pub mod shutdown;
pub mod stream;
pub mod types;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::config::{Config, SourceConfig};
use crate::errors::{AppError, AppResult};
use crate::shutdown::{Shutdown, ShutdownReason};
use crate::stream::dev::DevLogSource;
use crate::stream::dispatcher::Dispatcher;
use crate::stream::kube::KubeLogSource;
use crate::stream::registry::FollowerRegistry;
use crate::stream::LogSource;
use crate::types::PodEvent;

pub async fn run(config: Config) -> AppResult<()> {
    tokio::fs::create_dir_all(&config.out_dir).await?;

    let (tx, rx) = mpsc::channel::<PodEvent>(128);

    // Start the appropriate "pod source" depending on mode.
    let (watcher, source) = match &config.source {
        SourceConfig::Dev { rate_ms, max_lines } => {
            let source: Arc<dyn LogSource> = Arc::new(DevLogSource::new(*rate_ms, *max_lines));
            let watcher = crate::dev::pods::spawn_dev_pods(
                config.namespace.clone(),
                Duration::from_millis(*rate_ms),
                tx,
            );
            (watcher, source)
        }
        SourceConfig::Kube {
            kubeconfig,
            context,
        } => {
            let client =
                crate::kube::client::make_client(kubeconfig.as_deref(), context.as_deref())
                    .await?;
            let source: Arc<dyn LogSource> = Arc::new(KubeLogSource::new(client.clone()));
            let watcher = crate::podwatch::watcher::spawn_pod_watcher(
                client,
                config.namespace.clone(),
                config.selector.clone(),
                tx,
            );
            (watcher, source)
        }
    };

    let registry = match config.max_followers {
        Some(limit) => FollowerRegistry::with_limit(limit),
        None => FollowerRegistry::new(),
    };
    let mut dispatcher = Dispatcher::new(registry, source, config.out_dir.clone());

    tracing::info!(
        namespace = %config.namespace,
        selector = config.selector.as_deref().unwrap_or(""),
        out_dir = %config.out_dir.display(),
        "watching pods"
    );

    let shutdown = Shutdown::new();
    let stop = crate::shutdown::wait_for_signal(&shutdown);
    tokio::pin!(stop);

    let reason = event_loop(rx, &mut dispatcher, &mut stop).await;

    if reason != ShutdownReason::FeedEnded {
        tracing::info!(?reason, active = dispatcher.active(), "shutting down");
        watcher.abort();
        return Ok(());
    }

    // The feed dropped its sender, so the task is done and this does not block.
    match watcher.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(e) => return Err(AppError::Other(format!("pod watcher task failed: {e}"))),
    }

    tracing::info!(
        active = dispatcher.active(),
        "pod feed ended; waiting for followers"
    );

    loop {
        tokio::select! {
            outcome = dispatcher.join_next() => {
                if outcome.is_none() {
                    break;
                }
            }
            reason = &mut stop => {
                tracing::info!(?reason, active = dispatcher.active(), "shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Feeds pod events to the dispatcher one at a time, in delivery order, until the
/// feed closes or `stop` resolves.
pub async fn event_loop<F>(
    mut rx: mpsc::Receiver<PodEvent>,
    dispatcher: &mut Dispatcher,
    stop: &mut F,
) -> ShutdownReason
where
    F: Future<Output = ShutdownReason> + Unpin,
{
    loop {
        tokio::select! {
            reason = &mut *stop => return reason,
            event = rx.recv() => {
                let Some(event) = event else {
                    return ShutdownReason::FeedEnded;
                };

                tracing::debug!(kind = event.kind(), "pod event");
                dispatcher.dispatch(event);

                // Outcomes are logged by the followers themselves.
                dispatcher.reap();
            }
        }
    }
}
