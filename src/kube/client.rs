use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::errors::AppResult;

/// Builds a client from an explicit kubeconfig/context, or infers one
/// (`$KUBECONFIG`, `~/.kube/config`, then in-cluster) when neither is given.
pub async fn make_client(kubeconfig: Option<&Path>, context: Option<&str>) -> AppResult<Client> {
    let options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..Default::default()
    };

    let config = match (kubeconfig, context) {
        (Some(path), _) => {
            let kc = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kc, &options).await?
        }
        (None, Some(_)) => Config::from_kubeconfig(&options).await?,
        (None, None) => Config::infer().await?,
    };

    tracing::debug!(cluster_url = %config.cluster_url, "kubernetes client configured");

    let client = Client::try_from(config)?;
    Ok(client)
}
