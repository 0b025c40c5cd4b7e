use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{api::LogParams, Api, Client};

use crate::errors::BoxError;
use crate::stream::{LogReader, LogSource, LogTarget};
use crate::types::PodKey;

/// Log source backed by the pod `log` subresource.
#[derive(Clone)]
pub struct KubeLogSource {
    client: Client,
}

impl KubeLogSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl LogSource for KubeLogSource {
    fn target(&self, pod: &PodKey, container: &str) -> Box<dyn LogTarget> {
        // No timestamps: bytes land on disk exactly as the container wrote them.
        let params = LogParams {
            follow: true,
            timestamps: false,
            container: Some(container.to_string()),
            ..Default::default()
        };

        Box::new(KubeLogTarget {
            api: Api::namespaced(self.client.clone(), &pod.namespace),
            pod: pod.name.clone(),
            params,
        })
    }
}

struct KubeLogTarget {
    api: Api<Pod>,
    pod: String,
    params: LogParams,
}

#[async_trait]
impl LogTarget for KubeLogTarget {
    async fn open<'a>(&'a self) -> Result<LogReader<'a>, BoxError> {
        let reader = self.api.log_stream(&self.pod, &self.params).await?;
        Ok(Box::pin(reader))
    }
}
