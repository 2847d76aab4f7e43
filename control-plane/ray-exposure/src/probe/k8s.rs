use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::{Client, Config};

use super::{ClusterConnector, ClusterDiscovery, ProbeError};

/// Connects to the API server the detectors query.
///
/// A connector built with [`KubeConnector::new`] reuses the caller's client,
/// so classification shares its connection pool. [`KubeConnector::infer`]
/// loads configuration the way an in-cluster controller or a local
/// `kubectl` would: in-cluster service account first, then `KUBECONFIG`.
#[derive(Clone, Default)]
pub struct KubeConnector {
    client: Option<Client>,
}

impl KubeConnector {
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn infer() -> Self {
        Self::default()
    }
}

/// Outcome of the connector's configuration step.
pub enum KubeConfig {
    Shared(Client),
    Inferred(Config),
}

#[async_trait]
impl ClusterConnector for KubeConnector {
    type Config = KubeConfig;
    type Discovery = KubeDiscovery;

    async fn config(&self) -> Result<KubeConfig, ProbeError> {
        if let Some(client) = &self.client {
            return Ok(KubeConfig::Shared(client.clone()));
        }
        Config::infer()
            .await
            .map(KubeConfig::Inferred)
            .map_err(|e| ProbeError::ConfigUnavailable(e.to_string()))
    }

    fn discovery(
        &self,
        config: KubeConfig,
    ) -> Result<KubeDiscovery, ProbeError> {
        match config {
            KubeConfig::Shared(client) => Ok(KubeDiscovery::new(client)),
            KubeConfig::Inferred(config) => Client::try_from(config)
                .map(KubeDiscovery::new)
                .map_err(|e| ProbeError::DiscoveryUnavailable(e.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct KubeDiscovery {
    client: Client,
}

impl KubeDiscovery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterDiscovery for KubeDiscovery {
    async fn server_groups(&self) -> Result<Vec<String>, ProbeError> {
        let list = self
            .client
            .list_api_groups()
            .await
            .map_err(|e| ProbeError::DiscoveryQuery(e.to_string()))?;
        Ok(list.groups.into_iter().map(|g| g.name).collect())
    }

    async fn count_nodes(
        &self,
        label_selector: &str,
    ) -> Result<usize, ProbeError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let lp = ListParams::default().labels(label_selector);
        let list = nodes
            .list(&lp)
            .await
            .map_err(|e| ProbeError::NodeList(e.to_string()))?;
        Ok(list.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> Client {
        let _ = rustls::crypto::CryptoProvider::install_default(
            rustls::crypto::aws_lc_rs::default_provider(),
        );
        let config = Config::new("http://127.0.0.1:9".parse().unwrap());
        Client::try_from(config).unwrap()
    }

    #[tokio::test]
    async fn shared_client_skips_config_inference() {
        let conn = KubeConnector::new(unreachable_client());
        let config = conn.config().await.unwrap();
        assert!(matches!(config, KubeConfig::Shared(_)));
        assert!(conn.discovery(config).is_ok());
    }

    #[test]
    fn infer_holds_no_client() {
        assert!(KubeConnector::infer().client.is_none());
    }
}
