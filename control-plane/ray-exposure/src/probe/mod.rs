//! Classification of the Kubernetes flavour a Ray cluster runs on.
//!
//! The prober walks an ordered chain: obtain a config, obtain a discovery
//! handle, then run each [`Detector`] in [`DETECTION_ORDER`] until one
//! decides. Every external call is bounded by a [`ProbeContext`] and every
//! failure maps to a fixed fallback, so classification itself never fails.

mod k8s;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::cluster::ManagedCluster;
use crate::config::ExposureConfig;

pub use k8s::{KubeConfig, KubeConnector, KubeDiscovery};

/// API groups served only by OpenShift end with this suffix.
pub const OPENSHIFT_GROUP_SUFFIX: &str = ".openshift.io";
/// Label carried by the control-plane node of a default KinD cluster.
pub const KIND_NODE_SELECTOR: &str =
    "kubernetes.io/hostname=kind-control-plane";
/// Dashboard host used on KinD when no ingress domain is configured.
pub const KIND_HOST: &str = "kind";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClusterEnvironment {
    /// Exposed through Routes; the router assigns hosts.
    OpenShift,
    /// Local KinD cluster without a configured domain.
    LocalDevCluster { host: String },
    /// Plain Kubernetes; host is `ray-dashboard-<name>-<namespace>.<domain>`.
    Vanilla { host: String },
    /// Discovery answered with an error. Not the same as `Vanilla`.
    Indeterminate,
}

impl ClusterEnvironment {
    pub fn vanilla(cluster: &ManagedCluster, ingress_domain: &str) -> Self {
        ClusterEnvironment::Vanilla {
            host: dashboard_host(cluster, ingress_domain),
        }
    }

    /// Derived dashboard host; empty for OpenShift and indeterminate results.
    pub fn host(&self) -> &str {
        match self {
            ClusterEnvironment::LocalDevCluster { host }
            | ClusterEnvironment::Vanilla { host } => host,
            ClusterEnvironment::OpenShift
            | ClusterEnvironment::Indeterminate => "",
        }
    }

    pub fn is_openshift(&self) -> bool {
        matches!(self, ClusterEnvironment::OpenShift)
    }
}

impl fmt::Display for ClusterEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterEnvironment::OpenShift => write!(f, "OpenShift"),
            ClusterEnvironment::LocalDevCluster { .. } => {
                write!(f, "LocalDevCluster")
            }
            ClusterEnvironment::Vanilla { .. } => write!(f, "Vanilla"),
            ClusterEnvironment::Indeterminate => write!(f, "Indeterminate"),
        }
    }
}

pub fn dashboard_host(
    cluster: &ManagedCluster,
    ingress_domain: &str,
) -> String {
    format!(
        "ray-dashboard-{}-{}.{}",
        cluster.name, cluster.namespace, ingress_domain
    )
}

#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("cluster config unavailable: {0}")]
    ConfigUnavailable(String),
    #[error("discovery client unavailable: {0}")]
    DiscoveryUnavailable(String),
    #[error("querying served API groups failed: {0}")]
    DiscoveryQuery(String),
    #[error("listing nodes failed: {0}")]
    NodeList(String),
    #[error("probe cancelled")]
    Cancelled,
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Caller-owned bounds for the external calls made while probing.
#[derive(Clone, Debug)]
pub struct ProbeContext {
    cancel: CancellationToken,
    timeout: Duration,
}

impl ProbeContext {
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    pub fn from_config(
        cfg: &ExposureConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self::new(cancel, cfg.probe_timeout())
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `fut` unless the context is cancelled or the timeout elapses first.
    pub async fn bounded<T, F>(&self, fut: F) -> Result<T, ProbeError>
    where
        F: Future<Output = Result<T, ProbeError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProbeError::Cancelled),
            res = tokio::time::timeout(self.timeout, fut) => {
                res.unwrap_or(Err(ProbeError::Timeout(self.timeout)))
            }
        }
    }
}

impl Default for ProbeContext {
    fn default() -> Self {
        Self::new(CancellationToken::new(), Duration::from_secs(10))
    }
}

/// Two-step access to a cluster: load a client config, then build a
/// discovery handle from it. Either step failing means "assume vanilla".
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    type Config: Send;
    type Discovery: ClusterDiscovery;

    async fn config(&self) -> Result<Self::Config, ProbeError>;

    fn discovery(
        &self,
        config: Self::Config,
    ) -> Result<Self::Discovery, ProbeError>;
}

/// Read-only queries the detectors run against a connected cluster.
#[async_trait]
pub trait ClusterDiscovery: Send + Sync {
    /// Names of all served API groups.
    async fn server_groups(&self) -> Result<Vec<String>, ProbeError>;

    /// Number of nodes matching `label_selector`.
    async fn count_nodes(&self, label_selector: &str)
    -> Result<usize, ProbeError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detector {
    OpenShiftApiGroups,
    LocalDevNode,
}

/// Order is significant: the first detector that decides wins.
pub const DETECTION_ORDER: [Detector; 2] =
    [Detector::OpenShiftApiGroups, Detector::LocalDevNode];

impl Detector {
    /// `None` hands over to the next detector.
    pub async fn detect<D>(
        self,
        discovery: &D,
        ingress_domain: &str,
        ctx: &ProbeContext,
    ) -> Option<ClusterEnvironment>
    where
        D: ClusterDiscovery + ?Sized,
    {
        match self {
            Detector::OpenShiftApiGroups => {
                match ctx.bounded(discovery.server_groups()).await {
                    Err(e) => {
                        info!(
                            error = %e,
                            "querying served API groups failed; \
                             environment is indeterminate"
                        );
                        Some(ClusterEnvironment::Indeterminate)
                    }
                    Ok(groups)
                        if groups
                            .iter()
                            .any(|g| g.ends_with(OPENSHIFT_GROUP_SUFFIX)) =>
                    {
                        info!("detected OpenShift");
                        Some(ClusterEnvironment::OpenShift)
                    }
                    Ok(_) => None,
                }
            }
            Detector::LocalDevNode => {
                // A configured domain always wins over the KinD host.
                if !ingress_domain.is_empty() {
                    return None;
                }
                let nodes = discovery.count_nodes(KIND_NODE_SELECTOR);
                match ctx.bounded(nodes).await {
                    Ok(n) if n > 0 => {
                        info!(nodes = n, "detected KinD cluster");
                        Some(ClusterEnvironment::LocalDevCluster {
                            host: KIND_HOST.to_string(),
                        })
                    }
                    Ok(_) => None,
                    Err(e) => {
                        info!(
                            error = %e,
                            "node inspection failed; skipping KinD check"
                        );
                        None
                    }
                }
            }
        }
    }
}

pub struct EnvironmentProber<C> {
    connector: C,
}

impl<C: ClusterConnector> EnvironmentProber<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Classify the environment `cluster` runs in.
    #[instrument(
        skip_all,
        fields(
            ns = %cluster.namespace,
            name = %cluster.name,
            domain = %ingress_domain
        )
    )]
    pub async fn classify(
        &self,
        cluster: &ManagedCluster,
        ingress_domain: &str,
        ctx: &ProbeContext,
    ) -> ClusterEnvironment {
        let config = match ctx.bounded(self.connector.config()).await {
            Ok(c) => c,
            Err(e) => {
                info!(
                    error = %e,
                    "cannot retrieve config, assuming vanilla Kubernetes"
                );
                return ClusterEnvironment::vanilla(cluster, ingress_domain);
            }
        };
        let discovery = match self.connector.discovery(config) {
            Ok(d) => d,
            Err(e) => {
                info!(
                    error = %e,
                    "cannot build a discovery client, \
                     assuming vanilla Kubernetes"
                );
                return ClusterEnvironment::vanilla(cluster, ingress_domain);
            }
        };

        for detector in DETECTION_ORDER {
            if let Some(env) =
                detector.detect(&discovery, ingress_domain, ctx).await
            {
                return env;
            }
        }

        info!("detected vanilla Kubernetes");
        ClusterEnvironment::vanilla(cluster, ingress_domain)
    }
}
