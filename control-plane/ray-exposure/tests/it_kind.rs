// Integration tests that expect a running cluster reachable through
// KUBECONFIG.
// Enable via: cargo test -p ray-exposure --test it_kind -- --ignored

use std::time::Duration;

use ray_exposure::probe::{
    ClusterConnector, ClusterDiscovery, KIND_NODE_SELECTOR, KubeConnector,
};
use ray_exposure::{
    ClusterEnvironment, EnvironmentProber, ManagedCluster, ProbeContext,
};
use tokio_util::sync::CancellationToken;

fn install_crypto() {
    let _ = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::aws_lc_rs::default_provider(),
    );
}

#[test_log::test(tokio::test)]
#[ignore]
async fn discovery_lists_core_groups() {
    install_crypto();
    let conn = KubeConnector::infer();
    let config = conn.config().await.expect("kube config");
    let discovery = conn.discovery(config).expect("kube client");
    let groups = discovery.server_groups().await.expect("api groups");
    assert!(groups.iter().any(|g| g == "apps"), "groups: {groups:?}");
    // Node listing may be forbidden for restricted users; it must not panic.
    let _ = discovery.count_nodes(KIND_NODE_SELECTOR).await;
}

#[test_log::test(tokio::test)]
#[ignore]
async fn classify_against_live_cluster() {
    install_crypto();
    let cluster = ManagedCluster::new("it-ray", "default", "uid-it");
    let ctx =
        ProbeContext::new(CancellationToken::new(), Duration::from_secs(10));
    let client = kube::Client::try_default().await.expect("kube client");
    let env = EnvironmentProber::new(KubeConnector::new(client))
        .classify(&cluster, "", &ctx)
        .await;
    // A live API server answers discovery, so the result is never
    // indeterminate.
    assert_ne!(env, ClusterEnvironment::Indeterminate);
    if let ClusterEnvironment::LocalDevCluster { host } = &env {
        assert_eq!(host, "kind");
    }
}
