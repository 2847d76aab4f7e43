//! Deterministic names of the objects rendered for a Ray cluster.

use crate::cluster::ManagedCluster;

pub const CLUSTER_NAME_LABEL: &str = "ray.io/cluster-name";

/// Port of the head service serving the dashboard.
pub const DASHBOARD_PORT_NAME: &str = "dashboard";
/// Port of the head service serving Ray client connections.
pub const CLIENT_PORT_NAME: &str = "client";
pub const CLIENT_PORT: i32 = 10001;

pub fn head_service_name(cluster: &ManagedCluster) -> String {
    format!("{}-head-svc", cluster.name)
}

pub fn dashboard_name(cluster: &ManagedCluster) -> String {
    format!("ray-dashboard-{}", cluster.name)
}

pub fn ray_client_name(cluster: &ManagedCluster) -> String {
    format!("rayclient-{}", cluster.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_derive_from_cluster_name() {
        let c = ManagedCluster::new("demo", "team-a", "uid-1");
        assert_eq!(head_service_name(&c), "demo-head-svc");
        assert_eq!(dashboard_name(&c), "ray-dashboard-demo");
        assert_eq!(ray_client_name(&c), "rayclient-demo");
    }
}
