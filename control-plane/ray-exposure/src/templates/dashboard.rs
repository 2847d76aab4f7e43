use k8s_openapi::api::networking::v1::ServiceBackendPort;

use super::manager::{
    DesiredExposure, PATH_TYPE_PREFIX, RenderContext, Template,
};
use super::names::{DASHBOARD_PORT_NAME, dashboard_name, head_service_name};
use crate::crd::route::{
    InsecureEdgeTerminationPolicy, TlsConfig, TlsTermination,
};

/// Ray dashboard: a Route on OpenShift, an Ingress everywhere else.
#[derive(Clone, Debug, Default)]
pub struct DashboardTemplate;

impl DashboardTemplate {
    /// With the OAuth proxy sidecar the head pod serves TLS itself, so the
    /// router passes the connection through. A plain-HTTP dashboard is
    /// terminated at the edge instead.
    fn tls(ctx: &RenderContext<'_>) -> TlsConfig {
        if ctx.policy.dashboard_oauth {
            TlsConfig {
                termination: TlsTermination::Passthrough,
                insecure_edge_termination_policy: None,
            }
        } else {
            TlsConfig {
                termination: TlsTermination::Edge,
                insecure_edge_termination_policy: Some(
                    InsecureEdgeTerminationPolicy::Redirect,
                ),
            }
        }
    }

    fn route(&self, ctx: &RenderContext<'_>) -> DesiredExposure {
        ctx.route(
            dashboard_name(ctx.cluster),
            None,
            head_service_name(ctx.cluster),
            None,
            DASHBOARD_PORT_NAME,
            Self::tls(ctx),
        )
    }

    fn ingress(&self, ctx: &RenderContext<'_>) -> DesiredExposure {
        ctx.head_ingress(
            dashboard_name(ctx.cluster),
            None,
            None,
            ctx.environment.host(),
            PATH_TYPE_PREFIX,
            ServiceBackendPort {
                name: Some(DASHBOARD_PORT_NAME.to_string()),
                number: None,
            },
        )
    }
}

impl Template for DashboardTemplate {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Vec<DesiredExposure> {
        if ctx.environment.is_openshift() {
            vec![self.route(ctx)]
        } else {
            vec![self.ingress(ctx)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ManagedCluster;
    use crate::crd::route::Route;
    use crate::policy::ExposurePolicy;
    use crate::probe::{ClusterEnvironment, KIND_HOST};
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    fn policy(oauth: bool) -> ExposurePolicy {
        ExposurePolicy {
            dashboard_oauth: oauth,
            client_access: true,
        }
    }

    fn render_one(env: &ClusterEnvironment, oauth: bool) -> DesiredExposure {
        let cluster = ManagedCluster::new("demo", "team-a", "uid-1");
        let mut out = DashboardTemplate.render(&RenderContext {
            cluster: &cluster,
            environment: env,
            ingress_domain: "",
            policy: policy(oauth),
        });
        assert_eq!(out.len(), 1);
        out.remove(0)
    }

    fn dashboard_route(oauth: bool) -> Route {
        match render_one(&ClusterEnvironment::OpenShift, oauth) {
            DesiredExposure::Route(r) => r,
            other => panic!("expected Route, got {}", other.kind()),
        }
    }

    #[test]
    fn openshift_route_always_targets_head_dashboard_port() {
        for oauth in [true, false] {
            let r = dashboard_route(oauth);
            assert_eq!(r.metadata.name.as_deref(), Some("ray-dashboard-demo"));
            assert_eq!(r.spec.host, None);
            assert_eq!(r.spec.to.kind, "Service");
            assert_eq!(r.spec.to.name, "demo-head-svc");
            assert_eq!(
                r.spec.port.unwrap().target_port,
                IntOrString::String("dashboard".into())
            );
        }
    }

    #[test]
    fn default_policy_route_passes_through() {
        let r = dashboard_route(ExposurePolicy::default().dashboard_oauth);
        let tls = r.spec.tls.unwrap();
        assert_eq!(tls.termination, TlsTermination::Passthrough);
        assert_eq!(tls.insecure_edge_termination_policy, None);
    }

    #[test]
    fn oauth_disabled_route_terminates_at_edge() {
        let tls = dashboard_route(false).spec.tls.unwrap();
        assert_eq!(tls.termination, TlsTermination::Edge);
        assert_eq!(
            tls.insecure_edge_termination_policy,
            Some(InsecureEdgeTerminationPolicy::Redirect)
        );
    }

    #[test]
    fn kind_ingress_uses_sentinel_host() {
        let env = ClusterEnvironment::LocalDevCluster {
            host: KIND_HOST.into(),
        };
        // OAuth has no effect outside OpenShift.
        let DesiredExposure::Ingress(i) = render_one(&env, true) else {
            panic!("expected Ingress");
        };
        let spec = i.spec.unwrap();
        assert_eq!(spec.ingress_class_name, None);
        let rules = spec.rules.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].host.as_deref(), Some("kind"));
        let path = &rules[0].http.as_ref().unwrap().paths[0];
        assert_eq!(path.path.as_deref(), Some("/"));
        assert_eq!(path.path_type, "Prefix");
        let svc = path.backend.service.as_ref().unwrap();
        assert_eq!(svc.name, "demo-head-svc");
        let port = svc.port.as_ref().unwrap();
        assert_eq!(port.name.as_deref(), Some("dashboard"));
        assert_eq!(port.number, None);
    }
}
