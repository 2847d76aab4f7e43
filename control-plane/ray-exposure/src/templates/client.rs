use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::ServiceBackendPort;

use super::manager::{
    DesiredExposure, PATH_TYPE_IMPLEMENTATION_SPECIFIC, RenderContext,
    Template,
};
use super::names::{
    CLIENT_PORT, CLIENT_PORT_NAME, head_service_name, ray_client_name,
};
use crate::crd::route::{TlsConfig, TlsTermination};

pub const NGINX_INGRESS_CLASS: &str = "nginx";
pub const NGINX_REWRITE_TARGET: &str =
    "nginx.ingress.kubernetes.io/rewrite-target";
pub const NGINX_SSL_REDIRECT: &str =
    "nginx.ingress.kubernetes.io/ssl-redirect";
pub const NGINX_SSL_PASSTHROUGH: &str =
    "nginx.ingress.kubernetes.io/ssl-passthrough";

/// Ray client (gRPC, TLS terminated by the head) exposure. Only rendered
/// when the policy enables client access.
#[derive(Clone, Debug, Default)]
pub struct ClientTemplate;

impl ClientTemplate {
    fn route(&self, ctx: &RenderContext<'_>) -> DesiredExposure {
        let cluster = ctx.cluster;
        let name = ray_client_name(cluster);
        let host = format!("{}-{}", name, cluster.namespace);
        ctx.route(
            name,
            Some(host),
            head_service_name(cluster),
            Some(100),
            CLIENT_PORT_NAME,
            TlsConfig {
                termination: TlsTermination::Passthrough,
                insecure_edge_termination_policy: None,
            },
        )
    }

    fn ingress(&self, ctx: &RenderContext<'_>) -> DesiredExposure {
        let cluster = ctx.cluster;
        let name = ray_client_name(cluster);
        let host =
            format!("{}-{}.{}", name, cluster.namespace, ctx.ingress_domain);
        let annotations = BTreeMap::from([
            (NGINX_REWRITE_TARGET.to_string(), "/".to_string()),
            (NGINX_SSL_REDIRECT.to_string(), "true".to_string()),
            (NGINX_SSL_PASSTHROUGH.to_string(), "true".to_string()),
        ]);
        ctx.head_ingress(
            name,
            Some(annotations),
            Some(NGINX_INGRESS_CLASS),
            &host,
            PATH_TYPE_IMPLEMENTATION_SPECIFIC,
            ServiceBackendPort {
                name: None,
                number: Some(CLIENT_PORT),
            },
        )
    }
}

impl Template for ClientTemplate {
    fn name(&self) -> &'static str {
        "ray-client"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Vec<DesiredExposure> {
        if !ctx.policy.client_access {
            return vec![];
        }
        if ctx.environment.is_openshift() {
            vec![self.route(ctx)]
        } else {
            vec![self.ingress(ctx)]
        }
    }
}
