use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend,
    IngressRule, IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    ObjectMeta, OwnerReference,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Resource;

use super::names::{CLUSTER_NAME_LABEL, head_service_name};
use super::{ClientTemplate, DashboardTemplate};
use crate::cluster::ManagedCluster;
use crate::crd::route::{
    Route, RoutePort, RouteSpec, RouteTargetReference, TlsConfig,
};
use crate::policy::ExposurePolicy;
use crate::probe::ClusterEnvironment;

pub const PATH_TYPE_PREFIX: &str = "Prefix";
pub const PATH_TYPE_IMPLEMENTATION_SPECIFIC: &str = "ImplementationSpecific";

#[derive(Clone, Debug, PartialEq)]
pub enum DesiredExposure {
    Route(Route),
    Ingress(Ingress),
}

impl DesiredExposure {
    pub fn kind(&self) -> &'static str {
        match self {
            DesiredExposure::Route(_) => "Route",
            DesiredExposure::Ingress(_) => "Ingress",
        }
    }

    pub fn api_version(&self) -> String {
        match self {
            DesiredExposure::Route(_) => Route::api_version(&()).into_owned(),
            DesiredExposure::Ingress(_) => {
                Ingress::api_version(&()).into_owned()
            }
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            DesiredExposure::Route(r) => &r.metadata,
            DesiredExposure::Ingress(i) => &i.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn owner_references(&self) -> &[OwnerReference] {
        self.metadata()
            .owner_references
            .as_deref()
            .unwrap_or_default()
    }

    /// JSON manifest (with apiVersion/kind) suitable for server-side apply.
    pub fn to_manifest(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            DesiredExposure::Route(r) => serde_json::to_value(r),
            DesiredExposure::Ingress(i) => serde_json::to_value(i),
        }
    }
}

pub trait Template: std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn render(&self, ctx: &RenderContext<'_>) -> Vec<DesiredExposure>;
}

#[derive(Clone, Debug)]
pub struct RenderContext<'a> {
    pub cluster: &'a ManagedCluster,
    pub environment: &'a ClusterEnvironment,
    /// Configured ingress domain; may be empty.
    pub ingress_domain: &'a str,
    pub policy: ExposurePolicy,
}

impl RenderContext<'_> {
    /// Metadata shared by every exposure object of the cluster.
    pub(crate) fn object_meta(
        &self,
        name: String,
        annotations: Option<BTreeMap<String, String>>,
    ) -> ObjectMeta {
        ObjectMeta {
            name: Some(name),
            namespace: Some(self.cluster.namespace.clone()),
            labels: Some(BTreeMap::from([(
                CLUSTER_NAME_LABEL.to_string(),
                self.cluster.name.clone(),
            )])),
            annotations,
            owner_references: Some(vec![self.cluster.owner_reference()]),
            ..Default::default()
        }
    }

    /// Route to one port of `service`.
    pub(crate) fn route(
        &self,
        name: String,
        host: Option<String>,
        service: String,
        weight: Option<i32>,
        target_port: &str,
        tls: TlsConfig,
    ) -> DesiredExposure {
        DesiredExposure::Route(Route {
            metadata: self.object_meta(name, None),
            spec: RouteSpec {
                host,
                to: RouteTargetReference {
                    kind: "Service".to_string(),
                    name: service,
                    weight,
                },
                port: Some(RoutePort {
                    target_port: IntOrString::String(
                        target_port.to_string(),
                    ),
                }),
                tls: Some(tls),
            },
        })
    }

    /// Single-rule Ingress on path `/` to the head service.
    pub(crate) fn head_ingress(
        &self,
        name: String,
        annotations: Option<BTreeMap<String, String>>,
        ingress_class_name: Option<&str>,
        host: &str,
        path_type: &str,
        port: ServiceBackendPort,
    ) -> DesiredExposure {
        let rule = IngressRule {
            // An empty host would match every request; leave it unset instead.
            host: (!host.is_empty()).then(|| host.to_string()),
            http: Some(HTTPIngressRuleValue {
                paths: vec![HTTPIngressPath {
                    path: Some("/".to_string()),
                    path_type: path_type.to_string(),
                    backend: IngressBackend {
                        service: Some(IngressServiceBackend {
                            name: head_service_name(self.cluster),
                            port: Some(port),
                        }),
                        resource: None,
                    },
                }],
            }),
        };
        DesiredExposure::Ingress(Ingress {
            metadata: self.object_meta(name, annotations),
            spec: Some(IngressSpec {
                ingress_class_name: ingress_class_name.map(str::to_string),
                rules: Some(vec![rule]),
                ..Default::default()
            }),
            status: None,
        })
    }
}

#[derive(Debug)]
pub struct TemplateManager {
    templates: Vec<Box<dyn Template + Send + Sync>>,
}

impl Default for TemplateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateManager {
    pub fn new() -> Self {
        Self {
            templates: vec![
                Box::new(DashboardTemplate),
                Box::new(ClientTemplate),
            ],
        }
    }

    pub fn template_names(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.name()).collect()
    }

    /// Every exposure object the cluster should have, in template order.
    pub fn render_exposures(
        &self,
        ctx: &RenderContext<'_>,
    ) -> Vec<DesiredExposure> {
        self.templates.iter().flat_map(|t| t.render(ctx)).collect()
    }
}
