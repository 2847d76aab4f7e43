use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::discovery::ApiResource;
use kube::core::DynamicObject;
use kube::{Resource, ResourceExt};

/// API resource of the Ray cluster CRD served by KubeRay.
pub fn ray_cluster_resource() -> ApiResource {
    ApiResource::from_gvk(&kube::core::GroupVersionKind::gvk(
        "ray.io",
        "v1",
        "RayCluster",
    ))
}

/// Read-only identity of the managed Ray cluster that exposure objects are
/// rendered for.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ManagedCluster {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub kind: String,
    pub api_version: String,
    pub annotations: BTreeMap<String, String>,
}

impl ManagedCluster {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        let res = ray_cluster_resource();
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
            kind: res.kind,
            api_version: res.api_version,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_annotation(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Snapshot identity fields of any typed resource. A missing namespace
    /// stays empty; it is never guessed.
    pub fn from_resource<K>(obj: &K, dt: &K::DynamicType) -> Self
    where
        K: Resource,
    {
        Self {
            name: obj.name_any(),
            namespace: obj.namespace().unwrap_or_default(),
            uid: obj.meta().uid.clone().unwrap_or_default(),
            kind: K::kind(dt).into_owned(),
            api_version: K::api_version(dt).into_owned(),
            annotations: obj.annotations().clone(),
        }
    }

    /// Snapshot identity from a dynamically typed object. The object's own
    /// type metadata wins over the requested resource when present.
    pub fn from_dynamic(obj: &DynamicObject, ar: &ApiResource) -> Self {
        let mut cluster = Self::from_resource(obj, ar);
        if let Some(types) = obj.types.as_ref() {
            cluster.kind = types.kind.clone();
            cluster.api_version = types.api_version.clone();
        }
        cluster
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Back-reference used for cascading deletion of exposure objects.
    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            ..Default::default()
        }
    }
}
