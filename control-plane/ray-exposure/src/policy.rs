use tracing::warn;

use crate::cluster::ManagedCluster;
use crate::config::ExposureConfig;

/// Per-cluster override for the dashboard OAuth proxy sidecar.
pub const DASHBOARD_OAUTH_ANNOTATION: &str = "ray.openshift.ai/oauth";
/// Per-cluster override for exposing the Ray client endpoint.
pub const CLIENT_ACCESS_ANNOTATION: &str = "ray.openshift.ai/client-access";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid boolean literal {0:?}")]
pub struct ParseBoolError(String);

/// Boolean literals accepted in annotations, matching the conventions used by
/// Kubernetes tooling (`1`, `t`, `TRUE`, `False`, ...).
pub fn parse_bool_literal(val: &str) -> Result<bool, ParseBoolError> {
    match val {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseBoolError(val.to_string())),
    }
}

/// Read a boolean flag from the cluster's annotations.
///
/// Missing or empty values yield `default`. Unparsable values are logged and
/// also yield `default`; resolution never fails.
pub fn resolve_annotation_bool(
    cluster: &ManagedCluster,
    annotation: &str,
    default: bool,
) -> bool {
    let val = match cluster.annotation(annotation) {
        Some(v) if !v.is_empty() => v,
        _ => return default,
    };
    match parse_bool_literal(val) {
        Ok(b) => b,
        Err(e) => {
            warn!(
                cluster = %cluster.name,
                namespace = %cluster.namespace,
                annotation,
                value = val,
                error = %e,
                "could not convert annotation value to bool; using default"
            );
            default
        }
    }
}

/// Exposure toggles resolved for one cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExposurePolicy {
    /// Front the dashboard with the OAuth proxy (OpenShift only).
    pub dashboard_oauth: bool,
    /// Render the Ray client Route/Ingress.
    pub client_access: bool,
}

impl Default for ExposurePolicy {
    fn default() -> Self {
        Self {
            dashboard_oauth: true,
            client_access: true,
        }
    }
}

impl ExposurePolicy {
    /// Annotation first, then global config, then built-in default.
    pub fn resolve(cluster: &ManagedCluster, cfg: &ExposureConfig) -> Self {
        Self {
            dashboard_oauth: resolve_annotation_bool(
                cluster,
                DASHBOARD_OAUTH_ANNOTATION,
                cfg.dashboard_oauth_default(),
            ),
            client_access: resolve_annotation_bool(
                cluster,
                CLIENT_ACCESS_ANNOTATION,
                cfg.client_access_default(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn cluster() -> ManagedCluster {
        ManagedCluster::new("demo", "team-a", "uid-1")
    }

    #[test]
    fn missing_annotation_yields_default() {
        assert!(resolve_annotation_bool(&cluster(), "x", true));
        assert!(!resolve_annotation_bool(&cluster(), "x", false));
    }

    #[test]
    fn empty_annotation_yields_default() {
        let c = cluster().with_annotation("x", "");
        assert!(resolve_annotation_bool(&c, "x", true));
    }

    #[test]
    fn valid_annotation_overrides_default() {
        let c = cluster().with_annotation("x", "false");
        assert!(!resolve_annotation_bool(&c, "x", true));
        let c = cluster().with_annotation("x", "T");
        assert!(resolve_annotation_bool(&c, "x", false));
    }

    #[traced_test]
    #[test]
    fn invalid_annotation_warns_and_yields_default() {
        let c = cluster().with_annotation("x", "notabool");
        assert!(resolve_annotation_bool(&c, "x", true));
        assert!(logs_contain("could not convert annotation value to bool"));
        assert!(logs_contain("notabool"));
    }

    #[test]
    fn literals_follow_kubernetes_conventions() {
        for t in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool_literal(t), Ok(true), "{t}");
        }
        for f in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool_literal(f), Ok(false), "{f}");
        }
        for bad in ["yes", "no", "tRUE", " true", "2"] {
            assert!(parse_bool_literal(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn policy_uses_global_defaults_without_annotations() {
        let cfg = ExposureConfig::default();
        assert_eq!(
            ExposurePolicy::resolve(&cluster(), &cfg),
            ExposurePolicy {
                dashboard_oauth: true,
                client_access: true
            }
        );

        let cfg = ExposureConfig {
            dashboard_oauth_enabled: Some(false),
            client_access_enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(
            ExposurePolicy::resolve(&cluster(), &cfg),
            ExposurePolicy {
                dashboard_oauth: false,
                client_access: false
            }
        );
    }

    #[test]
    fn annotation_beats_global_default() {
        let cfg = ExposureConfig {
            dashboard_oauth_enabled: Some(false),
            ..Default::default()
        };
        let c = cluster()
            .with_annotation(DASHBOARD_OAUTH_ANNOTATION, "true")
            .with_annotation(CLIENT_ACCESS_ANNOTATION, "0");
        let p = ExposurePolicy::resolve(&c, &cfg);
        assert!(p.dashboard_oauth);
        assert!(!p.client_access);
    }
}
