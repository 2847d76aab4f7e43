use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct ExposureConfig {
    /// Externally visible ingress domain. Empty means "infer from the
    /// environment" (e.g. KinD clusters get a fixed host).
    /// Env: RAY_EXPOSURE_INGRESS_DOMAIN
    #[envconfig(from = "RAY_EXPOSURE_INGRESS_DOMAIN", default = "")]
    pub ingress_domain: String,

    /// If Some, env explicitly set; otherwise the dashboard OAuth proxy is on.
    /// Env: RAY_EXPOSURE_DASHBOARD_OAUTH_ENABLED
    #[envconfig(from = "RAY_EXPOSURE_DASHBOARD_OAUTH_ENABLED")]
    pub dashboard_oauth_enabled: Option<bool>,

    /// Env: RAY_EXPOSURE_CLIENT_ACCESS_ENABLED
    #[envconfig(from = "RAY_EXPOSURE_CLIENT_ACCESS_ENABLED")]
    pub client_access_enabled: Option<bool>,

    /// Upper bound for each discovery / node list call.
    /// Env: RAY_EXPOSURE_PROBE_TIMEOUT_SECS
    #[envconfig(from = "RAY_EXPOSURE_PROBE_TIMEOUT_SECS", default = "10")]
    pub probe_timeout_secs: u64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            ingress_domain: String::new(),
            dashboard_oauth_enabled: None,
            client_access_enabled: None,
            probe_timeout_secs: 10,
        }
    }
}

impl ExposureConfig {
    /// Global default for the dashboard OAuth proxy, before any per-cluster
    /// annotation override.
    pub fn dashboard_oauth_default(&self) -> bool {
        self.dashboard_oauth_enabled.unwrap_or(true)
    }

    pub fn client_access_default(&self) -> bool {
        self.client_access_enabled.unwrap_or(true)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}
