pub mod cluster;
pub mod config;
pub mod crd;
pub mod policy;
pub mod probe;
pub mod templates;

use tracing_subscriber::{
    EnvFilter,
    filter::{Directive, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use cluster::ManagedCluster;
pub use config::ExposureConfig;
pub use policy::{ExposurePolicy, resolve_annotation_bool};
pub use probe::{ClusterEnvironment, EnvironmentProber, ProbeContext};
pub use templates::{DesiredExposure, RenderContext, TemplateManager};

pub fn init_tracing(default_env: &str) {
    let default_directive = default_env
        .parse::<Directive>()
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .from_env_lossy()
        .add_directive(default_directive);

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();
}
