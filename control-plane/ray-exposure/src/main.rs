use clap::{Parser, Subcommand, ValueEnum};
use envconfig::Envconfig;
use kube::Client;
use kube::api::Api;
use kube::core::DynamicObject;
use ray_exposure::cluster::ray_cluster_resource;
use ray_exposure::probe::KubeConnector;
use ray_exposure::{
    EnvironmentProber, ExposureConfig, ExposurePolicy, ManagedCluster,
    ProbeContext, RenderContext, TemplateManager, init_tracing,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Inspect a RayCluster and print the Route/Ingress objects that expose it.
/// Nothing is written to the cluster.
#[derive(Parser, Debug)]
#[command(name = "ray-exposure", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected environment and dashboard host
    Probe(Target),
    /// Print the desired exposure manifests
    Render {
        #[command(flatten)]
        target: Target,
        #[arg(short, long, value_enum, default_value_t = Output::Json)]
        output: Output,
    },
}

#[derive(clap::Args, Debug)]
struct Target {
    /// RayCluster name
    #[arg(short = 'c', long)]
    name: String,
    #[arg(short, long, default_value = "default")]
    namespace: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Output {
    Json,
    Yaml,
}

async fn fetch_cluster(
    client: Client,
    target: &Target,
) -> anyhow::Result<ManagedCluster> {
    let ar = ray_cluster_resource();
    let api: Api<DynamicObject> =
        Api::namespaced_with(client, &target.namespace, &ar);
    let obj = api.get(&target.name).await?;
    Ok(ManagedCluster::from_dynamic(&obj, &ar))
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    if let Err(e) = rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::aws_lc_rs::default_provider(),
    ) {
        debug!(
            ?e,
            "CryptoProvider already installed or incompatible; proceeding"
        );
    }

    let cli = Cli::parse();
    let cfg = ExposureConfig::init_from_env()?;
    info!(?cfg, "Starting ray-exposure");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });
    let ctx = ProbeContext::from_config(&cfg, cancel);

    let client = Client::try_default().await?;
    let prober = EnvironmentProber::new(KubeConnector::new(client.clone()));

    match cli.command {
        Command::Probe(target) => {
            let cluster = fetch_cluster(client, &target).await?;
            let env =
                prober.classify(&cluster, &cfg.ingress_domain, &ctx).await;
            let out = serde_json::json!({
                "environment": env.to_string(),
                "host": env.host(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Render { target, output } => {
            let cluster = fetch_cluster(client, &target).await?;
            let env =
                prober.classify(&cluster, &cfg.ingress_domain, &ctx).await;
            let policy = ExposurePolicy::resolve(&cluster, &cfg);
            info!(environment = %env, ?policy, "rendering exposures");
            let manifests = TemplateManager::new()
                .render_exposures(&RenderContext {
                    cluster: &cluster,
                    environment: &env,
                    ingress_domain: &cfg.ingress_domain,
                    policy,
                })
                .iter()
                .map(|o| o.to_manifest())
                .collect::<Result<Vec<_>, _>>()?;
            match output {
                Output::Json => {
                    println!("{}", serde_json::to_string_pretty(&manifests)?)
                }
                Output::Yaml => {
                    for m in &manifests {
                        println!("---\n{}", serde_yaml::to_string(m)?);
                    }
                }
            }
        }
    }
    Ok(())
}
