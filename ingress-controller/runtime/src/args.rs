use crate::{
    core::{MANAGED_BY, MANAGED_BY_LABEL},
    index::{RouteIndex, RuleIndex, ServiceIndex},
    k8s::{self, AutoIngress, CustomResourceExt},
    store::KubeStore,
    sync::{
        queue, Backoff, Convergence, ConvergenceMetrics, EventRouter, QueueMetrics, Reconciler,
        RuleRegistry,
    },
};
use anyhow::{bail, Result};
use clap::Parser;
use kube::runtime::watcher;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "autoingress",
    about = "Exposes services through generated Ingress resources"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "autoingress=info,warn",
        env = "AUTOINGRESS_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Number of times a failed event is requeued before it is dropped.
    ///
    /// Zero disables retries.
    #[clap(long, default_value = "5")]
    event_max_retries: u32,

    #[clap(long, default_value = "500")]
    event_initial_backoff_ms: u64,

    #[clap(long, default_value = "30000")]
    event_max_backoff_ms: u64,

    /// Prints the AutoIngress CustomResourceDefinition and exits.
    #[clap(long)]
    print_crd: bool,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            event_max_retries,
            event_initial_backoff_ms,
            event_max_backoff_ms,
            print_crd,
        } = self;

        if print_crd {
            print!("{}", serde_yaml::to_string(&AutoIngress::crd())?);
            return Ok(());
        }

        let backoff = Backoff {
            max_retries: event_max_retries,
            initial: Duration::from_millis(event_initial_backoff_ms),
            max: Duration::from_millis(event_max_backoff_ms),
        };

        let mut prom = <Registry>::default();
        let autoingress = prom.sub_registry_with_prefix("autoingress");
        let convergence_metrics = ConvergenceMetrics::register(autoingress);
        let queue_metrics = QueueMetrics::register(autoingress);
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let store = Arc::new(KubeStore::new(runtime.client()));
        let registry = RuleRegistry::shared();
        let convergence = Arc::new(Convergence::new(store.clone(), convergence_metrics));
        let router = Arc::new(EventRouter::new(
            registry.clone(),
            convergence.clone(),
            store.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(registry, convergence, store));

        // One queue per watched kind.
        let (services_tx, services_queue) = queue::channel(
            "service",
            router.clone(),
            backoff.clone(),
            queue_metrics.clone(),
        );
        tokio::spawn(services_queue.run().instrument(info_span!("service_queue")));

        let (routes_tx, routes_queue) =
            queue::channel("route", router, backoff.clone(), queue_metrics.clone());
        tokio::spawn(routes_queue.run().instrument(info_span!("route_queue")));

        let (rules_tx, rules_queue) = queue::channel("rule", reconciler, backoff, queue_metrics);
        tokio::spawn(rules_queue.run().instrument(info_span!("rule_queue")));

        // Spawn resource watches.

        let services = runtime.watch_all::<k8s::Service>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(ServiceIndex::shared(services_tx), services)
                .instrument(info_span!("services")),
        );

        let ingresses = runtime.watch_all::<k8s::Ingress>(
            watcher::Config::default().labels(&format!("{MANAGED_BY_LABEL}={MANAGED_BY}")),
        );
        tokio::spawn(
            kubert::index::namespaced(RouteIndex::shared(routes_tx), ingresses)
                .instrument(info_span!("ingresses")),
        );

        let rules = runtime.watch_all::<AutoIngress>(watcher::Config::default());
        tokio::spawn(
            kubert::index::cluster(RuleIndex::shared(rules_tx), rules)
                .instrument(info_span!("autoingresses")),
        );

        info!("Watching services, ingresses and autoingresses");

        // Block the main thread on the shutdown signal.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
