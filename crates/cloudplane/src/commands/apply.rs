use crate::config;
use cloudplane_graph::{CloudGraph, Pipeline, PipelineOptions, StateStore};
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;

pub async fn run(
    project: &Path,
    file: &Path,
    concurrency: usize,
    timeout: u64,
    prune: bool,
) -> anyhow::Result<()> {
    let desired = config::load_desired_state(file)?;
    let graph = CloudGraph::new(desired.resources)?;
    let store = config::build_store(project)?;
    let pipeline = Pipeline::new(store, StateStore::new(project));

    // Ctrl-C aborts in-flight work and keeps further nodes from starting.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            let _ = cancel_tx.send(true);
        }
    });

    let options = PipelineOptions {
        concurrency,
        call_timeout: Duration::from_secs(timeout),
        cancel: Some(cancel_rx),
        prune,
    };

    let report = pipeline.apply(graph, options).await?;
    print!("{report}");

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
