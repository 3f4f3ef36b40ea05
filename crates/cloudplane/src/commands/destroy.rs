use crate::config;
use cloudplane_graph::{CloudGraph, Pipeline, PipelineOptions, StateStore};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub async fn run(project: &Path, file: &Path, timeout: u64, yes: bool) -> anyhow::Result<()> {
    let desired = config::load_desired_state(file)?;
    let count = desired.resources.len();
    let graph = CloudGraph::new(desired.resources)?;

    if !yes {
        print!("Destroy {count} resources? [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let store = config::build_store(project)?;
    let pipeline = Pipeline::new(store, StateStore::new(project));

    let options = PipelineOptions {
        call_timeout: Duration::from_secs(timeout),
        ..Default::default()
    };
    let report = pipeline.destroy(graph, options).await?;
    print!("{report}");

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
