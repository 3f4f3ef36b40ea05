use crate::config;
use cloudplane_graph::{CloudGraph, Pipeline, StateStore};
use std::path::Path;

pub async fn run(project: &Path, file: &Path) -> anyhow::Result<()> {
    let desired = config::load_desired_state(file)?;
    let graph = CloudGraph::new(desired.resources)?;
    let store = config::build_store(project)?;
    let pipeline = Pipeline::new(store, StateStore::new(project));

    let plan = pipeline.plan(&graph).await?;
    for action in &plan.actions {
        if action.display.is_empty() {
            println!("{} {} ({})", action.action, action.name, action.kind);
        } else {
            println!(
                "{} {} ({}): {}",
                action.action,
                action.name,
                action.kind,
                action.display.join(", ")
            );
        }
    }
    println!("{}", plan.summary());
    Ok(())
}
