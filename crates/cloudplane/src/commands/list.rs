use crate::config;
use cloudplane_cloud::{ListFilter, Paging};
use cloudplane_core::ResourceKind;
use std::path::Path;

pub async fn run(
    project: &Path,
    kind: &str,
    account: &str,
    id: Option<String>,
    limit: Option<usize>,
    offset: usize,
) -> anyhow::Result<()> {
    let kind: ResourceKind = kind.parse()?;
    let store = config::build_store(project)?;
    let provider = store.require(account)?;
    let service = provider.service(kind)?;

    let filter = ListFilter { id, name: None };
    let paging = Paging { offset, limit };
    let page = service.list(&filter, &paging).await?;

    for row in &page.rows {
        println!("{}", serde_json::to_string(row)?);
    }
    println!("total: {}", page.total);
    Ok(())
}

pub async fn get(project: &Path, kind: &str, id: &str, account: &str) -> anyhow::Result<()> {
    let kind: ResourceKind = kind.parse()?;
    let store = config::build_store(project)?;
    let provider = store.require(account)?;
    let service = provider.service(kind)?;

    match service.get(id).await? {
        Some(row) => {
            println!("{}", serde_json::to_string_pretty(&row)?);
            Ok(())
        }
        None => {
            eprintln!("{kind} {id} not found");
            std::process::exit(1);
        }
    }
}
