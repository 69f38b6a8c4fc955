use anyhow::{Context, Result};
use evolab_sim::storage::Snapshot;
use serde_json::json;
use std::path::Path;

use crate::printing::{print_parameters, print_reports, print_status};

pub fn show_snapshot(path: &Path, as_json: bool) -> Result<()> {
    let snapshot = Snapshot::read_from(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    let sim = snapshot.restore().context("Snapshot is not consistent")?;
    let reports = sim.report();

    if as_json {
        let (min_degree, max_degree, mean_degree) = sim.geometry().degree_stats();
        let summary = json!({
            "exported": snapshot.exported,
            "generator": snapshot.generator,
            "status": sim.status(),
            "steps": sim.steps(),
            "generation": sim.generation(),
            "end_time": sim.end_time(),
            "geometry": {
                "topology": sim.geometry().topology().name(),
                "size": sim.geometry().size(),
                "links": sim.geometry().link_count(),
                "degree": [min_degree, max_degree, mean_degree],
            },
            "trace_entries": sim.statistics().trace().len(),
            "species": reports,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n📊 Snapshot {}", path.display());
    println!("{}", "=".repeat(50));
    println!("Exported: {} by {}", snapshot.exported, snapshot.generator);
    print_parameters(sim.config());

    let geometry = sim.geometry();
    let (min_degree, max_degree, mean_degree) = geometry.degree_stats();
    println!("🕸  Interaction Graph");
    println!("  • Nodes: {}, links: {}", geometry.size(), geometry.link_count());
    println!("  • Degree: min {min_degree}, max {max_degree}, mean {mean_degree:.3}");

    println!("\n⏱  Clock");
    print_status(&sim);
    for species in sim.population().species() {
        if species.is_discrete() {
            println!("  • '{}' counts: {:?}", species.name(), species.counts());
        }
    }
    println!("  • Trace Entries: {}", sim.statistics().trace().len());

    print_reports(&reports);
    Ok(())
}
