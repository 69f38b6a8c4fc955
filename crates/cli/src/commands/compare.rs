use anyhow::{Context, Result};
use evolab_codec::{check_header, CodecStrategy, Comparator, Tolerance};
use evolab_sim::storage::{SNAPSHOT_FORMAT, SNAPSHOT_VERSION};
use serde_json::Value;
use std::path::Path;

use crate::args::CompareArgs;

fn load(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = CodecStrategy::Pretty
        .decode(&bytes)
        .with_context(|| format!("{} is not a snapshot document", path.display()))?;
    check_header(&doc, SNAPSHOT_FORMAT, SNAPSHOT_VERSION)
        .with_context(|| format!("Unsupported snapshot {}", path.display()))?;
    Ok(doc)
}

/// Returns `false` when major differences were found.
pub fn compare_snapshots(args: &CompareArgs) -> Result<bool> {
    let reference = load(&args.reference)?;
    let candidate = load(&args.candidate)?;

    let comparator = args.ignore.iter().fold(
        Comparator::new().with_tolerance(Tolerance {
            absolute: args.abs_tol,
            relative: args.rel_tol,
        }),
        |comparator, key| comparator.ignore(key.as_str()),
    );
    let report = comparator.compare(&reference, &candidate);

    for difference in report.majors() {
        println!("{difference}");
    }
    if args.all {
        for difference in report.minors() {
            println!("{difference}");
        }
    }

    if report.is_identical() {
        println!("✓ Snapshots are identical");
    } else if report.passed() {
        println!(
            "✓ Snapshots agree within tolerance ({} minor differences)",
            report.minor_count()
        );
    } else {
        println!(
            "✗ {} major and {} minor differences",
            report.major_count(),
            report.minor_count()
        );
    }
    Ok(report.passed())
}
