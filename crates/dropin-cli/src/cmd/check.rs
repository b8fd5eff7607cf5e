//! Check command

use anyhow::{Context, Result, bail};
use dropin_core::UnitRepository;
use dropin_core::plan::InstallPlan;
use std::path::Path;

/// Load and validate the plan at `file` without resolving it.
pub fn check(file: &Path) -> Result<()> {
    let plan = InstallPlan::load(file)?;
    let total = plan.unit_count();
    let (request, repository) = plan
        .into_parts()
        .with_context(|| format!("Invalid unit in {}", file.display()))?;

    if request.main_package.trim().is_empty() {
        bail!("{}: main package name must not be empty", file.display());
    }

    let unknown: Vec<&str> = request
        .mappings
        .keys()
        .filter(|id| !request.reactor.iter().any(|unit| unit.id() == id.as_str()))
        .map(String::as_str)
        .collect();
    for id in &unknown {
        tracing::warn!("Mapping for {} names no reactor unit", id);
    }

    let fragments = request.reactor.iter().filter(|unit| unit.is_fragment()).count();
    let requirements: usize = request.reactor.iter().map(|unit| unit.requirements().len()).sum();
    let located = repository
        .external_units()
        .iter()
        .filter(|unit| repository.lookup_path(unit).is_some())
        .count();

    println!("{}: ok", file.display());
    println!("  {:<14}{}", "units", total);
    println!("  {:<14}{} ({} fragments)", "reactor", request.reactor.len(), fragments);
    println!("  {:<14}{}", "requirements", requirements);
    println!(
        "  {:<14}{} of {} located",
        "external",
        located,
        repository.external_units().len()
    );
    println!("  {:<14}{} ({} unknown)", "mappings", request.mappings.len(), unknown.len());
    println!("  {:<14}{}", "main", request.main_package);
    Ok(())
}
