//! `rota unit` — catalog administration.
//!
//! Catalog order is id order, and id order is the rotation order, so
//! adding a unit appends it to the cycle every person walks.

use anyhow::Result;
use rota_engine::Engine;
use rota_ledger::UnitId;

use super::parse_workload;

pub fn add(engine: &Engine, name: &str, days: u32, workload: &str) -> Result<()> {
    let unit = engine.add_unit(name, days, parse_workload(workload)?)?;
    println!(
        "✓ Added unit {} ({}, {} days, {})",
        unit.id,
        unit.name,
        unit.duration_days,
        unit.workload.label()
    );
    Ok(())
}

pub fn list(engine: &Engine) -> Result<()> {
    let units = engine.list_units()?;
    if units.is_empty() {
        println!("No units configured. Add one with `rota unit add`.");
        return Ok(());
    }
    println!("{:<5} {:<24} {:>5}  {}", "ID", "NAME", "DAYS", "WORKLOAD");
    for unit in units {
        println!(
            "{:<5} {:<24} {:>5}  {}",
            unit.id,
            unit.name,
            unit.duration_days,
            unit.workload.label()
        );
    }
    Ok(())
}

pub fn set(engine: &Engine, id: UnitId, days: Option<u32>, workload: Option<&str>) -> Result<()> {
    let workload = workload.map(parse_workload).transpose()?;
    let unit = engine.update_unit(id, days, workload)?;
    println!(
        "✓ Updated unit {} ({}, {} days, {})",
        unit.id,
        unit.name,
        unit.duration_days,
        unit.workload.label()
    );
    Ok(())
}

pub fn rm(engine: &Engine, id: UnitId) -> Result<()> {
    if engine.remove_unit(id)? {
        println!("✓ Removed unit {id}. Existing placements keep their history.");
    } else {
        println!("Unit {id} not found.");
    }
    Ok(())
}
