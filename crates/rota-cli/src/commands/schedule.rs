//! `rota schedule` / `rota place` — schedule views and manual splices.
//!
//! Reading a schedule is what advances it: a person due for their next
//! unit gets the placement created as part of the read.

use anyhow::Result;
use chrono::NaiveDate;
use rota_engine::Engine;
use rota_ledger::{PersonId, UnitId};

pub async fn show(engine: &Engine, person_id: PersonId) -> Result<()> {
    let placements = engine.get_schedule(person_id).await?;
    let person = engine.get_person(person_id)?;
    let units = engine.list_units()?;

    println!(
        "Schedule for {} (status: {})",
        person.name,
        person.status.label()
    );
    if placements.is_empty() {
        println!("  no placements");
        return Ok(());
    }
    for placement in &placements {
        let unit_name = units
            .iter()
            .find(|u| u.id == placement.unit_id)
            .map(|u| u.name.as_str())
            .unwrap_or("(retired unit)");
        let flag = if placement.manual { "  [manual]" } else { "" };
        println!(
            "  {} → {}  {:<24}{}",
            placement.start, placement.end, unit_name, flag
        );
    }
    Ok(())
}

pub async fn place(
    engine: &Engine,
    person_id: PersonId,
    unit_id: UnitId,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<()> {
    let placement = engine.place_manual(person_id, unit_id, start, end).await?;
    println!(
        "✓ Placed person {} in unit {} from {} to {}",
        person_id, unit_id, placement.start, placement.end
    );
    Ok(())
}
