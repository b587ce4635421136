//! `rota extend` / `rota audit` — extension processing and its trail.

use anyhow::Result;
use rota_engine::Engine;
use rota_ledger::{PersonId, UnitId};

use super::parse_reason;

pub async fn extend(
    engine: &Engine,
    person_id: PersonId,
    total: u32,
    reason: &str,
    note: &str,
    unit: Option<UnitId>,
) -> Result<()> {
    let outcome = engine
        .extend_person(person_id, total, parse_reason(reason)?, note, unit)
        .await?;
    match &outcome.adjusted {
        Some(placement) => {
            println!("✓ Extension applied ({:+} days)", outcome.delta_days);
            println!(
                "  Placement {} in unit {} now ends {}",
                placement.id, placement.unit_id, placement.end
            );
        }
        None => println!(
            "✓ Extension recorded ({:+} days); no placement adjusted",
            outcome.delta_days
        ),
    }
    println!("  Status: {}", outcome.status.label());
    Ok(())
}

pub fn audit(engine: &Engine, person_id: PersonId) -> Result<()> {
    let records = engine.extension_history(person_id)?;
    if records.is_empty() {
        println!("No extension records for person {person_id}.");
        return Ok(());
    }
    for record in records {
        let note = if record.note.is_empty() {
            String::new()
        } else {
            format!("  ({})", record.note)
        };
        println!(
            "  {}  {:+} days  {}{}",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            record.delta_days,
            record.reason.label(),
            note
        );
    }
    Ok(())
}
