//! `rota person` / `rota status` — person administration and reporting.

use anyhow::Result;
use chrono::NaiveDate;
use rota_engine::Engine;
use rota_ledger::{Person, PersonId};

use super::{parse_batch, parse_status};

pub async fn add(
    engine: &Engine,
    name: &str,
    batch: &str,
    start: NaiveDate,
    generate_first: bool,
) -> Result<()> {
    let person = engine
        .create_person(name, parse_batch(batch)?, start, generate_first)
        .await?;
    println!(
        "✓ Added person {} ({}, batch {}, starts {})",
        person.id,
        person.name,
        person.batch.label(),
        person.start_date
    );
    if !generate_first {
        println!("  First placement deferred; `rota schedule {}` will create it.", person.id);
    }
    Ok(())
}

pub fn list(engine: &Engine, status: Option<&str>) -> Result<()> {
    let persons = match status {
        Some(s) => engine.list_persons_by_status(parse_status(s)?)?,
        None => engine.list_persons()?,
    };
    if persons.is_empty() {
        println!("No people found.");
        return Ok(());
    }
    println!(
        "{:<5} {:<24} {:<6} {:<12} {:<10} {:>4}",
        "ID", "NAME", "BATCH", "START", "STATUS", "EXT"
    );
    for person in persons {
        print_row(&person);
    }
    Ok(())
}

pub fn show(engine: &Engine, id: PersonId) -> Result<()> {
    let person = engine.get_person(id)?;
    println!("Person {}", person.id);
    println!("  Name:      {}", person.name);
    println!("  Batch:     {}", person.batch.label());
    println!("  Starts:    {}", person.start_date);
    println!("  Status:    {}", person.status.label());
    println!("  Extension: {} days", person.extension_days);
    Ok(())
}

pub async fn rm(engine: &Engine, id: PersonId) -> Result<()> {
    if engine.remove_person(id).await? {
        println!("✓ Removed person {id} with their placements and audit records.");
    } else {
        println!("Person {id} not found.");
    }
    Ok(())
}

pub fn status_summary(engine: &Engine) -> Result<()> {
    for (status, count) in engine.status_counts()? {
        println!("{:<10} {count}", status.label());
    }
    Ok(())
}

fn print_row(person: &Person) {
    println!(
        "{:<5} {:<24} {:<6} {:<12} {:<10} {:>4}",
        person.id,
        person.name,
        person.batch.label(),
        person.start_date.to_string(),
        person.status.label(),
        person.extension_days
    );
}
