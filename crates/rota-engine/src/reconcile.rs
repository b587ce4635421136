//! Status reconciliation.
//!
//! The stored status field is a cache of what the ledger already
//! implies. `derive_status` recomputes it from placement history and
//! the catalog; callers write the result back only when it differs
//! from the stored value. The derivation is deterministic, so a crash
//! between a placement write and its follow-up status write heals on
//! the next read.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use rota_ledger::{Person, PersonStatus, Placement, Unit, UnitId};

/// Derive the status a person should carry as of `today`.
///
/// Rules, in order:
/// 1. anything current or upcoming → `Active` (`Extended` with days)
/// 2. automatic placements cover the whole catalog → `Completed`
///    (`Extended` with days)
/// 3. otherwise (gap, or no coverage yet) → `Active` (`Extended` with
///    days)
pub fn derive_status(
    person: &Person,
    placements: &[Placement],
    catalog: &[Unit],
    today: NaiveDate,
) -> PersonStatus {
    let extended = person.extension_days > 0;

    if placements.iter().any(|p| p.current_or_upcoming(today)) {
        return if extended {
            PersonStatus::Extended
        } else {
            PersonStatus::Active
        };
    }

    let covered = covered_units(placements);
    // An empty catalog covers nothing: a person cannot complete a cycle
    // over zero units.
    let full_coverage = !catalog.is_empty() && catalog.iter().all(|u| covered.contains(&u.id));
    if full_coverage {
        return if extended {
            PersonStatus::Extended
        } else {
            PersonStatus::Completed
        };
    }

    if extended {
        PersonStatus::Extended
    } else {
        PersonStatus::Active
    }
}

/// Distinct unit ids among a person's automatic placements.
fn covered_units(placements: &[Placement]) -> BTreeSet<UnitId> {
    placements
        .iter()
        .filter(|p| !p.manual)
        .map(|p| p.unit_id)
        .collect()
}
