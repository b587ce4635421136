//! Round-robin unit selection.
//!
//! Pure functions deciding which unit a person visits next. Fairness
//! for brand-new people comes from the persistent counter: the offset
//! modulo catalog size spreads first units across the catalog. After
//! that each person walks the catalog in id order, skipping units
//! already covered in their current cycle and wrapping past the end.
//! Identical inputs always produce the identical selection; the
//! auto-advance pass leans on that for idempotence.

use std::collections::BTreeSet;

use rota_ledger::{Placement, Unit, UnitId};

/// Outcome of asking for a person's next unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Visit this unit next.
    Unit(Unit),
    /// Every catalog unit is already covered in the current cycle.
    CycleComplete,
    /// No units exist to rotate through.
    EmptyCatalog,
}

/// Where a person stands in their current rotation cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleView {
    /// Units visited so far in the cycle in progress.
    pub covered: BTreeSet<UnitId>,
    /// True when the latest cycle ended exactly complete: at least one
    /// full pass over the catalog with nothing started since.
    pub complete: bool,
}

/// First unit for a person with no history. The counter offset picks
/// the starting position in catalog order.
pub fn initial_unit(catalog: &[Unit], offset: u64) -> Option<Unit> {
    if catalog.is_empty() {
        return None;
    }
    let index = (offset % catalog.len() as u64) as usize;
    Some(catalog[index].clone())
}

/// Replay a person's automatic placements in start order to find what
/// their current cycle covers. Coverage resets whenever it reaches the
/// whole catalog, so after a completed cycle the view is empty with
/// `complete` set. Placements for units no longer in the catalog are
/// ignored; manual splices never count.
pub fn cycle_view(catalog: &[Unit], placements: &[Placement]) -> CycleView {
    let catalog_ids: BTreeSet<UnitId> = catalog.iter().map(|u| u.id).collect();
    let mut autos: Vec<&Placement> = placements.iter().filter(|p| !p.manual).collect();
    autos.sort_by_key(|p| (p.start, p.id));

    let mut covered = BTreeSet::new();
    let mut passes = 0u32;
    for placement in autos {
        if catalog_ids.contains(&placement.unit_id) {
            covered.insert(placement.unit_id);
        }
        if !catalog_ids.is_empty() && covered == catalog_ids {
            covered.clear();
            passes += 1;
        }
    }
    let complete = passes > 0 && covered.is_empty();
    CycleView { covered, complete }
}

/// Next unit after `last_unit`, walking catalog order and skipping
/// covered units. A `last_unit` that is `None` or no longer in the
/// catalog starts the walk at the beginning.
pub fn next_unit(
    catalog: &[Unit],
    covered: &BTreeSet<UnitId>,
    last_unit: Option<UnitId>,
) -> Selection {
    if catalog.is_empty() {
        return Selection::EmptyCatalog;
    }
    let start = last_unit
        .and_then(|id| catalog.iter().position(|u| u.id == id))
        .map(|pos| pos + 1)
        .unwrap_or(0);
    for step in 0..catalog.len() {
        let unit = &catalog[(start + step) % catalog.len()];
        if !covered.contains(&unit.id) {
            return Selection::Unit(unit.clone());
        }
    }
    Selection::CycleComplete
}
