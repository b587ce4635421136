//! redb table definitions for the rotation ledger.
//!
//! People and units are keyed by their numeric ids. Placement and audit
//! rows use composite `(person_id, row_id)` keys so one person's records
//! are contiguous and can be fetched with a single range scan.

use redb::TableDefinition;

/// People keyed by `person_id`.
pub const PERSONS: TableDefinition<u64, &[u8]> = TableDefinition::new("persons");

/// Units keyed by `unit_id`. Ascending key order is the rotation order.
pub const UNITS: TableDefinition<u32, &[u8]> = TableDefinition::new("units");

/// Placements keyed by `(person_id, placement_id)`.
pub const PLACEMENTS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("placements");

/// Extension audit records keyed by `(person_id, record_id)`.
pub const EXTENSIONS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("extensions");

/// Singleton counters: id sequences plus the round-robin offset.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Meta key for the global round-robin fairness counter.
pub const META_ROUND_ROBIN: &str = "round_robin_offset";

/// Meta keys for the id allocation sequences (all start at 1).
pub const META_NEXT_PERSON: &str = "next_person_id";
pub const META_NEXT_UNIT: &str = "next_unit_id";
pub const META_NEXT_PLACEMENT: &str = "next_placement_id";
pub const META_NEXT_EXTENSION: &str = "next_extension_id";
