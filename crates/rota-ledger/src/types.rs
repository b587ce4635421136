//! Domain types for the rotation ledger.
//!
//! People rotate through a catalog of units via placements (inclusive
//! date ranges). Every extension or adjustment leaves an append-only
//! audit record. All types are JSON-serialized into redb value columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a person, allocated by the ledger.
pub type PersonId = u64;

/// Identifier for a rotation unit, allocated by the ledger.
pub type UnitId = u32;

/// Identifier for a placement, allocated by the ledger.
pub type PlacementId = u64;

/// Identifier for an extension audit record, allocated by the ledger.
pub type ExtensionRecordId = u64;

// ── People ─────────────────────────────────────────────────────

/// Intake batch a person belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Batch {
    A,
    B,
}

impl Batch {
    pub fn label(&self) -> &'static str {
        match self {
            Batch::A => "a",
            Batch::B => "b",
        }
    }
}

/// Lifecycle status of a person, derived from their placement history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    /// Still working through the base rotation cycle.
    Active,
    /// Base cycle done, serving granted extension days.
    Extended,
    /// Cycle and any extensions finished, nothing current or upcoming.
    Completed,
}

impl PersonStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PersonStatus::Active => "active",
            PersonStatus::Extended => "extended",
            PersonStatus::Completed => "completed",
        }
    }
}

/// A rotating staff member tracked by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub batch: Batch,
    /// First day the person is available for placement.
    pub start_date: NaiveDate,
    pub status: PersonStatus,
    /// Cumulative extension days granted so far.
    pub extension_days: u32,
}

// ── Units ──────────────────────────────────────────────────────

/// Relative workload of a unit. Informational; does not affect scheduling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadTier {
    Low,
    Medium,
    High,
}

impl WorkloadTier {
    pub fn label(&self) -> &'static str {
        match self {
            WorkloadTier::Low => "low",
            WorkloadTier::Medium => "medium",
            WorkloadTier::High => "high",
        }
    }
}

/// A rotation unit people cycle through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    /// Length of one placement in this unit, in days. Always >= 1.
    pub duration_days: u32,
    pub workload: WorkloadTier,
}

// ── Placements ─────────────────────────────────────────────────

/// One person's stay in one unit over an inclusive date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub id: PlacementId,
    pub person_id: PersonId,
    pub unit_id: UnitId,
    pub start: NaiveDate,
    /// Last day of the stay, inclusive. `end >= start` always holds.
    pub end: NaiveDate,
    /// True once an operator has spliced or adjusted this placement.
    pub manual: bool,
}

impl Placement {
    /// Whether `day` falls inside the inclusive `[start, end]` range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Whether the placement is still running on `today` or scheduled
    /// beyond it. Equivalent to `end >= today` for a well-formed range.
    pub fn current_or_upcoming(&self, today: NaiveDate) -> bool {
        self.end >= today
    }
}

// ── Extensions ─────────────────────────────────────────────────

/// Why an extension or adjustment was granted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionReason {
    SignOut,
    Presentation,
    InternalQuery,
    Leave,
    Other,
}

impl ExtensionReason {
    pub fn label(&self) -> &'static str {
        match self {
            ExtensionReason::SignOut => "sign_out",
            ExtensionReason::Presentation => "presentation",
            ExtensionReason::InternalQuery => "internal_query",
            ExtensionReason::Leave => "leave",
            ExtensionReason::Other => "other",
        }
    }
}

/// Append-only audit entry for one extension or adjustment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtensionRecord {
    pub id: ExtensionRecordId,
    pub person_id: PersonId,
    /// Signed day delta this request applied (negative when shortened).
    pub delta_days: i64,
    pub reason: ExtensionReason,
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}
