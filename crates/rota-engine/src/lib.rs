//! rota-engine — rotation scheduling for people cycling through units.
//!
//! Keeps every person's schedule populated and their status honest:
//!
//! - Round-robin unit selection with a persistent fairness counter
//! - Lazy auto-advance: reads create the next placement on demand
//! - Extension/adjustment of placement end dates with an audit trail
//! - Status reconciliation derived purely from the placement ledger
//!
//! # Architecture
//!
//! ```text
//! Engine
//!   ├── LedgerStore (people, units, placements, audit, counter)
//!   ├── Clock (one "today" per operation)
//!   ├── PersonLocks (per-person read-decide-write scope)
//!   └── Pure planning
//!       ├── selector (round-robin walk, cycle coverage)
//!       ├── advance (one decision per schedule read)
//!       ├── extension (target resolution, end-date shift)
//!       └── reconcile (status derivation)
//! ```

pub mod advance;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod extension;
mod locks;
pub mod reconcile;
pub mod selector;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, RotaConfig};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use extension::ExtensionOutcome;
