//! rota-ledger — embedded rotation ledger for Rota.
//!
//! Backed by [redb](https://docs.rs/redb), persists the rotation state:
//! people, the unit catalog, placements, extension audit records, and the
//! global round-robin counter.
//!
//! # Architecture
//!
//! Domain types are JSON-serialized into redb's `&[u8]` value columns.
//! People and units are keyed by their numeric ids; placement and audit
//! rows use composite `(person_id, row_id)` keys so one person's history
//! is a contiguous range scan.
//!
//! Writes that must be atomic (the fairness-counter bump on a first
//! placement, the person-plus-placement update of an extension) are
//! single redb write transactions exposed as `commit_*` methods.
//!
//! The `LedgerStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{LedgerError, LedgerResult};
pub use store::LedgerStore;
pub use types::*;
