//! Per-person operation locks.
//!
//! Schedule reads and extensions are read-decide-write sequences; two
//! of them interleaving for the same person could both decide "nothing
//! upcoming" and double-insert a placement. Each person gets a lazily
//! created async mutex; operations on different people run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use rota_ledger::PersonId;

#[derive(Default)]
pub(crate) struct PersonLocks {
    inner: Mutex<HashMap<PersonId, Arc<Mutex<()>>>>,
}

impl PersonLocks {
    /// Lock one person's scheduling scope, waiting if another operation
    /// holds it. Registry entries are created on first use and kept for
    /// the life of the engine.
    pub(crate) async fn acquire(&self, person_id: PersonId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            map.entry(person_id).or_default().clone()
        };
        entry.lock_owned().await
    }
}
