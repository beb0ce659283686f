use crate::error::AppError;
use crate::models::{NewCafe, ReconcileCounts};
use crate::traits::CafeStore;

/// Upserts collected batches into the store.
#[derive(Clone)]
pub struct Reconciler<S: CafeStore> {
    store: S,
}

impl<S: CafeStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upsert every café of a batch, one record at a time.
    ///
    /// The batch is not atomic: if the store rejects a record, records before
    /// it stay written and the error is returned.
    pub async fn reconcile(&self, cafes: &[NewCafe]) -> Result<ReconcileCounts, AppError> {
        let mut counts = ReconcileCounts::default();
        for cafe in cafes {
            let outcome = self.store.upsert(cafe).await.map_err(|e| {
                tracing::warn!(external_id = %cafe.external_id, error = %e, "Upsert rejected");
                e
            })?;
            counts.record(outcome);
        }
        Ok(counts)
    }
}
