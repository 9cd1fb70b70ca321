use shared::{
    domain::TxHash,
    view::{TransactionError, TransactionState},
};

/// Lifecycle of the latest write. Each write bumps `generation`; updates
/// carrying an older generation are dropped.
#[derive(Debug, Default)]
pub(crate) struct TransactionTracker {
    generation: u64,
    is_pending: bool,
    is_confirming: bool,
    is_confirmed: bool,
    hash: Option<TxHash>,
    error: Option<TransactionError>,
}

impl TransactionTracker {
    pub(crate) fn begin(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        *self = Self {
            generation,
            is_pending: true,
            ..Self::default()
        };
        generation
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) fn accepted(&mut self, generation: u64, hash: TxHash) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.is_pending = false;
        self.hash = Some(hash);
        self.is_confirming = true;
        true
    }

    pub(crate) fn failed(&mut self, generation: u64, error: TransactionError) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.is_pending = false;
        self.is_confirming = false;
        self.error = Some(error);
        true
    }

    pub(crate) fn confirmed(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || !self.is_confirming {
            return false;
        }
        self.is_confirming = false;
        self.is_confirmed = true;
        true
    }

    pub(crate) fn snapshot(&self, submitting: bool) -> TransactionState {
        TransactionState {
            is_loading: submitting || self.is_pending || self.is_confirming,
            is_pending: self.is_pending,
            is_confirming: self.is_confirming,
            is_confirmed: self.is_confirmed,
            hash: self.hash,
            error: self.error.clone(),
        }
    }
}
