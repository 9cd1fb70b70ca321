use serde::{Deserialize, Serialize};

use crate::domain::{TxHash, WriteFunction};

pub const UNSET_TIMESTAMP: &str = "N/A";
pub const ZERO_ELAPSED: &str = "0:00:00";

/// Display-ready snapshot of the stopwatch contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchView {
    pub elapsed_time: String,
    pub is_running: bool,
    pub start_time: String,
    pub current_time: String,
}

impl Default for StopwatchView {
    fn default() -> Self {
        Self {
            elapsed_time: ZERO_ELAPSED.to_string(),
            is_running: false,
            start_time: UNSET_TIMESTAMP.to_string(),
            current_time: UNSET_TIMESTAMP.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionError {
    pub function: WriteFunction,
    pub message: String,
}

/// Lifecycle of the most recent write transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    pub is_loading: bool,
    pub is_pending: bool,
    pub is_confirming: bool,
    pub is_confirmed: bool,
    pub hash: Option<TxHash>,
    pub error: Option<TransactionError>,
}
