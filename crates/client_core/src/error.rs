use shared::{
    domain::WriteFunction,
    error::{ChainError, ErrorKind},
};
use thiserror::Error;

use crate::controls::ActionRejected;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    #[error("failed to call {function}: {source}")]
    Call {
        function: WriteFunction,
        source: ChainError,
    },
}

impl WriteError {
    pub fn function(&self) -> WriteFunction {
        match self {
            Self::Call { function, .. } => *function,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Call {
                source: ChainError::NoAccount,
                ..
            } => ErrorKind::NoWallet,
            Self::Call { .. } => ErrorKind::Write,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Rejected(#[from] ActionRejected),
    #[error(transparent)]
    Write(#[from] WriteError),
}
