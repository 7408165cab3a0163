use std::io;

use thiserror::Error;

use crate::bootstrap::SessionState;

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The runtime could not establish the process group. Not retried.
    #[error("Failed to form the process group: {0}")]
    GroupFormation(String),

    /// A group operation was invoked outside of the join/leave window or out of order.
    #[error("Protocol violation: '{operation}' is not allowed in state {state:?}")]
    ProtocolViolation {
        operation: &'static str,
        state: SessionState,
    },

    /// The process was already a member of an MPI group. MPI can only be initialized once per
    /// process, even after the earlier group was left.
    #[error("MPI has already been initialized in this process")]
    AlreadyInitialized,

    /// The runtime handed out a rank that is not in [0, size).
    #[error("Invalid rank identity: rank {rank} of size {size}")]
    InvalidIdentity { rank: u32, size: u32 },

    #[error("Failed to write the report line: {0}")]
    Report(#[from] io::Error),

    /// A member terminated abnormally. Only detectable for in-process groups, MPI handles this
    /// inside its own shutdown.
    #[error("Member #{0} of the group did not finish")]
    CollectiveMismatch(u32),
}

impl BootstrapError {
    pub(crate) fn violation(operation: &'static str, state: SessionState) -> Self {
        BootstrapError::ProtocolViolation { operation, state }
    }

    /// True for errors caused by calling group operations in a sequence the runtime does not allow.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            BootstrapError::ProtocolViolation { .. } | BootstrapError::AlreadyInitialized
        )
    }
}
