use std::fmt::{Display, Formatter};

use crate::bootstrap::error::{BootstrapError, Result};

pub mod local_group;

#[cfg(feature = "mpi")]
pub mod mpi_group;

/// Membership of the calling process in a distributed run. A value of this type only exists
/// between a successful join and the call to [`ProcessGroup::leave`].
pub trait ProcessGroup {
    fn rank(&self) -> u32;

    fn size(&self) -> u32;

    /// Name of the node this member runs on. Only used for diagnostics.
    fn processor_name(&self) -> String;

    /// Collective shutdown. Blocks until every member of the group has requested it.
    fn leave(self)
    where
        Self: Sized;

    fn identity(&self) -> Result<RankIdentity> {
        RankIdentity::new(self.rank(), self.size())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankIdentity {
    rank: u32,
    size: u32,
}

impl RankIdentity {
    pub(crate) fn new(rank: u32, size: u32) -> Result<Self> {
        if size == 0 || rank >= size {
            return Err(BootstrapError::InvalidIdentity { rank, size });
        }
        Ok(RankIdentity { rank, size })
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl Display for RankIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "process {} of {}", self.rank, self.size)
    }
}
