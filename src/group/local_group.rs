use std::sync::{Arc, Barrier};

use tracing::debug;

use crate::bootstrap::error::{BootstrapError, Result};
use crate::group::ProcessGroup;

const LOCAL_PROCESSOR_NAME: &str = "localhost";

/// Group of exactly one member. Collective operations return immediately.
pub struct SingleProcessGroup();

/// Member of an in-process group in which every member runs on its own thread. Join and leave
/// are rendezvous points on a barrier shared by all members.
pub struct ThreadProcessGroup {
    rank: u32,
    size: u32,
    barrier: Arc<Barrier>,
}

impl SingleProcessGroup {
    pub fn join(_args: &[String]) -> Result<Self> {
        Ok(SingleProcessGroup())
    }
}

impl ProcessGroup for SingleProcessGroup {
    fn rank(&self) -> u32 {
        0
    }

    fn size(&self) -> u32 {
        1
    }

    fn processor_name(&self) -> String {
        LOCAL_PROCESSOR_NAME.to_string()
    }

    fn leave(self) {
        debug!("Leave was called on SingleProcessGroup, which doesn't wait for anyone.")
    }
}

impl ThreadProcessGroup {
    /// Creates the members of a group of `num_members`. Each member has to be handed to its own
    /// thread before calling [`ThreadProcessGroup::join`], otherwise the join blocks forever.
    pub fn create_n(num_members: u32) -> Result<Vec<ThreadProcessGroup>> {
        if num_members == 0 {
            return Err(BootstrapError::GroupFormation(String::from(
                "a process group needs at least one member",
            )));
        }

        let barrier = Arc::new(Barrier::new(num_members as usize));
        let members = (0..num_members)
            .map(|rank| ThreadProcessGroup {
                rank,
                size: num_members,
                barrier: barrier.clone(),
            })
            .collect();
        Ok(members)
    }

    /// Collective group formation. Returns once every member has called join.
    pub fn join(self) -> Result<Self> {
        debug!("#{} waiting for {} members to join.", self.rank, self.size);
        self.barrier.wait();
        Ok(self)
    }
}

impl ProcessGroup for ThreadProcessGroup {
    fn rank(&self) -> u32 {
        self.rank
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn processor_name(&self) -> String {
        LOCAL_PROCESSOR_NAME.to_string()
    }

    fn leave(self) {
        debug!("#{} waiting for {} members to leave.", self.rank, self.size);
        self.barrier.wait();
    }
}
