use mpi::collective::CommunicatorCollectives;
use mpi::environment::Universe;
use mpi::topology::{Communicator, SimpleCommunicator};
use tracing::{debug, info, warn};

use crate::bootstrap::error::{BootstrapError, Result};
use crate::group::ProcessGroup;

pub struct MpiProcessGroup {
    world: SimpleCommunicator,
    // dropping the universe calls MPI_Finalize, so it has to be dropped after the world.
    _universe: Universe,
}

impl MpiProcessGroup {
    /// Initializes MPI. Fails if MPI was already initialized in this process. If the runtime
    /// itself cannot form the group, MPI terminates the process inside `MPI_Init`.
    pub fn join(args: &[String]) -> Result<Self> {
        debug!("Joining MPI process group with args {args:?}");
        let universe = mpi::initialize().ok_or(BootstrapError::AlreadyInitialized)?;
        let world = universe.world();

        Ok(MpiProcessGroup {
            world,
            _universe: universe,
        })
    }

    pub fn log_runtime_info(&self) {
        let (version, subversion) = mpi::environment::version();
        match self.identity() {
            Ok(identity) => info!("{identity} joined using MPI {version}.{subversion}"),
            Err(e) => warn!("{e}"),
        }
        if self.rank() == 0 {
            match mpi::environment::library_version() {
                Ok(library) => info!("{}", library.trim_end()),
                Err(e) => warn!("Could not read MPI library version: {e}"),
            }
        }
    }
}

impl ProcessGroup for MpiProcessGroup {
    fn rank(&self) -> u32 {
        self.world.rank() as u32
    }

    fn size(&self) -> u32 {
        self.world.size() as u32
    }

    fn processor_name(&self) -> String {
        mpi::environment::processor_name().unwrap_or_else(|_| String::from("unknown"))
    }

    fn leave(self) {
        info!("#{} at barrier.", self.rank());
        self.world.barrier();
        info!("Process #{} finishing.", self.rank());
    }
}
