use std::process::ExitCode;

use tracing::error;

use crate::bootstrap::error::Result;
use crate::logging;

pub mod local_controller;
#[cfg(feature = "mpi")]
pub mod mpi_controller;

/// Every failure of the bootstrap ends the process with a non-zero status. There are no specific
/// exit codes.
pub(crate) fn exit_code<T>(result: Result<T>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let _guard = logging::init_std_err_logging_thread_local();
            error!("Bootstrap failed: {e}");
            ExitCode::FAILURE
        }
    }
}
