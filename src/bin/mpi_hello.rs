#[cfg(feature = "mpi")]
use mpi_bootstrap::controller::mpi_controller;
#[cfg(feature = "mpi")]
use std::process::ExitCode;

#[cfg(feature = "mpi")]
fn main() -> ExitCode {
    mpi_controller::run_mpi()
}
