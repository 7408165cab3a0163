use mpi_bootstrap::controller::local_controller;
use std::process::ExitCode;

fn main() -> ExitCode {
    local_controller::run_local_from_args()
}
