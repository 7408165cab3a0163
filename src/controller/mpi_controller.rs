use std::process::ExitCode;
use std::{env, io};

use clap::Parser;
use tracing::{error, info, warn};

use crate::config::{CommandLineArgs, Config};
use crate::group::mpi_group::MpiProcessGroup;
use crate::group::ProcessGroup;
use crate::{bootstrap, controller, logging};

/// Entry point of a process started by an MPI launcher such as `mpirun` or `srun`. The group size
/// is whatever the launcher started.
pub fn run_mpi() -> ExitCode {
    let args = CommandLineArgs::parse();
    let process_args: Vec<String> = env::args().collect();

    let config = {
        let _guard = logging::init_std_err_logging_thread_local();
        match Config::from_args(&args) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let mut log_guards = None;
    let result = bootstrap::run(
        &process_args,
        |process_args| {
            let group = MpiProcessGroup::join(process_args)?;
            log_guards = Some(logging::init_logging(&config, group.rank()));
            group.log_runtime_info();
            if args.num_procs != 1 && args.num_procs != group.size() {
                warn!(
                    "Ignoring --num-procs {}. The launcher started {} processes.",
                    args.num_procs,
                    group.size()
                );
            }
            Ok(group)
        },
        &mut io::stdout(),
    );

    if let Ok(identity) = &result {
        info!("{identity} finished.");
    }
    drop(log_guards);

    controller::exit_code(result)
}
