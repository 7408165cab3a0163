use std::io::Write;
use std::process::ExitCode;
use std::sync::mpsc;
use std::{env, io, thread};

use clap::Parser;
use tracing::{error, info};

use crate::bootstrap::error::{BootstrapError, Result};
use crate::config::{CommandLineArgs, Config};
use crate::group::local_group::{SingleProcessGroup, ThreadProcessGroup};
use crate::group::{ProcessGroup, RankIdentity};
use crate::{bootstrap, controller, logging};

/// Runs the bootstrap on `num_procs` threads which form one in-process group. `create_writer` is
/// called on each member thread once it has joined and yields the stream the report line goes
/// to. Returns the identities of all members ordered by rank.
pub fn run_threads<W, F>(
    num_procs: u32,
    config: &Config,
    process_args: &[String],
    create_writer: F,
) -> Result<Vec<RankIdentity>>
where
    W: Write,
    F: Fn(u32) -> W + Sync,
{
    info!("Starting in-process group with {num_procs} members.");
    let members = ThreadProcessGroup::create_n(num_procs)?;

    let results = thread::scope(|scope| -> Result<Vec<(u32, Result<RankIdentity>)>> {
        // Members wait for their start signal, so no member blocks in join before every member
        // has a thread.
        let mut started = Vec::with_capacity(members.len());
        for member in members {
            let rank = member.rank();
            let (start, wait_for_start) = mpsc::channel::<()>();
            let create_writer = &create_writer;
            let spawned = thread::Builder::new()
                .name(rank.to_string())
                .spawn_scoped(scope, move || {
                    if wait_for_start.recv().is_err() {
                        return Err(BootstrapError::GroupFormation(format!(
                            "member #{rank} was not started"
                        )));
                    }
                    let _guards = logging::init_logging(config, rank);
                    bootstrap::run_with(
                        process_args,
                        |_| member.join(),
                        |identity| create_writer(identity.rank()),
                    )
                });

            match spawned {
                Ok(handle) => started.push((rank, start, handle)),
                // dropping the senders releases the members spawned so far
                Err(e) => {
                    return Err(BootstrapError::GroupFormation(format!(
                        "Failed to spawn thread for member #{rank}: {e}"
                    )))
                }
            }
        }

        let handles: Vec<_> = started
            .into_iter()
            .map(|(rank, start, handle)| {
                // a member only hangs up before the signal if it has already terminated
                let _ = start.send(());
                (rank, handle)
            })
            .collect();

        let results: Vec<(u32, Result<RankIdentity>)> = handles
            .into_iter()
            .map(|(rank, handle)| {
                // a member which panicked has still left the group while unwinding
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(BootstrapError::CollectiveMismatch(rank)));
                (rank, result)
            })
            .collect();
        Ok(results)
    })?;

    let mut identities = Vec::with_capacity(results.len());
    for (rank, result) in results {
        match result {
            Ok(identity) => identities.push(identity),
            Err(e) => {
                error!("Member #{rank} failed: {e}");
                return Err(e);
            }
        }
    }
    Ok(identities)
}

/// Runs the bootstrap as the only member of a group on the calling thread.
pub fn run_single<W: Write>(
    config: &Config,
    process_args: &[String],
    out: &mut W,
) -> Result<RankIdentity> {
    let _guards = logging::init_logging(config, 0);
    bootstrap::run(process_args, SingleProcessGroup::join, out)
}

/// Entry point of the local launcher. Parses the command line, then runs a single member on the
/// main thread or `--num-procs` members on their own threads.
pub fn run_local_from_args() -> ExitCode {
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

    let result = if args.num_procs == 1 {
        run_single(&config, &process_args, &mut io::stdout()).map(|identity| vec![identity])
    } else {
        let _guard = logging::init_std_err_logging_thread_local();
        run_threads(args.num_procs, &config, &process_args, |_| io::stdout())
    };

    controller::exit_code(result)
}
