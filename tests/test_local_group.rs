use mpi_bootstrap::bootstrap::error::BootstrapError;
use mpi_bootstrap::config::{Config, Logging, Output};
use mpi_bootstrap::controller::local_controller::{run_single, run_threads};
use mpi_bootstrap::group::RankIdentity;
use mpi_bootstrap::logging::log_file_name;
use std::collections::HashSet;
use std::io;
use std::io::Write;
use std::process::Command;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq)]
enum Behavior {
    Write,
    Fail,
    Panic,
}

/// Collects the report lines of all members in one buffer.
struct TestWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
    behavior: Behavior,
}

impl Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.behavior {
            Behavior::Write => self.buffer.lock().unwrap().write(buf),
            Behavior::Fail => Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
            Behavior::Panic => panic!("member crashed while reporting"),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn lines(buffer: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    let content = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    content.lines().map(String::from).collect()
}

fn parse_line(line: &str) -> (u32, u32) {
    let rest = line
        .strip_prefix("Hello world from process ")
        .unwrap_or_else(|| panic!("unexpected report line: {line}"));
    let (rank, size) = rest.split_once(" of ").unwrap();
    (rank.parse().unwrap(), size.parse().unwrap())
}

fn execute(
    num_procs: u32,
    config: &Config,
    failing_rank: Option<(u32, Behavior)>,
) -> (Result<Vec<RankIdentity>, BootstrapError>, Vec<String>) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let result = run_threads(num_procs, config, &[], |rank| TestWriter {
        buffer: buffer.clone(),
        behavior: match failing_rank {
            Some((r, behavior)) if r == rank => behavior,
            _ => Behavior::Write,
        },
    });
    let lines = lines(&buffer);
    (result, lines)
}

#[test]
fn single_member_group() {
    let (result, lines) = execute(1, &Config::default(), None);

    let identities = result.unwrap();
    assert_eq!(identities.len(), 1);
    assert_eq!(lines, vec!["Hello world from process 0 of 1"]);
}

#[test]
fn four_members_report_every_rank_once() {
    let (result, lines) = execute(4, &Config::default(), None);

    let identities = result.unwrap();
    let ranks: Vec<u32> = identities.iter().map(|i| i.rank()).collect();
    assert_eq!(ranks, vec![0, 1, 2, 3]);

    assert_eq!(lines.len(), 4);
    let parsed: Vec<(u32, u32)> = lines.iter().map(|l| parse_line(l)).collect();
    let reported_ranks: HashSet<u32> = parsed.iter().map(|(rank, _)| *rank).collect();
    assert_eq!(reported_ranks, (0..4).collect());
    assert!(parsed.iter().all(|(_, size)| *size == 4));
}

#[test]
fn many_members_report_without_gaps() {
    let num_procs = 16;
    let (result, lines) = execute(num_procs, &Config::default(), None);

    assert!(result.is_ok());
    let mut ranks: Vec<u32> = lines.iter().map(|l| parse_line(l).0).collect();
    ranks.sort();
    assert_eq!(ranks, (0..num_procs).collect::<Vec<_>>());
}

#[test]
fn empty_group_fails_before_any_report() {
    let (result, lines) = execute(0, &Config::default(), None);

    assert!(matches!(result, Err(BootstrapError::GroupFormation(_))));
    assert!(lines.is_empty());
}

#[test]
fn failed_report_does_not_block_other_members() {
    let (result, lines) = execute(4, &Config::default(), Some((2, Behavior::Fail)));

    assert!(matches!(result, Err(BootstrapError::Report(_))));
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| parse_line(l).0 != 2));
}

#[test]
fn crashed_member_is_collective_mismatch() {
    let (result, lines) = execute(3, &Config::default(), Some((1, Behavior::Panic)));

    assert!(matches!(result, Err(BootstrapError::CollectiveMismatch(1))));
    assert_eq!(lines.len(), 2);
}

#[test]
fn panic_while_creating_writer_does_not_block_other_members() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let (done, finished) = mpsc::channel();

    let shared = buffer.clone();
    thread::spawn(move || {
        let result = run_threads(3, &Config::default(), &[], |rank| {
            if rank == 1 {
                panic!("no stream for member #1");
            }
            TestWriter {
                buffer: shared.clone(),
                behavior: Behavior::Write,
            }
        });
        done.send(result).unwrap();
    });

    let result = finished
        .recv_timeout(Duration::from_secs(30))
        .expect("group did not shut down");
    assert!(matches!(result, Err(BootstrapError::CollectiveMismatch(1))));

    let lines = lines(&buffer);
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| parse_line(l).0 != 1));
}

#[test]
fn run_single_writes_one_line() {
    let mut out = Vec::new();
    let identity = run_single(&Config::default(), &[], &mut out).unwrap();

    assert_eq!(identity.rank(), 0);
    assert_eq!(identity.size(), 1);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Hello world from process 0 of 1\n"
    );
}

#[test]
fn every_member_writes_its_own_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.set_output(Output {
        output_dir: dir.path().to_path_buf(),
        logging: Logging::Info,
    });

    let (result, _) = execute(3, &config, None);
    assert!(result.is_ok());

    for rank in 0..3 {
        let log_file = dir.path().join(log_file_name(rank));
        assert!(log_file.exists(), "missing log file {log_file:?}");
    }
}

#[test]
fn local_hello_exits_with_success() {
    let output = Command::new(env!("CARGO_BIN_EXE_local_hello"))
        .args(["-n", "4"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut ranks: Vec<u32> = stdout.lines().map(|l| parse_line(l).0).collect();
    ranks.sort();
    assert_eq!(ranks, vec![0, 1, 2, 3]);
}

#[test]
fn local_hello_exits_with_failure_on_empty_group() {
    let output = Command::new(env!("CARGO_BIN_EXE_local_hello"))
        .args(["-n", "0"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
