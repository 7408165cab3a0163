use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineArgs {
    /// Optional yaml config file.
    #[arg(long, short)]
    pub config: Option<String>,
    /// Number of members of the in-process group. Under MPI the launcher decides the group size
    /// and this value is ignored.
    #[arg(long, short, default_value_t = 1)]
    pub num_procs: u32,
    /// Overrides `output.output_dir` of the config file.
    #[arg(long, short)]
    pub output_dir: Option<String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open config file at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    output: Output,
    #[serde(skip)]
    context: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Output {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub logging: Logging,
}

/// Whether a log file is written per rank. The console log of rank 0 is always on.
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum Logging {
    #[default]
    None,
    Info,
}

/// Parameters of the simulation kernel which will run on top of the process group. Reserved:
/// nothing constructs, parses or reads this yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationArgs {
    /// Id of the measurement series. Does not repeat the computation.
    pub series: u64,
    /// Points per cell.
    pub ppc: u64,
    /// Side length of the membrane.
    pub a: f64,
    /// Right hand side of the equation.
    pub theta: f64,
    /// Number of iterations of the iterative method.
    pub iters: u64,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.context = Some(path.to_path_buf());
        Ok(config)
    }

    /// Loads the config file passed on the command line, or the defaults if there is none, and
    /// applies the command line overrides.
    pub fn from_args(args: &CommandLineArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Config::from_file(Path::new(path))?,
            None => Config::default(),
        };

        if let Some(output_dir) = &args.output_dir {
            info!("Overriding output dir with {output_dir}");
            let output = Output {
                output_dir: PathBuf::from(output_dir),
                ..config.output().clone()
            };
            config.set_output(output);
        }
        Ok(config)
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn set_output(&mut self, output: Output) {
        self.output = output;
    }

    /// Output directory, relative paths are taken relative to the config file.
    pub fn output_dir(&self) -> PathBuf {
        resolve_path(&self.context, &self.output.output_dir)
    }
}

impl Default for Output {
    fn default() -> Self {
        Output {
            output_dir: default_output_dir(),
            logging: Logging::None,
        }
    }
}

pub fn resolve_path(config_path: &Option<PathBuf>, file_path: &Path) -> PathBuf {
    if file_path.is_absolute() || file_path.starts_with("./") {
        return file_path.to_path_buf();
    }

    if let Some(path) = config_path.as_ref().and_then(|c| c.parent()) {
        path.join(file_path)
    } else {
        file_path.to_path_buf()
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./")
}
