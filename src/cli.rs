use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::identity::IdentityBackend;

#[derive(Parser, Debug)]
#[command(name = "du", version)]
#[command(about = "Summarize disk usage of directory trees, counting hard-linked files once")]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Files or directories to measure; none means the current directory
    pub paths: Vec<PathBuf>,

    /// Print sizes in powers of 1024 (e.g. 1.50 MiB)
    #[arg(short = 'h', long)]
    pub human_readable: bool,

    /// Report sizes in units of BYTES
    #[arg(short = 'B', long, value_name = "BYTES", value_parser = clap::value_parser!(u64).range(1..))]
    pub block_size: Option<u64>,

    /// Same as --block-size=1024
    #[arg(short = 'k', conflicts_with = "block_size")]
    pub kibibytes: bool,

    /// Structure used to remember hard-linked files already counted
    #[arg(long, value_enum)]
    pub identity_set: Option<IdentityBackend>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write log output to FILE
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}
