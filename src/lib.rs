pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod fs;
pub mod identity;
pub mod report;
pub mod utils;
pub mod walker;

pub use cli::Cli;
pub use config::Config;
pub use driver::{Driver, RunSummary};
pub use error::{Error, Result};
pub use fs::{EntryKind, EntryMetadata, Filesystem, LocalFs, join_child};
pub use identity::{FileIdentity, IdentityBackend, IdentitySet};
pub use report::{Diagnostics, OutputFormat, RecordSink, TextReport, UsageRecord};
pub use utils::{format_human_elapsed, scale_blocks};
pub use walker::UsageWalker;

/// Name that prefixes every diagnostic line.
pub const PROGRAM_NAME: &str = "du";
