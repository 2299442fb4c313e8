use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use indicatif::HumanBytes;
use log::debug;

use crate::error::Error;

pub const TOTAL_LABEL: &str = "total";

/// One output line: a usage total and the path it was computed for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageRecord {
    /// Total in the run's unit (see [`OutputFormat::unit`]).
    pub blocks: u64,
    pub path: PathBuf,
}

impl UsageRecord {
    pub fn new(blocks: u64, path: &Path) -> Self {
        Self {
            blocks,
            path: path.to_path_buf(),
        }
    }

    pub fn total(blocks: u64) -> Self {
        Self {
            blocks,
            path: PathBuf::from(TOTAL_LABEL),
        }
    }
}

/// Receives records in the order the walk completes them.
pub trait RecordSink {
    fn record(&mut self, record: UsageRecord) -> io::Result<()>;
}

impl RecordSink for Vec<UsageRecord> {
    fn record(&mut self, record: UsageRecord) -> io::Result<()> {
        self.push(record);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputFormat {
    pub block_size: u64,
    pub human_readable: bool,
}

impl OutputFormat {
    /// Bytes per counted unit: single bytes when printing human-readable
    /// sizes, otherwise the block size.
    pub fn unit(&self) -> u64 {
        if self.human_readable { 1 } else { self.block_size }
    }

    /// Renders a total already counted in [`OutputFormat::unit`]s.
    pub fn size(&self, units: u64) -> String {
        if self.human_readable {
            HumanBytes(units).to_string()
        } else {
            units.to_string()
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            block_size: 1024,
            human_readable: false,
        }
    }
}

/// Writes `<size>\t<path>` lines.
pub struct TextReport<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for TextReport<W> {
    fn record(&mut self, record: UsageRecord) -> io::Result<()> {
        writeln!(
            self.out,
            "{}\t{}",
            self.format.size(record.blocks),
            record.path.display()
        )
    }
}

enum Stream {
    Stderr { colored: bool },
    Captured(Vec<String>),
}

/// Destination for recoverable errors; remembers that any were reported.
pub struct Diagnostics {
    program: String,
    stream: Stream,
    errors: usize,
}

impl Diagnostics {
    /// Reports to standard error, coloring the prefix on a terminal.
    pub fn stderr(program: &str) -> Self {
        Self {
            program: program.to_string(),
            stream: Stream::Stderr {
                colored: io::stderr().is_terminal(),
            },
            errors: 0,
        }
    }

    /// Keeps reported lines in memory instead of printing them.
    pub fn captured(program: &str) -> Self {
        Self {
            program: program.to_string(),
            stream: Stream::Captured(Vec::new()),
            errors: 0,
        }
    }

    pub fn report(&mut self, error: &Error) {
        self.errors += 1;
        debug!("Reported error #{}: {:?}", self.errors, error);
        match self.stream {
            Stream::Stderr { colored } => {
                let prefix = format!("{}:", self.program);
                let prefix = if colored {
                    prefix.red().bold().to_string()
                } else {
                    prefix
                };
                // Nowhere left to report a failing stderr.
                let _ = writeln!(io::stderr().lock(), "{prefix} {error}");
            }
            Stream::Captured(ref mut lines) => {
                lines.push(format!("{}: {error}", self.program));
            }
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Sticky: true once any error has been reported.
    pub fn is_degraded(&self) -> bool {
        self.errors > 0
    }

    pub fn lines(&self) -> &[String] {
        match self.stream {
            Stream::Captured(ref lines) => lines,
            Stream::Stderr { .. } => &[],
        }
    }
}
