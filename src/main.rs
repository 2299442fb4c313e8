use std::fs::File;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use du_dedup::{Cli, Config, Diagnostics, Driver, LocalFs, PROGRAM_NAME, TextReport};

fn init_logging(config: &Config) -> Result<()> {
    let level = config.level_filter()?;
    let mut builder = ConfigBuilder::new();
    // Falls back to UTC when the local offset cannot be determined.
    let _ = builder.set_time_offset_to_local();
    let log_config = builder.build();

    // Records go to stdout, so terminal logging stays on stderr.
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(ref path) = config.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: '{}'", path.display()))?;
        loggers.push(WriteLogger::new(level, log_config, file));
    }
    CombinedLogger::init(loggers).context("Failed to initialize logging")
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;
    init_logging(&config)?;

    let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    info!(
        "Starting {} v{} at {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        started.format(&Rfc3339)?
    );
    debug!("Command line arguments: {:?}", cli);
    debug!("Effective configuration: {:?}", config);

    let mut report = TextReport::new(io::stdout().lock(), config.output_format());
    let mut diagnostics = Diagnostics::stderr(PROGRAM_NAME);
    let summary = Driver::new(&LocalFs, &config)
        .run(&cli.paths, &mut report, &mut diagnostics)
        .context("Disk usage run aborted")?;

    if summary.is_degraded() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
