use std::path::PathBuf;
use std::time::Instant;

use indicatif::HumanCount;
use log::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fs::Filesystem;
use crate::identity::IdentitySet;
use crate::report::{Diagnostics, RecordSink, UsageRecord};
use crate::utils::format_human_elapsed;
use crate::walker::UsageWalker;

/// Outcome of one run over all roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Sum of the roots' totals, in [`crate::OutputFormat::unit`]s.
    pub grand_total: u64,
    pub roots: usize,
    pub errors: usize,
    /// Distinct multiply-linked files charged.
    pub identities: usize,
}

impl RunSummary {
    pub fn is_degraded(&self) -> bool {
        self.errors > 0
    }
}

/// Walks every root of a run against one shared [`IdentitySet`].
pub struct Driver<'a, F: Filesystem> {
    fs: &'a F,
    config: &'a Config,
}

impl<'a, F: Filesystem> Driver<'a, F> {
    pub fn new(fs: &'a F, config: &'a Config) -> Self {
        Self { fs, config }
    }

    pub fn identity_set(&self) -> IdentitySet {
        IdentitySet::new(self.config.identity_set, self.config.initial_buckets)
    }

    /// Emits one record per directory and per file argument, then a `total`
    /// record when more than one root was given. No roots means `.`.
    pub fn run<S: RecordSink>(
        &self,
        roots: &[PathBuf],
        sink: &mut S,
        diagnostics: &mut Diagnostics,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        let default_root = [PathBuf::from(".")];
        let roots = if roots.is_empty() { &default_root[..] } else { roots };

        let mut identities = self.identity_set();
        info!(
            "Measuring {} root(s) with {:?} identity set",
            roots.len(),
            self.config.identity_set
        );

        let mut grand_total = 0u64;
        {
            let mut walker = UsageWalker::new(self.fs, sink, diagnostics)
                .with_unit(self.config.output_format().unit());
            for root in roots {
                let total = walker.compute_usage(root, &mut identities)?;
                info!("'{}': {} units", root.display(), total);
                grand_total += total;
            }
        }

        if roots.len() > 1 {
            sink.record(UsageRecord::total(grand_total))
                .map_err(Error::Output)?;
        }

        let summary = RunSummary {
            grand_total,
            roots: roots.len(),
            errors: diagnostics.error_count(),
            identities: identities.len(),
        };
        info!(
            "Run complete in {}: {} hard-linked files tracked, {} errors",
            format_human_elapsed(start_time.elapsed()),
            HumanCount(summary.identities as u64),
            HumanCount(summary.errors as u64)
        );
        Ok(summary)
    }
}
