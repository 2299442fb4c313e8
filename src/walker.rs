use std::path::Path;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::fs::{EntryMetadata, Filesystem, RAW_BLOCK_SIZE, join_child};
use crate::identity::IdentitySet;
use crate::report::{Diagnostics, RecordSink, UsageRecord};
use crate::utils::scale_blocks;

/// Depth-first accumulator of block usage.
///
/// Every directory gets one record, emitted after all of its
/// subdirectories' records. Files met under more than one name are
/// charged once per [`IdentitySet`].
///
/// Each entry is converted to the reporting unit before it is added, so
/// every total is the exact sum of the totals printed beneath it.
pub struct UsageWalker<'a, F: Filesystem, S: RecordSink> {
    fs: &'a F,
    sink: &'a mut S,
    diagnostics: &'a mut Diagnostics,
    unit: u64,
}

impl<'a, F: Filesystem, S: RecordSink> UsageWalker<'a, F, S> {
    pub fn new(fs: &'a F, sink: &'a mut S, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            fs,
            sink,
            diagnostics,
            unit: RAW_BLOCK_SIZE,
        }
    }

    /// Counts in units of `bytes` instead of 512-byte blocks. Every entry
    /// is rounded up to a whole unit.
    pub fn with_unit(mut self, bytes: u64) -> Self {
        self.unit = bytes.max(1);
        self
    }

    /// Returns the total charged under `path`, in the walker's unit.
    ///
    /// Unreadable entries are reported and contribute nothing; only
    /// allocation and output failures are returned as errors.
    pub fn compute_usage(&mut self, path: &Path, identities: &mut IdentitySet) -> Result<u64> {
        let metadata = match self.fs.metadata(path) {
            Ok(metadata) => metadata,
            Err(source) => {
                self.diagnostics.report(&Error::MetadataUnavailable {
                    path: path.to_path_buf(),
                    source,
                });
                return Ok(0);
            }
        };

        if metadata.is_dir() {
            self.directory_usage(path, &metadata, identities)
        } else {
            let blocks = self.charge(path, &metadata, identities)?;
            self.emit(blocks, path)?;
            Ok(blocks)
        }
    }

    fn directory_usage(
        &mut self,
        path: &Path,
        metadata: &EntryMetadata,
        identities: &mut IdentitySet,
    ) -> Result<u64> {
        let names = match self.fs.read_dir(path) {
            Ok(names) => names,
            Err(source) => {
                self.diagnostics.report(&Error::DirectoryUnreadable {
                    path: path.to_path_buf(),
                    source,
                });
                let own = self.units(metadata.blocks);
                self.emit(own, path)?;
                return Ok(own);
            }
        };

        // The directory's own storage: the "." entry.
        let mut total = self.units(metadata.blocks);

        for name in names {
            let name = match name {
                Ok(name) => name,
                Err(source) => {
                    self.diagnostics.report(&Error::EntryUnreadable {
                        path: path.to_path_buf(),
                        source,
                    });
                    continue;
                }
            };
            if name == "." || name == ".." {
                continue;
            }

            let child = match join_child(path, &name) {
                Ok(child) => child,
                Err(err) => {
                    self.diagnostics.report(&err);
                    continue;
                }
            };
            let child_metadata = match self.fs.metadata(&child) {
                Ok(metadata) => metadata,
                Err(source) => {
                    self.diagnostics.report(&Error::MetadataUnavailable {
                        path: child,
                        source,
                    });
                    continue;
                }
            };

            total += if child_metadata.is_dir() {
                self.directory_usage(&child, &child_metadata, identities)?
            } else {
                self.charge(&child, &child_metadata, identities)?
            };
        }

        debug!("Finished directory '{}': {} units", path.display(), total);
        self.emit(total, path)?;
        Ok(total)
    }

    /// Units to charge for a non-directory: all of them on first sighting,
    /// none for a hard link whose identity was already charged.
    fn charge(
        &self,
        path: &Path,
        metadata: &EntryMetadata,
        identities: &mut IdentitySet,
    ) -> Result<u64> {
        if metadata.nlink <= 1 {
            return Ok(self.units(metadata.blocks));
        }
        if identities.test_and_insert(metadata.identity)? {
            trace!("Skipping '{}', {:?} already counted", path.display(), metadata.identity);
            Ok(0)
        } else {
            trace!("Charging '{}' for {:?}", path.display(), metadata.identity);
            Ok(self.units(metadata.blocks))
        }
    }

    fn units(&self, raw_blocks: u64) -> u64 {
        scale_blocks(raw_blocks, self.unit)
    }

    fn emit(&mut self, blocks: u64, path: &Path) -> Result<()> {
        self.sink
            .record(UsageRecord::new(blocks, path))
            .map_err(Error::Output)
    }
}
