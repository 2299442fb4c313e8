use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_BUCKETS: usize = 4096;

const FNV_OFFSET_BASIS: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;
const GROWTH_FACTOR: usize = 4;
const MAX_LOAD: usize = 2;

/// Device and inode number of one physical file, shared by all of its hard links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileIdentity {
    pub device: u64,
    pub inode: u64,
}

impl FileIdentity {
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }

    /// FNV-1a over the device bytes followed by the inode bytes.
    pub fn fnv_hash(&self) -> u32 {
        self.device
            .to_le_bytes()
            .iter()
            .chain(self.inode.to_le_bytes().iter())
            .fold(FNV_OFFSET_BASIS, |h, &b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
    }
}

/// Which structure backs an [`IdentitySet`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IdentityBackend {
    /// Chained hash table, amortized constant time.
    #[default]
    Hash,
    /// Device map of inode sets, logarithmic time.
    Tree,
}

/// The identities already charged to a run's total.
///
/// The set only grows. Build a fresh one for every run: reusing a set
/// across walks makes every hard-linked file look already counted.
#[derive(Debug)]
pub enum IdentitySet {
    Hashed(HashedIdentities),
    Ordered(OrderedIdentities),
}

impl IdentitySet {
    pub fn new(backend: IdentityBackend, initial_buckets: usize) -> Self {
        match backend {
            IdentityBackend::Hash => IdentitySet::Hashed(HashedIdentities::with_buckets(initial_buckets)),
            IdentityBackend::Tree => IdentitySet::Ordered(OrderedIdentities::new()),
        }
    }

    /// Returns `true` if `identity` was already a member. Otherwise inserts it
    /// and returns `false`.
    pub fn test_and_insert(&mut self, identity: FileIdentity) -> Result<bool> {
        match self {
            IdentitySet::Hashed(set) => set.test_and_insert(identity),
            IdentitySet::Ordered(set) => Ok(set.test_and_insert(identity)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IdentitySet::Hashed(set) => set.len(),
            IdentitySet::Ordered(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdentitySet {
    fn default() -> Self {
        IdentitySet::new(IdentityBackend::Hash, DEFAULT_BUCKETS)
    }
}

/// Separate-chaining hash table of identities.
///
/// The bucket array is allocated on first insert and grows fourfold once
/// the table holds more than two identities per bucket. Every allocation
/// goes through `try_reserve` so running out of memory surfaces as
/// [`crate::Error::AllocationFailure`].
#[derive(Debug)]
pub struct HashedIdentities {
    buckets: Vec<Vec<FileIdentity>>,
    initial_buckets: usize,
    len: usize,
}

impl HashedIdentities {
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    pub fn with_buckets(initial_buckets: usize) -> Self {
        Self {
            buckets: Vec::new(),
            initial_buckets: initial_buckets.max(1),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn test_and_insert(&mut self, identity: FileIdentity) -> Result<bool> {
        if self.buckets.is_empty() {
            self.resize(self.initial_buckets)?;
        }

        let index = Self::bucket_index(&identity, self.buckets.len());
        let chain = &mut self.buckets[index];
        if chain.contains(&identity) {
            return Ok(true);
        }
        chain.try_reserve(1)?;
        chain.push(identity);

        self.len += 1;
        if self.len > MAX_LOAD * self.buckets.len() {
            let grown = self.buckets.len().saturating_mul(GROWTH_FACTOR);
            self.resize(grown)?;
        }
        Ok(false)
    }

    fn bucket_index(identity: &FileIdentity, buckets: usize) -> usize {
        identity.fnv_hash() as usize % buckets
    }

    fn resize(&mut self, buckets: usize) -> Result<()> {
        log::debug!(
            "Resizing identity table from {} to {} buckets ({} identities)",
            self.buckets.len(),
            buckets,
            self.len
        );
        let mut table: Vec<Vec<FileIdentity>> = Vec::new();
        table.try_reserve_exact(buckets)?;
        table.resize_with(buckets, Vec::new);

        // The old table stays intact until the new one is complete.
        for identity in self.buckets.iter().flatten() {
            let slot = &mut table[Self::bucket_index(identity, buckets)];
            slot.try_reserve(1)?;
            slot.push(*identity);
        }
        self.buckets = table;
        Ok(())
    }
}

impl Default for HashedIdentities {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-level ordered set: device id, then inode number.
///
/// Both levels are B-trees, which stay balanced under any insertion order.
#[derive(Debug, Default)]
pub struct OrderedIdentities {
    devices: BTreeMap<u64, BTreeSet<u64>>,
    len: usize,
}

impl OrderedIdentities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn test_and_insert(&mut self, identity: FileIdentity) -> bool {
        let inodes = self.devices.entry(identity.device).or_default();
        if inodes.insert(identity.inode) {
            self.len += 1;
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_absent_then_present() {
        let mut set = HashedIdentities::new();
        assert!(!set.test_and_insert(FileIdentity::new(5, 2)).unwrap());
        assert!(!set.test_and_insert(FileIdentity::new(2, 9)).unwrap());
        assert!(set.test_and_insert(FileIdentity::new(5, 2)).unwrap());
        assert!(set.test_and_insert(FileIdentity::new(2, 9)).unwrap());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn same_inode_on_other_device_is_distinct() {
        let mut set = IdentitySet::default();
        assert!(!set.test_and_insert(FileIdentity::new(1, 100)).unwrap());
        assert!(!set.test_and_insert(FileIdentity::new(2, 100)).unwrap());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn hash_is_deterministic_and_mixes_both_fields() {
        let a = FileIdentity::new(532, 432);
        assert_eq!(a.fnv_hash(), FileIdentity::new(532, 432).fnv_hash());
        assert_ne!(a.fnv_hash(), FileIdentity::new(432, 532).fnv_hash());
    }

    #[test]
    fn table_is_allocated_lazily() {
        let mut set = HashedIdentities::with_buckets(16);
        assert_eq!(set.bucket_count(), 0);
        set.test_and_insert(FileIdentity::new(0, 1)).unwrap();
        assert_eq!(set.bucket_count(), 16);
    }

    #[test]
    fn growth_keeps_every_member() {
        let mut set = HashedIdentities::new();
        for inode in 0..10_000u64 {
            assert!(!set.test_and_insert(FileIdentity::new(7, inode)).unwrap());
        }
        // 10,000 > 2 * 4096, so the table has grown once.
        assert_eq!(set.bucket_count(), DEFAULT_BUCKETS * GROWTH_FACTOR);
        for inode in 0..10_000u64 {
            assert!(set.test_and_insert(FileIdentity::new(7, inode)).unwrap());
        }
        assert_eq!(set.len(), 10_000);
    }

    #[test]
    fn small_table_grows_repeatedly() {
        let mut set = HashedIdentities::with_buckets(1);
        for inode in 0..100u64 {
            set.test_and_insert(FileIdentity::new(inode % 3, inode)).unwrap();
        }
        assert_eq!(set.len(), 100);
        assert!(set.bucket_count() >= 64);
    }

    #[test]
    fn failed_resize_keeps_existing_members() {
        let mut set = HashedIdentities::with_buckets(8);
        for inode in 0..10u64 {
            set.test_and_insert(FileIdentity::new(1, inode)).unwrap();
        }
        let err = set.resize(usize::MAX).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(set.bucket_count(), 8);
        assert_eq!(set.len(), 10);
        for inode in 0..10u64 {
            assert!(set.test_and_insert(FileIdentity::new(1, inode)).unwrap());
        }
    }

    #[test]
    fn ordered_backing_has_the_same_contract() {
        let mut set = IdentitySet::new(IdentityBackend::Tree, DEFAULT_BUCKETS);
        for inode in (0..10_000u64).rev() {
            assert!(!set.test_and_insert(FileIdentity::new(inode % 4, inode)).unwrap());
        }
        for inode in 0..10_000u64 {
            assert!(set.test_and_insert(FileIdentity::new(inode % 4, inode)).unwrap());
        }
        assert_eq!(set.len(), 10_000);
    }
}
