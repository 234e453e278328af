//! Region template.

use std::time::Duration;

/// Configuration shared by every region a client creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTemplate {
    /// Time-to-idle for region entries.
    /// Entries are evicted if not read, written or touched within this duration.
    pub expiry: Duration,

    /// Number of backup copies kept by the cluster.
    pub backups: u32,

    /// Hand out a private copy of each value on read.
    /// When off, callers share the stored value and must not mutate it in place.
    pub copy_on_read: bool,
}

impl RegionTemplate {
    /// Create a template with the given idle expiry, no backups and no copy on read.
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            backups: 0,
            copy_on_read: false,
        }
    }

    /// Set the idle expiry (builder pattern).
    #[must_use]
    pub fn expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    #[must_use]
    pub fn backups(mut self, backups: u32) -> Self {
        self.backups = backups;
        self
    }

    #[must_use]
    pub fn copy_on_read(mut self, copy_on_read: bool) -> Self {
        self.copy_on_read = copy_on_read;
        self
    }
}
