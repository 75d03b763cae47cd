//! Batcher module for the postal indexer ingest.
//!
//! Groups parsed entries into fixed-capacity batches in arrival order.

use std::mem;

use crate::errors::IngestError;
use postal_indexer_shared::PostalCodeEntry;

/// Upper bound on the buffer preallocated for an open batch.
const MAX_PREALLOCATED: usize = 4096;

/// A sealed, non-empty group of entries handed to the writer as one unit.
///
/// Batches are numbered from zero in the order they are sealed. A batch
/// has no mutating API; the writer consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    sequence: u64,
    entries: Vec<PostalCodeEntry>,
}

impl Batch {
    /// Seal a list of entries into a batch.
    ///
    /// Fails with `InvalidInput` if `entries` is empty.
    pub fn from_entries(sequence: u64, entries: Vec<PostalCodeEntry>) -> Result<Self, IngestError> {
        if entries.is_empty() {
            return Err(IngestError::invalid_input("A batch needs at least one entry"));
        }
        Ok(Self { sequence, entries })
    }

    /// Position of this batch in dispatch order.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of entries in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a sealed batch.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in arrival order.
    pub fn entries(&self) -> &[PostalCodeEntry] {
        &self.entries
    }

    /// Take the entries out of the batch.
    pub fn into_entries(self) -> Vec<PostalCodeEntry> {
        self.entries
    }
}

/// Accumulates entries and seals a batch each time capacity is reached.
#[derive(Debug)]
pub struct Batcher {
    capacity: usize,
    open: Vec<PostalCodeEntry>,
    next_sequence: u64,
}

impl Batcher {
    /// Create a batcher sealing batches of `capacity` entries.
    ///
    /// Fails with `ConfigurationError` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, IngestError> {
        if capacity == 0 {
            return Err(IngestError::configuration(
                "batch capacity must be a positive integer",
            ));
        }

        Ok(Self {
            capacity,
            open: Self::open_buffer(capacity),
            next_sequence: 0,
        })
    }

    /// Configured batch capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries in the open batch.
    pub fn pending(&self) -> usize {
        self.open.len()
    }

    /// Append an entry to the open batch.
    ///
    /// Returns the sealed batch when this entry fills it; a new empty batch
    /// is opened in its place.
    pub fn offer(&mut self, entry: PostalCodeEntry) -> Option<Batch> {
        self.open.push(entry);

        if self.open.len() >= self.capacity {
            Some(self.seal())
        } else {
            None
        }
    }

    /// Close the batcher, returning the open batch if it has any entries.
    pub fn flush(mut self) -> Option<Batch> {
        if self.open.is_empty() {
            None
        } else {
            Some(self.seal())
        }
    }

    fn seal(&mut self) -> Batch {
        let entries = mem::replace(&mut self.open, Self::open_buffer(self.capacity));
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        Batch { sequence, entries }
    }

    fn open_buffer(capacity: usize) -> Vec<PostalCodeEntry> {
        Vec::with_capacity(capacity.min(MAX_PREALLOCATED))
    }
}
