//! Address resolution identifier issuance.
//!
//! # Responsibilities
//! - Hand out identifiers for concurrent resolution attempts
//! - Track which identifiers are still open
//! - Report whether a close matched an open identifier
//!
//! # Design Decisions
//! - Identifiers are 16 random hex characters, regenerated on collision
//! - Uniqueness is scoped to one request, not global
//! - Closed identifiers are retired and never reissued, so a record key
//!   stays unique for the lifetime of the request

use std::collections::HashSet;

use crate::diagnostics::types::ResolutionId;

/// Open/closed bookkeeping for address resolution identifiers.
#[derive(Debug, Default)]
pub struct AddressResolutionTracker {
    open: HashSet<ResolutionId>,
    retired: HashSet<ResolutionId>,
}

impl AddressResolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh identifier and mark it open.
    pub fn allocate(&mut self) -> ResolutionId {
        self.allocate_with(random_token)
    }

    /// Issue an identifier drawn from `next`, redrawing on collision.
    pub fn allocate_with<F>(&mut self, mut next: F) -> ResolutionId
    where
        F: FnMut() -> ResolutionId,
    {
        loop {
            let candidate = next();
            if candidate.is_empty() || self.is_known(&candidate) {
                tracing::trace!(identifier = %candidate, "Resolution identifier collision, regenerating");
                continue;
            }
            self.open.insert(candidate.clone());
            return candidate;
        }
    }

    /// Close an identifier. Returns false if it was not open.
    pub fn close(&mut self, identifier: &ResolutionId) -> bool {
        if self.open.remove(identifier) {
            self.retired.insert(identifier.clone());
            true
        } else {
            false
        }
    }

    pub fn is_open(&self, identifier: &ResolutionId) -> bool {
        self.open.contains(identifier)
    }

    /// Whether the identifier was opened and has since been closed.
    pub fn is_retired(&self, identifier: &ResolutionId) -> bool {
        self.retired.contains(identifier)
    }

    /// Number of resolutions still in flight.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    fn is_known(&self, identifier: &ResolutionId) -> bool {
        self.open.contains(identifier) || self.retired.contains(identifier)
    }
}

fn random_token() -> ResolutionId {
    ResolutionId::new(format!("{:016x}", fastrand::u64(..)))
}
