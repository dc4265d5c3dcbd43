//! Filtered forward scans over one bucket
//!
//! A [`Scanner`] walks a bucket cursor and applies a [`Filter`] in two steps:
//! bounds and the raw chain in [`Scanner::next_candidate`], then the entity
//! chain in [`Scanner::judge`] once the caller has decoded the record.
//!
//! ```text
//! NotStarted -> Seeking -> (Evaluating -> Accepted | Skipped | Stopped)* -> Exhausted
//!                                                            \-> Stopped
//! ```
//!
//! `Exhausted` (cursor ran out or left the bounds) and `Stopped` (a
//! predicate said so) are terminal.

use stowage_core::{goon, Decision, Filter, StorageResult};
use stowage_storage::{Bucket, Cursor};
use tracing::trace;

/// Where a scan is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// No record visited yet
    NotStarted,
    /// Cursor positioned at the seek key
    Seeking,
    /// A candidate passed the raw chain and awaits the entity chain
    Evaluating,
    /// The last candidate was accepted
    Accepted,
    /// The last candidate was skipped
    Skipped,
    /// A predicate stopped the scan
    Stopped,
    /// No more records within bounds
    Exhausted,
}

impl ScanPhase {
    /// Whether no further records will be produced
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanPhase::Stopped | ScanPhase::Exhausted)
    }
}

/// Forward scan over one bucket with an optional filter
pub struct Scanner<'a, T> {
    cursor: Cursor<'a>,
    filter: Option<&'a Filter<T>>,
    phase: ScanPhase,
    visited: u64,
}

impl<'a, T> Scanner<'a, T> {
    /// Scanner over `bucket`, not yet positioned
    pub fn new(bucket: Bucket<'a>, filter: Option<&'a Filter<T>>) -> Self {
        Self {
            cursor: bucket.cursor(),
            filter,
            phase: ScanPhase::NotStarted,
            visited: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Records the cursor has produced so far
    pub fn visited(&self) -> u64 {
        self.visited
    }

    fn finish(&mut self, phase: ScanPhase) {
        self.phase = phase;
        trace!(target: "stowage::scan", ?phase, visited = self.visited, "Scan finished");
    }

    /// Next record inside the bounds that the raw chain accepts
    ///
    /// Returns `None` once the scan is terminal. Without entity predicates
    /// the candidate is already accepted; otherwise pass the decoded value
    /// to [`Scanner::judge`]. A storage error leaves the phase untouched.
    pub fn next_candidate(&mut self) -> StorageResult<Option<(Vec<u8>, Vec<u8>)>> {
        if self.phase.is_terminal() {
            return Ok(None);
        }

        loop {
            let record = if self.phase == ScanPhase::NotStarted {
                let record = match self.filter {
                    Some(filter) => self.cursor.seek(filter.seek())?,
                    None => self.cursor.first()?,
                };
                self.phase = ScanPhase::Seeking;
                record
            } else {
                self.cursor.next().transpose()?
            };

            let Some((key, value)) = record else {
                self.finish(ScanPhase::Exhausted);
                return Ok(None);
            };
            self.visited += 1;

            if !goon(self.filter, &key) {
                self.finish(ScanPhase::Exhausted);
                return Ok(None);
            }

            let Some(filter) = self.filter else {
                self.phase = ScanPhase::Accepted;
                return Ok(Some((key, value)));
            };

            match filter.evaluate_raw(&key, &value) {
                Decision::Skip => self.phase = ScanPhase::Skipped,
                Decision::Stop => {
                    self.finish(ScanPhase::Stopped);
                    return Ok(None);
                }
                Decision::Accept => {
                    self.phase = if filter.has_entity_predicates() {
                        ScanPhase::Evaluating
                    } else {
                        ScanPhase::Accepted
                    };
                    return Ok(Some((key, value)));
                }
            }
        }
    }

    /// Run the entity chain on the decoded current candidate
    pub fn judge(&mut self, entity: &T) -> Decision {
        let decision = self
            .filter
            .map(|filter| filter.evaluate_entity(entity))
            .unwrap_or_default();
        match decision {
            Decision::Accept => self.phase = ScanPhase::Accepted,
            Decision::Skip => self.phase = ScanPhase::Skipped,
            Decision::Stop => self.finish(ScanPhase::Stopped),
        }
        decision
    }

    /// Whether candidates need decoding before they can be accepted
    pub fn needs_decode(&self) -> bool {
        self.filter.is_some_and(Filter::has_entity_predicates)
    }
}
