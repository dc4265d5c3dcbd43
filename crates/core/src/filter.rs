//! Scan filters
//!
//! A [`Filter`] bounds a forward scan over one bucket and carries two
//! ordered predicate chains:
//!
//! 1. raw predicates see `(key, value)` before anything is decoded;
//! 2. entity predicates see the decoded entity.
//!
//! Cheap checks go in the first chain so rejected records never pay for
//! deserialization. Each predicate returns a [`Decision`]; the first
//! non-`Accept` answer wins.
//!
//! Bounds are computed when the filter is built and never change while a
//! scan runs.
//!
//! # Example
//!
//! ```ignore
//! let filter = Filter::<Person>::new()
//!     .prefix(b"user:")
//!     .when_raw(|_key, value| if value.is_empty() { Decision::Skip } else { Decision::Accept })
//!     .when(|p| if p.age >= 65 { Decision::Stop } else { Decision::Accept });
//! ```

use std::fmt;

/// Outcome of a scan predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Decision {
    /// Keep evaluating; accept the record if every predicate agrees
    #[default]
    Accept,
    /// Drop this record, continue with the next key
    Skip,
    /// Drop this record and end the scan
    Stop,
}

impl Decision {
    /// Convert `(skip, stop)` flags; `stop` wins when both are set
    pub fn from_flags(skip: bool, stop: bool) -> Self {
        if stop {
            Decision::Stop
        } else if skip {
            Decision::Skip
        } else {
            Decision::Accept
        }
    }

    /// `Decision::Skip` unless `keep`
    pub fn keep_if(keep: bool) -> Self {
        if keep {
            Decision::Accept
        } else {
            Decision::Skip
        }
    }

    /// `Decision::Stop` when `stop`, else accept
    pub fn stop_if(stop: bool) -> Self {
        if stop {
            Decision::Stop
        } else {
            Decision::Accept
        }
    }

    /// Whether the record survives this decision
    pub fn is_accept(self) -> bool {
        self == Decision::Accept
    }
}

/// Predicate over the raw key and value of a record
pub type RawPredicate = Box<dyn Fn(&[u8], &[u8]) -> Decision + Send + Sync>;

/// Predicate over a decoded entity
pub type EntityPredicate<T> = Box<dyn Fn(&T) -> Decision + Send + Sync>;

/// Scan bounds plus raw and entity predicate chains
pub struct Filter<T> {
    min: Vec<u8>,
    max: Option<Vec<u8>>,
    prefix: Option<Vec<u8>>,
    raw: Vec<RawPredicate>,
    entity: Vec<EntityPredicate<T>>,
}

impl<T> Filter<T> {
    /// Empty filter: whole bucket, no predicates
    pub fn new() -> Self {
        Self {
            min: Vec::new(),
            max: None,
            prefix: None,
            raw: Vec::new(),
            entity: Vec::new(),
        }
    }

    /// Scan keys in `[min, max]`
    ///
    /// An empty `max` leaves the scan open-ended.
    pub fn range(mut self, min: impl Into<Vec<u8>>, max: impl Into<Vec<u8>>) -> Self {
        let max = max.into();
        self.min = min.into();
        self.max = if max.is_empty() { None } else { Some(max) };
        self
    }

    /// Scan exactly the keys starting with `prefix`
    ///
    /// The upper bound comes from [`prefix_upper_bound`]. A prefix made only
    /// of `0xFF` bytes has no finite bound; the prefix test alone ends the
    /// scan.
    pub fn prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        let prefix = prefix.into();
        self.max = prefix_upper_bound(&prefix);
        self.min = prefix.clone();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Append a raw predicate, evaluated before decoding
    pub fn when_raw<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[u8], &[u8]) -> Decision + Send + Sync + 'static,
    {
        self.raw.push(Box::new(predicate));
        self
    }

    /// Append an entity predicate, evaluated after decoding
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> Decision + Send + Sync + 'static,
    {
        self.entity.push(Box::new(predicate));
        self
    }

    /// Lower bound (empty = start of bucket)
    pub fn min(&self) -> &[u8] {
        &self.min
    }

    /// Inclusive upper bound, if any
    pub fn max(&self) -> Option<&[u8]> {
        self.max.as_deref()
    }

    /// Required key prefix, if any
    pub fn key_prefix(&self) -> Option<&[u8]> {
        self.prefix.as_deref()
    }

    /// Where the cursor should start
    ///
    /// The prefix when it sorts after the lower bound, else the lower bound.
    /// Only a starting point: [`Filter::goon`] still checks every key.
    pub fn seek(&self) -> &[u8] {
        match &self.prefix {
            Some(prefix) if prefix.as_slice() > self.min.as_slice() => prefix,
            _ => &self.min,
        }
    }

    /// Whether the scan should continue at `key`
    pub fn goon(&self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }
        if let Some(max) = &self.max {
            if key > max.as_slice() {
                return false;
            }
        }
        match &self.prefix {
            Some(prefix) => key.starts_with(prefix),
            None => true,
        }
    }

    /// Whether any entity predicate is registered
    pub fn has_entity_predicates(&self) -> bool {
        !self.entity.is_empty()
    }

    /// Run the raw chain in registration order
    pub fn evaluate_raw(&self, key: &[u8], value: &[u8]) -> Decision {
        self.raw
            .iter()
            .map(|predicate| predicate(key, value))
            .find(|decision| !decision.is_accept())
            .unwrap_or_default()
    }

    /// Run the entity chain in registration order
    pub fn evaluate_entity(&self, entity: &T) -> Decision {
        self.entity
            .iter()
            .map(|predicate| predicate(entity))
            .find(|decision| !decision.is_accept())
            .unwrap_or_default()
    }
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("min", &self.min.escape_ascii().to_string())
            .field(
                "max",
                &self.max.as_ref().map(|m| m.escape_ascii().to_string()),
            )
            .field(
                "prefix",
                &self.prefix.as_ref().map(|p| p.escape_ascii().to_string()),
            )
            .field("raw_predicates", &self.raw.len())
            .field("entity_predicates", &self.entity.len())
            .finish()
    }
}

/// Tightest exclusive-style upper bound for keys starting with `prefix`
///
/// Trailing `0xFF` bytes are dropped and the last remaining byte is
/// incremented, so every key starting with `prefix` sorts at or below the
/// result and every key above it does not start with `prefix`. Returns
/// `None` when no such bound exists (empty or all-`0xFF` prefix).
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut bound = prefix[..=last].to_vec();
    bound[last] += 1;
    Some(bound)
}

/// [`Filter::goon`] for an optional filter
///
/// Without a filter every non-empty key continues the scan.
pub fn goon<T>(filter: Option<&Filter<T>>, key: &[u8]) -> bool {
    match filter {
        Some(filter) => filter.goon(key),
        None => !key.is_empty(),
    }
}
