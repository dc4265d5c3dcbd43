//! Existence guards for single-object operations
//!
//! A [`Condition`] holds four independent flags. How they apply:
//!
//! | operation | record present | record absent |
//! |-----------|----------------|---------------|
//! | get | decode | `ignore_if_absent` → no-op, else `NotFound` |
//! | put | `ignore_if_exists` → no-op, `fail_if_exists` → `AlreadyExists` | `fail_if_absent` → `NotFound` |
//! | delete | remove | `fail_if_absent` → `NotFound`, else no-op |
//!
//! For put, a missing bucket with `fail_if_absent` fails before the bucket
//! is created.

/// Existence guards for get, put and delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Condition {
    ignore_if_exists: bool,
    fail_if_exists: bool,
    ignore_if_absent: bool,
    fail_if_absent: bool,
}

impl Condition {
    /// No guards set
    pub const fn new() -> Self {
        Self {
            ignore_if_exists: false,
            fail_if_exists: false,
            ignore_if_absent: false,
            fail_if_absent: false,
        }
    }

    /// Put becomes a no-op when the key already holds a record
    pub const fn ignore_if_exists(mut self) -> Self {
        self.ignore_if_exists = true;
        self
    }

    /// Put fails with `AlreadyExists` when the key already holds a record
    pub const fn fail_if_exists(mut self) -> Self {
        self.fail_if_exists = true;
        self
    }

    /// Get becomes a no-op when the record is missing
    pub const fn ignore_if_absent(mut self) -> Self {
        self.ignore_if_absent = true;
        self
    }

    /// Put and delete fail with `NotFound` when the record is missing
    pub const fn fail_if_absent(mut self) -> Self {
        self.fail_if_absent = true;
        self
    }

    /// Whether `ignore_if_exists` is set
    pub const fn ignores_existing(&self) -> bool {
        self.ignore_if_exists
    }

    /// Whether `fail_if_exists` is set
    pub const fn fails_existing(&self) -> bool {
        self.fail_if_exists
    }

    /// Whether `ignore_if_absent` is set
    pub const fn ignores_absent(&self) -> bool {
        self.ignore_if_absent
    }

    /// Whether `fail_if_absent` is set
    pub const fn fails_absent(&self) -> bool {
        self.fail_if_absent
    }

    /// Whether a put has to look at the current record before writing
    pub const fn probes_existence(&self) -> bool {
        self.ignore_if_exists || self.fail_if_exists || self.fail_if_absent
    }
}

/// Extension over `Option<&Condition>` so call sites can treat a missing
/// condition as the empty one
pub trait ConditionExt {
    /// The condition, or the empty one
    fn or_empty(self) -> Condition;
}

impl ConditionExt for Option<&Condition> {
    fn or_empty(self) -> Condition {
        self.copied().unwrap_or_default()
    }
}
