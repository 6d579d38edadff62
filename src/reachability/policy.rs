//! Visibility retention policy and its escalation state machine.

use std::fmt;

use strum::{Display, EnumIter};

/// How internal (assembly-visible) members are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum KeepInternal {
    /// Internal members are removed
    Drop,
    /// Internal members are kept
    Keep,
    /// Decide per assembly: keep internals only when friend assemblies are declared
    AutoPending,
    /// Internals kept after a drop attempt broke a public signature
    AutoEscalated,
}

impl KeepInternal {
    /// Maps the command-line level: 0 drop, 1 keep, 2 auto.
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(KeepInternal::Drop),
            1 => Some(KeepInternal::Keep),
            2 => Some(KeepInternal::AutoPending),
            _ => None,
        }
    }

    /// True for every level except [`KeepInternal::Drop`].
    #[must_use]
    pub fn keeps_internal(self) -> bool {
        self != KeepInternal::Drop
    }
}

/// Immutable retention policy threaded through one pruning attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Policy {
    /// Keep every member regardless of visibility
    pub keep_non_public: bool,
    /// Treatment of internal members
    pub keep_internal: KeepInternal,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            keep_non_public: false,
            keep_internal: KeepInternal::AutoPending,
        }
    }
}

impl Policy {
    /// Creates a policy.
    #[must_use]
    pub fn new(keep_non_public: bool, keep_internal: KeepInternal) -> Self {
        Policy {
            keep_non_public,
            keep_internal,
        }
    }

    /// True if internal members survive under this policy.
    #[must_use]
    pub fn keeps_internal(&self) -> bool {
        self.keep_internal.keeps_internal()
    }

    /// True while the compiler-generated pruning rule applies.
    #[must_use]
    pub fn is_auto_pending(&self) -> bool {
        self.keep_internal == KeepInternal::AutoPending
    }

    /// Resolves an `AutoPending` policy for one attempt.
    ///
    /// Without friend assemblies nothing outside the assembly can see its
    /// internals, so they are dropped.
    #[must_use]
    pub fn resolve(self, has_internals_visible_to: bool) -> Self {
        if self.is_auto_pending() && !has_internals_visible_to {
            Policy {
                keep_internal: KeepInternal::Drop,
                ..self
            }
        } else {
            self
        }
    }

    /// The policy for the next attempt after a structural violation, or `None`
    /// when nothing is left to escalate to.
    #[must_use]
    pub fn escalate(self) -> Option<Self> {
        if self.keep_non_public {
            return None;
        }
        let next = match self.keep_internal {
            KeepInternal::AutoPending | KeepInternal::AutoEscalated => KeepInternal::Keep,
            KeepInternal::Drop => KeepInternal::AutoEscalated,
            KeepInternal::Keep => return None,
        };
        Some(Policy {
            keep_internal: next,
            ..self
        })
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keep_non_public {
            write!(f, "keep non-public")
        } else {
            write!(f, "keep internal: {}", self.keep_internal)
        }
    }
}
