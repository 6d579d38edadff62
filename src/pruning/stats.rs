//! Statistics tracking for pruning passes.
//!
//! Provides [`PruneStats`] to track what one attempt removed, rewrote and
//! synthesized, useful for reporting and for checking that a pass over its own
//! output is a no-op.

use std::fmt;

/// Statistics from a pruning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Number of types removed.
    pub types_removed: usize,
    /// Number of types emptied in place (the global type).
    pub types_emptied: usize,
    /// Number of methods removed.
    pub methods_removed: usize,
    /// Number of fields removed.
    pub fields_removed: usize,
    /// Number of properties removed.
    pub properties_removed: usize,
    /// Number of events removed.
    pub events_removed: usize,
    /// Number of custom attributes removed.
    pub attributes_removed: usize,
    /// Number of interface implementations removed.
    pub interfaceimpls_removed: usize,
    /// Number of explicit method implementation records removed.
    pub overrides_removed: usize,
    /// Number of generic parameter constraints removed.
    pub constraints_removed: usize,
    /// Number of property and event accessor references cleared.
    pub accessors_cleared: usize,
    /// Number of method bodies whose contents changed.
    pub bodies_rewritten: usize,
    /// Number of methods left untouched because they have no managed body.
    pub bodies_skipped: usize,
    /// Number of padding fields inserted into value types.
    pub padding_fields_added: usize,
    /// Number of default constructors injected.
    pub constructors_injected: usize,
    /// Structural violations that could not be resolved by escalation.
    pub violations: Vec<String>,
}

impl PruneStats {
    /// Creates a new empty stats instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of entities and records removed.
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.types_removed
            + self.methods_removed
            + self.fields_removed
            + self.properties_removed
            + self.events_removed
            + self.attributes_removed
            + self.interfaceimpls_removed
            + self.overrides_removed
            + self.constraints_removed
    }

    /// Returns the number of entities synthesized.
    #[must_use]
    pub fn total_added(&self) -> usize {
        self.padding_fields_added + self.constructors_injected
    }

    /// Returns true if the pass changed the module in any way.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.total_removed() > 0
            || self.types_emptied > 0
            || self.accessors_cleared > 0
            || self.bodies_rewritten > 0
            || self.total_added() > 0
    }

    /// Merges stats from another pass into this one.
    pub fn merge(&mut self, other: &PruneStats) {
        self.types_removed += other.types_removed;
        self.types_emptied += other.types_emptied;
        self.methods_removed += other.methods_removed;
        self.fields_removed += other.fields_removed;
        self.properties_removed += other.properties_removed;
        self.events_removed += other.events_removed;
        self.attributes_removed += other.attributes_removed;
        self.interfaceimpls_removed += other.interfaceimpls_removed;
        self.overrides_removed += other.overrides_removed;
        self.constraints_removed += other.constraints_removed;
        self.accessors_cleared += other.accessors_cleared;
        self.bodies_rewritten += other.bodies_rewritten;
        self.bodies_skipped += other.bodies_skipped;
        self.padding_fields_added += other.padding_fields_added;
        self.constructors_injected += other.constructors_injected;
        self.violations.extend(other.violations.iter().cloned());
    }
}

impl fmt::Display for PruneStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() && self.violations.is_empty() {
            return write!(f, "No changes");
        }

        let mut parts = Vec::new();

        if self.types_removed > 0 {
            parts.push(format!("{} types", self.types_removed));
        }
        if self.methods_removed > 0 {
            parts.push(format!("{} methods", self.methods_removed));
        }
        if self.fields_removed > 0 {
            parts.push(format!("{} fields", self.fields_removed));
        }
        let members = self.properties_removed + self.events_removed;
        if members > 0 {
            parts.push(format!("{members} properties/events"));
        }
        if self.attributes_removed > 0 {
            parts.push(format!("{} attributes", self.attributes_removed));
        }
        let records = self.interfaceimpls_removed + self.overrides_removed + self.constraints_removed;
        if records > 0 {
            parts.push(format!("{records} interface/override/constraint records"));
        }

        let mut summary = if parts.is_empty() {
            "Removed: nothing".to_string()
        } else {
            format!("Removed: {}", parts.join(", "))
        };
        if self.bodies_rewritten > 0 {
            summary.push_str(&format!("; {} bodies rewritten", self.bodies_rewritten));
        }
        if self.total_added() > 0 {
            summary.push_str(&format!(
                "; added {} padding fields, {} constructors",
                self.padding_fields_added, self.constructors_injected
            ));
        }
        if !self.violations.is_empty() {
            summary.push_str(&format!("; {} unresolved violations", self.violations.len()));
        }
        write!(f, "{summary}")
    }
}
