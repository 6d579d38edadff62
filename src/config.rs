//! Configuration for reference assembly generation.
//!
//! [`GeneratorConfig`] collects every switch the command line exposes. The
//! generator derives the per-attempt [`Policy`], the [`BodyOptions`] for body
//! synthesis and the codec's [`WriteOptions`] from it.

use strum::Display;

use crate::{
    body::BodyOptions,
    codec::WriteOptions,
    reachability::{KeepInternal, Policy},
};

/// What to do with a structural violation once the policy cannot be escalated further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ViolationPolicy {
    /// Log the violation, record it in the statistics and keep going.
    #[default]
    Warn,
    /// Fail the module with [`crate::Error::StructuralInvariantViolation`].
    Abort,
}

/// Configuration for the reference assembly generator.
///
/// The defaults produce what compilers emit for reference assemblies: public and
/// protected surface only (internals kept when friend assemblies are declared),
/// every body `ldnull; throw`, resources stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Keep private and internal members too.
    pub keep_non_public: bool,

    /// Treatment of internal members (default: [`KeepInternal::AutoPending`]).
    pub keep_internal: KeepInternal,

    /// Mark the output with `ReferenceAssemblyAttribute`.
    pub inject_reference_assembly_attribute: bool,

    /// Emit bodies that can run: `ret`, base constructor calls and finalizer chaining
    /// wherever the method shape permits.
    pub use_runtime_mode: bool,

    /// Emit a bare `ret` for every body.
    pub use_ret: bool,

    /// Keep embedded resources.
    pub keep_resources: bool,

    /// Keep the strong-name signature slot for later delay signing.
    pub delay_sign: bool,

    /// Handling of violations that survive every escalation.
    pub violation_policy: ViolationPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            keep_non_public: false,
            keep_internal: KeepInternal::AutoPending,
            inject_reference_assembly_attribute: false,
            use_runtime_mode: false,
            use_ret: false,
            keep_resources: false,
            delay_sign: false,
            violation_policy: ViolationPolicy::Warn,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for assemblies that are loaded at runtime, for
    /// example by test hosts that only need the surface to exist.
    ///
    /// Bodies return normally where possible and the output is marked as a
    /// reference assembly.
    #[must_use]
    pub fn runtime() -> Self {
        Self {
            use_runtime_mode: true,
            inject_reference_assembly_attribute: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that fails on unresolved violations.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            violation_policy: ViolationPolicy::Abort,
            ..Self::default()
        }
    }

    /// Keeps or drops non-public members.
    #[must_use]
    pub fn with_keep_non_public(mut self, keep: bool) -> Self {
        self.keep_non_public = keep;
        self
    }

    /// Sets the treatment of internal members.
    #[must_use]
    pub fn with_keep_internal(mut self, keep_internal: KeepInternal) -> Self {
        self.keep_internal = keep_internal;
        self
    }

    /// Enables or disables `ReferenceAssemblyAttribute` injection.
    #[must_use]
    pub fn with_reference_assembly_attribute(mut self, inject: bool) -> Self {
        self.inject_reference_assembly_attribute = inject;
        self
    }

    /// Enables or disables runtime-compatible bodies.
    #[must_use]
    pub fn with_runtime_mode(mut self, enable: bool) -> Self {
        self.use_runtime_mode = enable;
        self
    }

    /// Enables or disables bare `ret` bodies.
    #[must_use]
    pub fn with_use_ret(mut self, enable: bool) -> Self {
        self.use_ret = enable;
        self
    }

    /// Keeps or strips embedded resources.
    #[must_use]
    pub fn with_keep_resources(mut self, keep: bool) -> Self {
        self.keep_resources = keep;
        self
    }

    /// Enables or disables delay signing.
    #[must_use]
    pub fn with_delay_sign(mut self, enable: bool) -> Self {
        self.delay_sign = enable;
        self
    }

    /// Sets the handling of unresolved violations.
    #[must_use]
    pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.violation_policy = policy;
        self
    }

    /// The policy the first attempt starts from.
    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy::new(self.keep_non_public, self.keep_internal)
    }

    /// Options for body synthesis.
    #[must_use]
    pub fn body_options(&self) -> BodyOptions {
        BodyOptions {
            use_ret: self.use_ret,
            runtime_mode: self.use_runtime_mode,
        }
    }

    /// Options passed to the codec when writing the result.
    #[must_use]
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            share_method_bodies: true,
            add_determinism_section: true,
            delay_sign: self.delay_sign,
        }
    }
}
