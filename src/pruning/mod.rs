//! Reachability-driven pruning of a module.
//!
//! [`Pruner`] performs one pass over a module under a fixed [`crate::reachability::Policy`]:
//!
//! 1. unreachable types are removed (the global type is emptied instead)
//! 2. for every kept type the base type is checked, then attributes, generic
//!    parameters, interface implementations, methods, fields, properties and
//!    events are pruned in that order
//! 3. value types that lost instance fields get a padding field ([`padding`])
//! 4. classes left without an instance constructor get a private one ([`ctor`])
//! 5. nested types are walked, then assembly and module attributes are pruned
//!
//! Every kept method body is replaced through [`crate::body::BodySynthesizer`].
//! The pass reports what it did in [`PruneStats`].

pub mod ctor;
mod engine;
pub mod padding;
mod stats;

pub use engine::{PruneOutcome, Pruner};
pub use stats::PruneStats;
