//! Reachability classification.
//!
//! Decides, for every kind of entity, whether it belongs to the surface a
//! reference assembly must keep under a given [`Policy`]:
//!
//! - [`Classifier::is_type_reachable`], [`Classifier::is_field_reachable`] and
//!   [`Classifier::is_method_reachable`] apply the visibility tables plus the
//!   compiler-generated, compiler-injected, constructor and entry-point rules
//! - [`Classifier::is_sig_reachable`] walks type signatures
//! - [`Classifier::is_attribute_reachable`] walks attribute constructors and
//!   argument values, nested arrays and `typeof` values included
//!
//! A [`Classifier`] borrows the module immutably, so the pruning engine collects
//! removal sets with it and applies them afterwards.

mod attributes;
mod classifier;
mod policy;

pub use classifier::Classifier;
pub use policy::{KeepInternal, Policy};
