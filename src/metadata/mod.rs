//! In-memory entity graph of a managed module.
//!
//! The graph is an arena: every type, method, field, property and event lives in a
//! per-kind vector inside [`module::Module`] and is addressed by a stable id
//! ([`ids::TypeId`], [`ids::MethodId`], ...). Owners keep ordered id lists, and
//! back-references such as a member's declaring type are plain id lookups.
//!
//! Removing an entity detaches it from its owner list and tombstones the arena
//! slot. Ids of other entities never shift, so references held elsewhere in the
//! graph (signatures, overrides, attribute constructors) stay valid lookups and
//! can be tested for liveness. [`module::Module::compact`] drops the tombstones
//! and renumbers what is left before a module is written.
//!
//! # Key Components
//!
//! - [`module::Module`] - The arena root, assembly identity and module flags
//! - [`types::TypeDef`] - Type definitions with their member id lists
//! - [`method::MethodDef`] - Methods, parameters, overrides and bodies
//! - [`members::FieldDef`], [`members::PropertyDef`], [`members::EventDef`] - Other members
//! - [`signatures::TypeSig`] - Type references used by every signature
//! - [`customattributes::CustomAttribute`] - Attribute instances and their arguments
//! - [`builder`] - Fluent builders used by codecs, the injector and tests
//! - [`refs`] - Walks over the ids an entity refers to, used by compaction

pub mod builder;
pub mod customattributes;
pub mod generics;
pub mod ids;
pub mod members;
pub mod method;
pub mod module;
pub mod refs;
pub mod signatures;
pub mod types;
