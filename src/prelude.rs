//! # refasm Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the refasm library.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all refasm operations
pub use crate::Error;

/// The result type used throughout refasm
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Generator, its configuration and its results
pub use crate::{
    config::{GeneratorConfig, ViolationPolicy},
    generator::{Generated, ReferenceAssemblyGenerator},
};

/// Codec contract and the module image codec
pub use crate::codec::{DiagnosticSink, ImageCodec, LogSink, MetadataCodec, Severity, WriteOptions};

// ================================================================================================
// Entity Graph
// ================================================================================================

/// Arena root and ids
pub use crate::metadata::{
    ids::{EventId, FieldId, MethodId, PropertyId, TypeId},
    module::{AssemblyDef, Module, ModuleFlags},
};

/// Builders
pub use crate::metadata::builder::{
    EventBuilder, FieldBuilder, MethodBuilder, PropertyBuilder, TypeBuilder,
};

/// Signatures and method references
pub use crate::metadata::signatures::{MemberRef, MethodRef, MethodSig, TypeSig};

/// Visibility
pub use crate::metadata::{members::MemberAccess, types::TypeVisibility};

// ================================================================================================
// Pruning
// ================================================================================================

/// Policy and statistics
pub use crate::{
    pruning::{PruneOutcome, PruneStats, Pruner},
    reachability::{KeepInternal, Policy},
};
