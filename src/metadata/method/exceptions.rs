//! Exception handler regions of method bodies.
//!
//! Regions are expressed as instruction indices rather than byte offsets, so they
//! remain valid while a body is rebuilt. Byte offsets are derived on demand from
//! the instruction list once [`crate::metadata::method::MethodBody::update_offsets`]
//! has run.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::metadata::signatures::TypeSig;

bitflags! {
    /// Exception handler flags defining the type of exception handling clause.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ExceptionHandlerFlags: u16 {
        /// A typed exception clause.
        const EXCEPTION = 0x0000;
        /// An exception filter and handler clause.
        const FILTER = 0x0001;
        /// A finally clause.
        const FINALLY = 0x0002;
        /// A fault clause (finally that executes only on exception).
        const FAULT = 0x0004;
    }
}

/// Exception handler defining a protected region and its handler.
///
/// ```text
/// try {
///     // instructions[try_start..try_end]
/// }
/// finally {
///     // instructions[handler_start..handler_end]
/// }
/// ```
///
/// A `handler_end` of `None` means the handler runs to the end of the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionHandler {
    /// Kind of clause
    pub flags: ExceptionHandlerFlags,
    /// First protected instruction
    pub try_start: usize,
    /// One past the last protected instruction
    pub try_end: usize,
    /// First handler instruction
    pub handler_start: usize,
    /// One past the last handler instruction
    pub handler_end: Option<usize>,
    /// Caught exception type for typed clauses
    pub catch_type: Option<TypeSig>,
    /// First filter instruction for filter clauses
    pub filter_start: Option<usize>,
}

impl ExceptionHandler {
    /// Creates a `finally` clause.
    #[must_use]
    pub fn finally(try_start: usize, try_end: usize, handler_start: usize, handler_end: Option<usize>) -> Self {
        ExceptionHandler {
            flags: ExceptionHandlerFlags::FINALLY,
            try_start,
            try_end,
            handler_start,
            handler_end,
            catch_type: None,
            filter_start: None,
        }
    }
}
