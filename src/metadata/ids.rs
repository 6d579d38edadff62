//! Stable arena identifiers.
//!
//! Ids are plain indices into the per-kind vectors of a [`crate::metadata::module::Module`].
//! They are only minted by the module itself, so an id obtained from one module
//! must never be used with another.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from a raw arena index.
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Returns the arena index of this id.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

arena_id!(
    /// Identifies a [`crate::metadata::types::TypeDef`].
    TypeId,
    "type"
);
arena_id!(
    /// Identifies a [`crate::metadata::method::MethodDef`].
    MethodId,
    "method"
);
arena_id!(
    /// Identifies a [`crate::metadata::members::FieldDef`].
    FieldId,
    "field"
);
arena_id!(
    /// Identifies a [`crate::metadata::members::PropertyDef`].
    PropertyId,
    "property"
);
arena_id!(
    /// Identifies a [`crate::metadata::members::EventDef`].
    EventId,
    "event"
);
