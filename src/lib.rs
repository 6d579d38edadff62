// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # refasm
//!
//! Generates reference assemblies from compiled .NET modules. The public and
//! protected surface of a module is preserved; method bodies are replaced with
//! minimal stand-ins and implementation details are removed. The result can be
//! compiled against but not executed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use refasm::prelude::*;
//!
//! let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
//! let generated = generator.generate(&std::fs::read("Lib.refimg")?)?;
//! println!("{}", generated.stats);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The module arena: types, members, signatures, attributes, bodies
//! - [`reachability`] - Which entities belong to the surface under a [`reachability::Policy`]
//! - [`pruning`] - One pruning pass: removal, padding fields, constructor injection
//! - [`body`] - Replacement method bodies
//! - [`inject`] - The `ReferenceAssemblyAttribute` marker
//! - [`generator`] - Attempts, policy escalation and module preparation
//! - [`codec`] - Loading and writing modules
//!
//! ## How a module is processed
//!
//! Every attempt loads the original bytes, so a failed attempt never leaks
//! mutations into the next one:
//!
//! 1. load through the [`codec::MetadataCodec`] and prepare the module (IL-only,
//!    strong name, resources)
//! 2. resolve the policy: `auto` keeps internals only when `InternalsVisibleTo` is present
//! 3. prune; a kept signature naming a removed type escalates the policy and restarts
//! 4. optionally inject `ReferenceAssemblyAttribute`, then write through the codec
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust,no_run
//! use refasm::{Error, GeneratorConfig, ImageCodec, ReferenceAssemblyGenerator};
//!
//! let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::strict());
//! match generator.generate(&std::fs::read("Lib.refimg")?) {
//!     Ok(generated) => println!("{} attempt(s)", generated.attempts),
//!     Err(Error::NotAManagedModule(reason)) => println!("skipped: {reason}"),
//!     Err(Error::StructuralInvariantViolation(what)) => println!("broken surface: {what}"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use refasm::prelude::*;
///
/// let mut module = Module::new("Lib.dll");
/// TypeBuilder::class("N", "Foo").build(&mut module);
/// let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
/// let generated = generator.generate(&ImageCodec::new().to_image(&module)?)?;
/// assert_eq!(generated.attempts, 1);
/// # Ok::<(), refasm::Error>(())
/// ```
pub mod prelude;

/// Method body synthesis.
pub mod body;

/// Codec contract and the JSON module image codec.
pub mod codec;

/// Generator configuration.
pub mod config;

/// Retrying generator and module preparation.
pub mod generator;

/// Reference assembly marker injection.
pub mod inject;

/// In-memory entity graph of a managed module.
///
/// # Key Components
///
/// - [`metadata::module::Module`] - The arena root
/// - [`metadata::builder`] - Fluent builders for types and members
/// - [`metadata::signatures::TypeSig`] - Type references
pub mod metadata;

/// Pruning passes.
pub mod pruning;

/// Reachability classification.
pub mod reachability;

/// `refasm` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `refasm` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// Main entry point for generating reference assemblies.
pub use generator::ReferenceAssemblyGenerator;

/// Generator settings.
pub use config::{GeneratorConfig, ViolationPolicy};

/// The JSON module image codec.
pub use codec::ImageCodec;
