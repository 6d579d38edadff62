//! Method body synthesis.
//!
//! Every method that survives pruning gets its body replaced by
//! [`BodySynthesizer`]. The implementation is reset to managed IL and native
//! interop bindings are dropped.

mod synthesizer;

pub use synthesizer::{ret_body, throw_body, BodyOptions, BodySynthesizer, Synthesis};
