//! Loading and writing modules.
//!
//! The generator never touches bytes itself: a [`MetadataCodec`] turns input bytes
//! into a [`Module`] and the pruned module back into bytes. Informational events
//! from the writer go to a [`DiagnosticSink`] and never change control flow.
//!
//! [`ImageCodec`] is the codec shipped with the crate. It stores the compacted
//! module arena as a versioned JSON document (a "module image", conventionally
//! with the [`IMAGE_EXTENSION`] extension), which is what the test suite and the
//! command line operate on. Removed entities never reach the image. PE files are
//! recognized and rejected as [`Error::NotAManagedModule`]; a PE codec plugs in
//! through the same trait.
//!
//! # Examples
//!
//! ```rust
//! use refasm::codec::{ImageCodec, MetadataCodec, Severity, WriteOptions};
//! use refasm::metadata::module::Module;
//!
//! let codec = ImageCodec::new();
//! let mut messages = Vec::new();
//! let mut sink = |severity: Severity, message: &str| messages.push(format!("{severity}: {message}"));
//!
//! let bytes = codec.write(&Module::new("Lib.dll"), &WriteOptions::default(), &mut sink)?;
//! let module = codec.load(&bytes)?;
//! assert_eq!(module.name, "Lib.dll");
//! assert!(!messages.is_empty());
//! # Ok::<(), refasm::Error>(())
//! ```

use std::collections::HashSet;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use strum::Display;

use crate::{
    metadata::module::{Module, ModuleFlags},
    Error, Result,
};

/// Format tag of a module image
pub const IMAGE_FORMAT: &str = "refasm-module-image";
/// Newest module image version this codec reads and the one it writes
pub const IMAGE_VERSION: u32 = 1;
/// File extension of module images
pub const IMAGE_EXTENSION: &str = "refimg";

/// Severity of a writer diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Severity {
    /// Informational event
    #[strum(serialize = "info")]
    Info,
    /// Something the caller may want to look at
    #[strum(serialize = "warning")]
    Warning,
    /// The writer hit a problem it worked around
    #[strum(serialize = "error")]
    Error,
}

/// Receiver for writer diagnostics.
pub trait DiagnosticSink {
    /// Receives one diagnostic.
    fn report(&mut self, severity: Severity, message: &str);
}

impl<F: FnMut(Severity, &str)> DiagnosticSink for F {
    fn report(&mut self, severity: Severity, message: &str) {
        self(severity, message);
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// Writer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Deduplicate identical method bodies
    pub share_method_bodies: bool,
    /// Emit a content-derived module version id
    pub add_determinism_section: bool,
    /// Leave room for a strong-name signature added later
    pub delay_sign: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            share_method_bodies: true,
            add_determinism_section: true,
            delay_sign: false,
        }
    }
}

/// Turns bytes into a module and back.
pub trait MetadataCodec {
    /// Loads a module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAManagedModule`] when `bytes` do not hold a module, and
    /// [`Error::Malformed`] when they hold an inconsistent one.
    fn load(&self, bytes: &[u8]) -> Result<Module>;

    /// Serializes a module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailure`] when the module cannot be serialized.
    fn write(&self, module: &Module, options: &WriteOptions, sink: &mut dyn DiagnosticSink) -> Result<Vec<u8>>;
}

#[derive(Serialize, Deserialize)]
struct Envelope<M> {
    format: String,
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mvid: Option<String>,
    #[serde(default)]
    delay_signed: bool,
    module: M,
}

/// Codec for JSON module images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    pretty: bool,
}

impl ImageCodec {
    /// Creates a codec writing compact JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec writing indented JSON.
    #[must_use]
    pub fn pretty() -> Self {
        ImageCodec { pretty: true }
    }

    /// Serializes a module with default options, sending diagnostics to the log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteFailure`] when the module cannot be serialized.
    pub fn to_image(&self, module: &Module) -> Result<Vec<u8>> {
        self.write(module, &WriteOptions::default(), &mut LogSink)
    }
}

impl MetadataCodec for ImageCodec {
    fn load(&self, bytes: &[u8]) -> Result<Module> {
        if bytes.starts_with(b"MZ") {
            return Err(Error::NotAManagedModule(
                "PE file; this codec reads module images only".to_string(),
            ));
        }
        let envelope: Envelope<Module> =
            serde_json::from_slice(bytes).map_err(|e| Error::NotAManagedModule(e.to_string()))?;
        if envelope.format != IMAGE_FORMAT {
            return Err(Error::NotAManagedModule(format!(
                "unknown image format '{}'",
                envelope.format
            )));
        }
        if envelope.version == 0 || envelope.version > IMAGE_VERSION {
            return Err(malformed_error!("unsupported image version {}", envelope.version));
        }
        envelope.module.validate()?;
        Ok(envelope.module)
    }

    fn write(&self, module: &Module, options: &WriteOptions, sink: &mut dyn DiagnosticSink) -> Result<Vec<u8>> {
        let compaction = module.compact();
        for name in &compaction.retained {
            sink.report(
                Severity::Error,
                &format!("{name} was removed but is still referenced; writing an empty declaration"),
            );
        }
        let module = &compaction.module;

        if options.share_method_bodies {
            let shared = shared_body_count(module)?;
            if shared > 0 {
                sink.report(Severity::Info, &format!("{shared} method bodies share an identical body"));
            }
        }

        let signed = module.flags.contains(ModuleFlags::STRONG_NAME_SIGNED);
        let has_key = module.assembly.as_ref().is_some_and(|a| a.public_key.is_some());
        if options.delay_sign && !has_key {
            sink.report(Severity::Warning, "delay signing requested but the assembly has no public key");
        } else if signed && !options.delay_sign {
            sink.report(Severity::Warning, "module is flagged strong-name signed but will not be re-signed");
        }

        let mvid = if options.add_determinism_section {
            let content = serde_json::to_vec(module).map_err(|e| Error::WriteFailure(e.to_string()))?;
            let mvid = content_mvid(&content);
            sink.report(Severity::Info, &format!("determinism section: mvid {mvid}"));
            Some(mvid)
        } else {
            None
        };

        let envelope = Envelope {
            format: IMAGE_FORMAT.to_string(),
            version: IMAGE_VERSION,
            mvid,
            delay_signed: options.delay_sign,
            module,
        };
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&envelope)
        } else {
            serde_json::to_vec(&envelope)
        };
        bytes.map_err(|e| Error::WriteFailure(e.to_string()))
    }
}

/// Number of live method bodies identical to an earlier one.
fn shared_body_count(module: &Module) -> Result<usize> {
    let mut seen = HashSet::new();
    let mut shared = 0;
    for ty in module.all_types() {
        for method in &module.ty(ty).methods {
            let Some(body) = &module.method(*method).body else {
                continue;
            };
            let key = serde_json::to_string(body).map_err(|e| Error::WriteFailure(e.to_string()))?;
            if !seen.insert(key) {
                shared += 1;
            }
        }
    }
    Ok(shared)
}

/// Module version id derived from the serialized content: the first 16 bytes of
/// its SHA-1 digest.
fn content_mvid(content: &[u8]) -> String {
    let digest = Sha1::digest(content);
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uguid::Guid::from_bytes(bytes).to_string()
}
