use std::path::PathBuf;

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Input and Output Errors
/// - [`Error::InputNotFound`] - The input path does not exist
/// - [`Error::OutputAlreadyExists`] - The output path exists and overwriting was not requested
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// ## Codec Errors
/// - [`Error::NotAManagedModule`] - The input bytes are not a managed module; callers skip the file
/// - [`Error::WriteFailure`] - Serializing the pruned module failed
/// - [`Error::Malformed`] - A module image or arena lookup is inconsistent
///
/// ## Pruning Errors
/// - [`Error::StructuralInvariantViolation`] - A retained entity references a removed type and no
///   further policy escalation was possible
///
/// # Examples
///
/// ```rust,no_run
/// use refasm::{Error, ImageCodec, ReferenceAssemblyGenerator, GeneratorConfig};
///
/// let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
/// match generator.generate(&std::fs::read("lib.refimg")?) {
///     Ok(generated) => println!("{}", generated.stats),
///     Err(Error::NotAManagedModule(reason)) => println!("skipped: {reason}"),
///     Err(e) => eprintln!("failed: {e}"),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input file or directory does not exist.
    #[error("Input was not found - {}", .0.display())]
    InputNotFound(PathBuf),

    /// The output file exists already and `force` was not set.
    #[error("Output file '{}' exists already. Use --force to override it.", .0.display())]
    OutputAlreadyExists(PathBuf),

    /// The input bytes could not be loaded as a managed module.
    ///
    /// This is not fatal for batch processing: the file is skipped and an
    /// informational message is logged.
    #[error("Not a managed module - {0}")]
    NotAManagedModule(String),

    /// A retained entity references a type that did not survive pruning.
    ///
    /// Raised only once the retry policy cannot be escalated any further and the
    /// generator was configured to abort on such violations.
    #[error("Structural invariant violated - {0}")]
    StructuralInvariantViolation(String),

    /// The codec failed to serialize the pruned module.
    #[error("Failed to write module - {0}")]
    WriteFailure(String),

    /// The module image is damaged or an arena lookup referenced a missing entity.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns true if this error means the input should be skipped rather than failed.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::NotAManagedModule(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_macro_records_location() {
        let err = malformed_error!("unknown type id {}", 7);
        match err {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "unknown type id 7");
                assert!(file.ends_with("error.rs"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skippable() {
        assert!(Error::NotAManagedModule("bad magic".into()).is_skippable());
        assert!(!Error::WriteFailure("disk full".into()).is_skippable());
    }

    #[test]
    fn test_output_exists_message() {
        let err = Error::OutputAlreadyExists(PathBuf::from("out/a.dll"));
        assert!(err.to_string().contains("--force"));
    }
}
