use std::path::PathBuf;

use clap::Parser;
use refasm::{reachability::KeepInternal, GeneratorConfig, ViolationPolicy};

/// refasm - generate reference assemblies from .NET modules
#[derive(Debug, Parser)]
#[command(name = "refasm", version, about, long_about = None)]
pub struct Cli {
    /// Module image (`.refimg`), or a directory whose images are processed recursively.
    #[arg(value_name = "ASSEMBLY_PATH")]
    pub assembly_path: PathBuf,

    /// Output file, or output directory when the input is a directory.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overwrite existing output files.
    #[arg(short, long)]
    pub force: bool,

    /// Keep private and internal members.
    #[arg(long)]
    pub keep_non_public: bool,

    /// Internal members: 0 = drop, 1 = keep, 2 = keep when InternalsVisibleTo is present.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub keep_internal: u8,

    /// Mark the output with System.Runtime.CompilerServices.ReferenceAssemblyAttribute.
    #[arg(long)]
    pub inject_reference_assembly_attribute: bool,

    /// Emit bodies that run: `ret` where possible and base constructor calls.
    #[arg(long)]
    pub use_runtime_mode: bool,

    /// Use `ret` instead of `throw null` for every method body.
    #[arg(long)]
    pub use_ret: bool,

    /// Keep manifest resources.
    #[arg(long)]
    pub keep_resources: bool,

    /// Keep the public key so the output can be signed later.
    #[arg(long)]
    pub delay_sign: bool,

    /// Fail a file when a kept signature still references a removed type.
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Maps the flags onto a generator configuration.
    pub fn config(&self) -> GeneratorConfig {
        let keep_internal = KeepInternal::from_level(self.keep_internal).unwrap_or(KeepInternal::AutoPending);
        let violation_policy = if self.strict {
            ViolationPolicy::Abort
        } else {
            ViolationPolicy::Warn
        };

        GeneratorConfig::default()
            .with_keep_non_public(self.keep_non_public)
            .with_keep_internal(keep_internal)
            .with_reference_assembly_attribute(self.inject_reference_assembly_attribute)
            .with_runtime_mode(self.use_runtime_mode)
            .with_use_ret(self.use_ret)
            .with_keep_resources(self.keep_resources)
            .with_delay_sign(self.delay_sign)
            .with_violation_policy(violation_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["refasm", "Lib.refimg"]);
        let config = cli.config();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(cli.assembly_path, PathBuf::from("Lib.refimg"));
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "refasm",
            "Lib.refimg",
            "-o",
            "out.refimg",
            "-f",
            "--keep-internal",
            "0",
            "--use-runtime-mode",
            "--inject-reference-assembly-attribute",
            "--strict",
        ]);
        let config = cli.config();
        assert!(cli.force);
        assert_eq!(config.keep_internal, KeepInternal::Drop);
        assert!(config.use_runtime_mode);
        assert!(config.inject_reference_assembly_attribute);
        assert_eq!(config.violation_policy, ViolationPolicy::Abort);
    }

    #[test]
    fn test_rejects_unknown_level() {
        assert!(Cli::try_parse_from(["refasm", "Lib.refimg", "--keep-internal", "3"]).is_err());
    }
}
