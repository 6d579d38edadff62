//! The retrying reference assembly generator.
//!
//! Whether internals must be kept is only known once a pass finds a public
//! signature that mentions one. [`ReferenceAssemblyGenerator`] therefore runs whole
//! attempts: load the original bytes, prepare the module, prune it under the
//! current policy, and either keep the result or throw the mutated module away and
//! start over from the bytes with an escalated policy.
//!
//! ```text
//! AutoPending --(no InternalsVisibleTo)--> Drop
//! AutoPending --violation--> Keep
//! Drop        --violation--> AutoEscalated --violation--> Keep
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use refasm::{GeneratorConfig, ImageCodec, ReferenceAssemblyGenerator};
//!
//! let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
//! let generated = generator.generate(&std::fs::read("Lib.refimg")?)?;
//! println!("{} attempt(s), {}: {}", generated.attempts, generated.policy, generated.stats);
//! std::fs::write("Lib-reference.refimg", &generated.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use log::{debug, info};

use crate::{
    body::BodySynthesizer,
    codec::{DiagnosticSink, LogSink, MetadataCodec},
    config::GeneratorConfig,
    inject::inject_reference_assembly_attribute,
    metadata::{
        customattributes::INTERNALS_VISIBLE_TO_ATTRIBUTE,
        module::{Module, ModuleFlags},
    },
    pruning::{PruneOutcome, PruneStats, Pruner},
    reachability::Policy,
    Error, Result,
};

/// Upper bound on attempts per module; two escalations at most are possible.
pub const MAX_ATTEMPTS: usize = 3;

/// A module that went through a complete pruning pass
#[derive(Debug, Clone)]
pub struct PrunedModule {
    /// The pruned module
    pub module: Module,
    /// What the pass did
    pub stats: PruneStats,
    /// The resolved policy the pass ran under
    pub policy: Policy,
}

/// Result of a single attempt
#[derive(Debug, Clone)]
pub enum Attempt {
    /// The pass completed
    Completed(PrunedModule),
    /// The pass hit a violation; start over with this policy
    Retry(Policy),
}

/// Output of [`ReferenceAssemblyGenerator::generate`]
#[derive(Debug, Clone)]
pub struct Generated {
    /// Serialized reference module
    pub bytes: Vec<u8>,
    /// Statistics of the successful attempt
    pub stats: PruneStats,
    /// Policy of the successful attempt
    pub policy: Policy,
    /// Number of attempts made, the successful one included
    pub attempts: usize,
}

/// Generates reference assemblies through a [`MetadataCodec`].
pub struct ReferenceAssemblyGenerator<C> {
    codec: C,
    config: GeneratorConfig,
}

impl<C: MetadataCodec> ReferenceAssemblyGenerator<C> {
    /// Creates a generator.
    pub fn new(codec: C, config: GeneratorConfig) -> Self {
        ReferenceAssemblyGenerator { codec, config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The codec in use.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Produces the reference form of the module in `bytes`, logging writer diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAManagedModule`] if the codec cannot load `bytes`,
    /// [`Error::StructuralInvariantViolation`] for an unresolved violation under
    /// [`crate::config::ViolationPolicy::Abort`], or the codec's write error.
    pub fn generate(&self, bytes: &[u8]) -> Result<Generated> {
        self.generate_with_sink(bytes, &mut LogSink)
    }

    /// Like [`ReferenceAssemblyGenerator::generate`], with diagnostics sent to `sink`.
    ///
    /// # Errors
    ///
    /// See [`ReferenceAssemblyGenerator::generate`].
    pub fn generate_with_sink(&self, bytes: &[u8], sink: &mut dyn DiagnosticSink) -> Result<Generated> {
        let (pruned, attempts) = self.prune(bytes)?;
        let bytes = self
            .codec
            .write(&pruned.module, &self.config.write_options(), sink)?;
        Ok(Generated {
            bytes,
            stats: pruned.stats,
            policy: pruned.policy,
            attempts,
        })
    }

    /// Runs attempts until one completes, returning it with the number of attempts made.
    ///
    /// Every attempt starts from `bytes`; an escalated policy never carries over to
    /// another call.
    ///
    /// # Errors
    ///
    /// See [`ReferenceAssemblyGenerator::generate`].
    pub fn prune(&self, bytes: &[u8]) -> Result<(PrunedModule, usize)> {
        let mut policy = self.config.policy();
        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(bytes, policy)? {
                Attempt::Completed(pruned) => return Ok((pruned, attempt)),
                Attempt::Retry(next) => {
                    info!("Attempt {attempt} failed, retrying with {next}");
                    policy = next;
                }
            }
        }
        Err(Error::StructuralInvariantViolation(format!(
            "no attempt completed within {MAX_ATTEMPTS} attempts"
        )))
    }

    /// Runs one attempt under `policy` on a freshly loaded module.
    ///
    /// # Errors
    ///
    /// See [`ReferenceAssemblyGenerator::generate`].
    pub fn attempt(&self, bytes: &[u8], policy: Policy) -> Result<Attempt> {
        let mut module = self.codec.load(bytes)?;
        prepare_module(&mut module, &self.config);

        let has_friends = module
            .assembly
            .as_ref()
            .is_some_and(|a| module.is_defined(&a.custom_attributes, INTERNALS_VISIBLE_TO_ATTRIBUTE));
        let policy = policy.resolve(has_friends);
        debug!("Pruning {} with {policy}", module.name);

        let outcome = Pruner::new(&mut module, policy)
            .with_body_options(self.config.body_options())
            .with_violation_policy(self.config.violation_policy)
            .run()?;
        let stats = match outcome {
            PruneOutcome::Completed(stats) => stats,
            PruneOutcome::Retry(next) => return Ok(Attempt::Retry(next)),
        };

        if self.config.inject_reference_assembly_attribute {
            let synthesizer = BodySynthesizer::new(self.config.body_options());
            inject_reference_assembly_attribute(&mut module, &synthesizer);
        }
        Ok(Attempt::Completed(PrunedModule { module, stats, policy }))
    }
}

/// Module-level rewrites applied before pruning: IL-only, strong name dropped
/// unless delay signing, resources stripped unless kept.
pub fn prepare_module(module: &mut Module, config: &GeneratorConfig) {
    module.flags.insert(ModuleFlags::IL_ONLY);
    if module.flags.contains(ModuleFlags::STRONG_NAME_SIGNED) && !config.delay_sign {
        module.flags.remove(ModuleFlags::STRONG_NAME_SIGNED);
        if let Some(assembly) = module.assembly.as_mut() {
            assembly.public_key = None;
        }
    }
    if !config.keep_resources {
        module.resources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::ImageCodec,
        config::ViolationPolicy,
        metadata::{
            builder::{attribute, corlib_type, MethodBuilder, TypeBuilder},
            module::{AssemblyDef, Resource},
            signatures::TypeSig,
            types::TypeVisibility,
        },
        reachability::KeepInternal,
    };

    fn leaking_module(friends: bool) -> Vec<u8> {
        let mut module = Module::new("Lib.dll");
        let mut assembly = AssemblyDef::new("Lib");
        if friends {
            let ivt = corlib_type(&module, "System.Runtime.CompilerServices", "InternalsVisibleToAttribute");
            assembly.custom_attributes.push(attribute(ivt));
        }
        module.assembly = Some(assembly);

        let secret = TypeBuilder::class("N", "Secret")
            .visibility(TypeVisibility::NotPublic)
            .build(&mut module);
        MethodBuilder::constructor().ret_body().build(&mut module, secret);
        let api = TypeBuilder::class("N", "Api").build(&mut module);
        MethodBuilder::constructor().ret_body().build(&mut module, api);
        MethodBuilder::new("Use")
            .param("s", TypeSig::Def(secret))
            .ret_body()
            .build(&mut module, api);
        ImageCodec::new().to_image(&module).unwrap()
    }

    #[test]
    fn test_escalation_from_drop() {
        let generator = ReferenceAssemblyGenerator::new(
            ImageCodec::new(),
            GeneratorConfig::new().with_keep_internal(KeepInternal::Drop),
        );
        let (pruned, attempts) = generator.prune(&leaking_module(false)).unwrap();
        assert_eq!(attempts, 2);
        assert_eq!(pruned.policy.keep_internal, KeepInternal::AutoEscalated);
        assert!(pruned.module.find_type("N.Secret").is_some());
        assert!(pruned.stats.violations.is_empty());
    }

    #[test]
    fn test_auto_without_friends_escalates_twice_at_most() {
        let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
        let (pruned, attempts) = generator.prune(&leaking_module(false)).unwrap();
        assert_eq!(attempts, 2);
        assert_eq!(pruned.policy.keep_internal, KeepInternal::AutoEscalated);
    }

    #[test]
    fn test_auto_with_friends_keeps_internals() {
        let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
        let (pruned, attempts) = generator.prune(&leaking_module(true)).unwrap();
        assert_eq!(attempts, 1);
        assert_eq!(pruned.policy.keep_internal, KeepInternal::AutoPending);
        assert!(pruned.module.find_type("N.Secret").is_some());
    }

    #[test]
    fn test_keep_with_abort_succeeds() {
        let generator = ReferenceAssemblyGenerator::new(
            ImageCodec::new(),
            GeneratorConfig::strict().with_keep_internal(KeepInternal::Keep),
        );
        let generated = generator.generate(&leaking_module(false)).unwrap();
        assert_eq!(generated.attempts, 1);
        assert!(generated.stats.violations.is_empty());
    }

    #[test]
    fn test_not_a_module() {
        let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
        let err = generator.generate(b"\x7fELF").unwrap_err();
        assert!(err.is_skippable());
    }

    #[test]
    fn test_prepare_module() {
        let mut module = Module::new("Lib.dll");
        module.flags = ModuleFlags::STRONG_NAME_SIGNED | ModuleFlags::REQUIRED_32BIT;
        let mut assembly = AssemblyDef::new("Lib");
        assembly.public_key = Some(vec![0, 36, 0, 0]);
        module.assembly = Some(assembly);
        module.resources.push(Resource {
            name: "Strings.resources".into(),
            public: true,
            data: vec![1, 2, 3],
        });

        let mut delay_signed = module.clone();
        prepare_module(&mut module, &GeneratorConfig::default());
        assert!(module.flags.contains(ModuleFlags::IL_ONLY));
        assert!(!module.flags.contains(ModuleFlags::STRONG_NAME_SIGNED));
        assert_eq!(module.assembly.as_ref().and_then(|a| a.public_key.clone()), None);
        assert!(module.resources.is_empty());

        prepare_module(
            &mut delay_signed,
            &GeneratorConfig::new().with_delay_sign(true).with_keep_resources(true),
        );
        assert!(delay_signed.flags.contains(ModuleFlags::STRONG_NAME_SIGNED));
        assert!(delay_signed.assembly.as_ref().is_some_and(|a| a.public_key.is_some()));
        assert_eq!(delay_signed.resources.len(), 1);
    }

    #[test]
    fn test_violation_policy_reaches_pruner() {
        let mut module = Module::new("Lib.dll");
        let api = TypeBuilder::class("N", "Api").build(&mut module);
        let private = TypeBuilder::nested(api, "Impl")
            .visibility(TypeVisibility::NestedPrivate)
            .build(&mut module);
        MethodBuilder::new("Get")
            .returns(TypeSig::Def(private))
            .ret_body()
            .build(&mut module, api);
        let bytes = ImageCodec::new().to_image(&module).unwrap();

        let warn = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
        let generated = warn.generate(&bytes).unwrap();
        assert_eq!(generated.attempts, 3);
        assert_eq!(generated.stats.violations.len(), 1);

        let abort = ReferenceAssemblyGenerator::new(
            ImageCodec::new(),
            GeneratorConfig::default().with_violation_policy(ViolationPolicy::Abort),
        );
        assert!(matches!(
            abort.generate(&bytes),
            Err(Error::StructuralInvariantViolation(_))
        ));
    }
}
