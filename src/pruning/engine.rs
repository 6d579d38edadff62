use log::{debug, warn};

use crate::{
    body::{BodyOptions, BodySynthesizer, Synthesis},
    config::ViolationPolicy,
    metadata::{
        customattributes::AttributeOwner,
        generics::GenericParamOwner,
        ids::{FieldId, MethodId, TypeId},
        module::Module,
        signatures::TypeSig,
    },
    pruning::{
        ctor::{inject_default_constructor, needs_default_constructor},
        padding::{existing_padding, insert_padding, PaddingMode},
        PruneStats,
    },
    reachability::{Classifier, Policy},
    Error, Result,
};

/// Result of one pruning pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The walk finished; the module is pruned
    Completed(PruneStats),
    /// A violation requires a fresh attempt with this policy. The module is left
    /// partially pruned and must be discarded.
    Retry(Policy),
}

enum Halt {
    Retry(Policy),
    Fatal(Error),
}

type Step = std::result::Result<(), Halt>;

/// Walks a module's types depth-first, removing what the policy does not keep and
/// repairing what the removals leave behind.
///
/// Removal sets are collected with a [`Classifier`] before any entity of a
/// collection is detached, so every decision in a collection sees the same graph.
/// When a kept entity references a type that did not survive, the pass stops with
/// [`PruneOutcome::Retry`] if the policy can still be escalated.
///
/// # Examples
///
/// ```rust
/// use refasm::metadata::{builder::TypeBuilder, module::Module, types::TypeVisibility};
/// use refasm::pruning::{PruneOutcome, Pruner};
/// use refasm::reachability::{KeepInternal, Policy};
///
/// let mut module = Module::new("Lib.dll");
/// TypeBuilder::class("N", "Hidden")
///     .visibility(TypeVisibility::NotPublic)
///     .build(&mut module);
///
/// let outcome = Pruner::new(&mut module, Policy::new(false, KeepInternal::Drop)).run()?;
/// match outcome {
///     PruneOutcome::Completed(stats) => assert_eq!(stats.types_removed, 1),
///     PruneOutcome::Retry(_) => unreachable!(),
/// }
/// # Ok::<(), refasm::Error>(())
/// ```
pub struct Pruner<'m> {
    module: &'m mut Module,
    policy: Policy,
    synthesizer: BodySynthesizer,
    violation_policy: ViolationPolicy,
    stats: PruneStats,
}

impl<'m> Pruner<'m> {
    /// Creates a pruner with default body options that warns on violations it
    /// cannot escalate away.
    pub fn new(module: &'m mut Module, policy: Policy) -> Self {
        Pruner {
            module,
            policy,
            synthesizer: BodySynthesizer::default().with_policy(policy),
            violation_policy: ViolationPolicy::default(),
            stats: PruneStats::new(),
        }
    }

    /// Sets the body synthesis options.
    #[must_use]
    pub fn with_body_options(mut self, options: BodyOptions) -> Self {
        self.synthesizer = BodySynthesizer::new(options).with_policy(self.policy);
        self
    }

    /// Sets the handling of violations the policy cannot be escalated past.
    #[must_use]
    pub fn with_violation_policy(mut self, violation_policy: ViolationPolicy) -> Self {
        self.violation_policy = violation_policy;
        self
    }

    /// Runs the pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralInvariantViolation`] for a violation that cannot be
    /// escalated away when configured with [`ViolationPolicy::Abort`].
    pub fn run(mut self) -> Result<PruneOutcome> {
        match self.walk() {
            Ok(()) => {
                debug!("Pruned {} ({}): {}", self.module.name, self.policy, self.stats);
                Ok(PruneOutcome::Completed(self.stats))
            }
            Err(Halt::Retry(policy)) => Ok(PruneOutcome::Retry(policy)),
            Err(Halt::Fatal(error)) => Err(error),
        }
    }

    fn classifier(&self) -> Classifier<'_> {
        Classifier::new(&*self.module, self.policy)
    }

    fn walk(&mut self) -> Step {
        for ty in self.module.types.clone() {
            self.check_type(ty)?;
        }
        self.prune_attributes(AttributeOwner::Assembly);
        self.prune_attributes(AttributeOwner::Module);
        Ok(())
    }

    fn check_type(&mut self, ty: TypeId) -> Step {
        if !self.classifier().is_type_reachable(ty) {
            self.drop_type(ty);
            return Ok(());
        }

        if let Some(base) = self.module.ty(ty).base_type.clone() {
            let ok = self.classifier().is_sig_reachable(&base);
            self.check(ok, |m| {
                format!("{} derives from unreachable type {}", m.type_full_name(ty), sig_name(m, &base))
            })?;
        }
        self.prune_attributes(AttributeOwner::Type(ty));
        self.prune_generic_params(GenericParamOwner::Type(ty));
        self.prune_interfaces(ty);
        self.prune_methods(ty)?;
        self.prune_fields(ty)?;
        self.prune_properties(ty);
        self.prune_events(ty)?;

        if needs_default_constructor(self.module, ty) {
            debug!("Injecting default constructor into {}", self.module.type_full_name(ty));
            let (_, synthesis) = inject_default_constructor(self.module, ty, &self.synthesizer);
            self.stats.constructors_injected += 1;
            self.record(synthesis);
        }

        for nested in self.module.ty(ty).nested_types.clone() {
            self.check_type(nested)?;
        }
        Ok(())
    }

    fn drop_type(&mut self, ty: TypeId) {
        if ty == self.module.global_type {
            if !self.module.ty(ty).is_empty() {
                self.module.clear_type(ty);
                self.stats.types_emptied += 1;
            }
            return;
        }
        debug!("Removing type {}", self.module.type_full_name(ty));
        self.module.remove_type(ty);
        self.stats.types_removed += 1;
    }

    /// Handles a failed structural check: escalate if possible, otherwise warn or abort.
    fn check(&mut self, ok: bool, describe: impl FnOnce(&Module) -> String) -> Step {
        if ok {
            return Ok(());
        }
        let message = describe(&*self.module);
        if let Some(next) = self.policy.escalate() {
            warn!("{message}; retrying with {next}");
            return Err(Halt::Retry(next));
        }
        match self.violation_policy {
            ViolationPolicy::Warn => {
                warn!("{message}");
                self.stats.violations.push(message);
                Ok(())
            }
            ViolationPolicy::Abort => Err(Halt::Fatal(Error::StructuralInvariantViolation(message))),
        }
    }

    fn prune_attributes(&mut self, owner: AttributeOwner) {
        let Some(attributes) = self.module.attributes(owner) else {
            return;
        };
        if attributes.is_empty() {
            return;
        }
        let classifier = self.classifier();
        let keep: Vec<bool> = attributes
            .iter()
            .map(|attr| classifier.is_attribute_reachable(attr))
            .collect();
        if let Some(attributes) = self.module.attributes_mut(owner) {
            self.stats.attributes_removed += retain_mask(attributes, &keep);
        }
    }

    fn prune_generic_params(&mut self, owner: GenericParamOwner) {
        let Some(params) = self.module.generic_params(owner) else {
            return;
        };
        if params.is_empty() {
            return;
        }
        let classifier = self.classifier();
        let masks: Vec<Vec<bool>> = params
            .iter()
            .map(|p| {
                p.constraints
                    .iter()
                    .map(|c| classifier.is_sig_reachable(&c.constraint))
                    .collect()
            })
            .collect();

        let mut shape = Vec::with_capacity(masks.len());
        if let Some(params) = self.module.generic_params_mut(owner) {
            for (param, mask) in params.iter_mut().zip(&masks) {
                self.stats.constraints_removed += retain_mask(&mut param.constraints, mask);
                shape.push(param.constraints.len());
            }
        }

        for (index, constraints) in shape.into_iter().enumerate() {
            self.prune_attributes(AttributeOwner::GenericParam(owner, index));
            for constraint in 0..constraints {
                self.prune_attributes(AttributeOwner::GenericParamConstraint(owner, index, constraint));
            }
        }
    }

    /// Removes interface implementations of unreachable interfaces together with
    /// the explicit implementation records that point into them.
    fn prune_interfaces(&mut self, ty: TypeId) {
        let classifier = self.classifier();
        let keep: Vec<bool> = self
            .module
            .ty(ty)
            .interfaces
            .iter()
            .map(|i| classifier.is_sig_reachable(&i.interface))
            .collect();

        if keep.contains(&false) {
            let dropped: Vec<TypeSig> = self
                .module
                .ty(ty)
                .interfaces
                .iter()
                .zip(&keep)
                .filter(|(_, keep)| !**keep)
                .map(|(i, _)| i.interface.clone())
                .collect();

            for method in self.module.ty(ty).methods.clone() {
                let module = &*self.module;
                let overrides: Vec<bool> = module
                    .method(method)
                    .overrides
                    .iter()
                    .map(|o| {
                        let declaring = module.method_ref_declaring_type(&o.declaration);
                        !dropped.iter().any(|i| module.same_type(&declaring, i))
                    })
                    .collect();
                if overrides.contains(&false) {
                    let removed = retain_mask(&mut self.module.method_mut(method).overrides, &overrides);
                    self.stats.overrides_removed += removed;
                }
            }

            for interface in &dropped {
                debug!(
                    "Removing interface {} from {}",
                    sig_name(self.module, interface),
                    self.module.type_full_name(ty)
                );
            }
            self.stats.interfaceimpls_removed += retain_mask(&mut self.module.ty_mut(ty).interfaces, &keep);
        }

        for index in 0..self.module.ty(ty).interfaces.len() {
            self.prune_attributes(AttributeOwner::InterfaceImpl(ty, index));
        }
    }

    fn prune_methods(&mut self, ty: TypeId) -> Step {
        let classifier = self.classifier();
        let (kept, removed): (Vec<MethodId>, Vec<MethodId>) = self
            .module
            .ty(ty)
            .methods
            .iter()
            .copied()
            .partition(|m| classifier.is_method_reachable(*m));

        for method in &removed {
            debug!("Removing method {}", self.module.method_full_name(*method));
            self.module.remove_method(*method);
        }
        self.stats.methods_removed += removed.len();

        for method in kept {
            self.prune_attributes(AttributeOwner::Method(method));

            for index in 0..self.module.method(method).params.len() {
                self.prune_attributes(AttributeOwner::Param(method, index));
                let param = &self.module.method(method).params[index];
                let ok = self.classifier().is_sig_reachable(&param.param_type);
                self.check(ok, |m| {
                    let param = &m.method(method).params[index];
                    format!(
                        "{} parameter '{}' has unreachable type {}",
                        m.method_full_name(method),
                        param.name,
                        sig_name(m, &param.param_type)
                    )
                })?;
            }

            self.prune_attributes(AttributeOwner::Return(method));
            let ok = self
                .classifier()
                .is_sig_reachable(&self.module.method(method).ret.return_type);
            self.check(ok, |m| {
                format!(
                    "{} returns unreachable type {}",
                    m.method_full_name(method),
                    sig_name(m, &m.method(method).ret.return_type)
                )
            })?;

            self.prune_generic_params(GenericParamOwner::Method(method));

            let synthesis = self.synthesizer.synthesize(self.module, method);
            self.record(synthesis);
        }
        Ok(())
    }

    fn record(&mut self, synthesis: Synthesis) {
        match synthesis {
            Synthesis::Rewritten => self.stats.bodies_rewritten += 1,
            Synthesis::Skipped => self.stats.bodies_skipped += 1,
            Synthesis::Unchanged | Synthesis::NotApplicable => {}
        }
    }

    fn prune_fields(&mut self, ty: TypeId) -> Step {
        let padding = existing_padding(self.module, ty);
        let classifier = self.classifier();
        let removed: Vec<FieldId> = self
            .module
            .ty(ty)
            .fields
            .iter()
            .copied()
            .filter(|f| Some(*f) != padding && !classifier.is_field_reachable(*f))
            .collect();

        let mode = if self.module.ty(ty).is_value_type() && !self.policy.keep_non_public {
            PaddingMode::from_removed(self.module, &removed)
        } else {
            PaddingMode::None
        };

        for field in &removed {
            debug!(
                "Removing field {}::{}",
                self.module.type_full_name(ty),
                self.module.field(*field).name
            );
            self.module.remove_field(*field);
        }
        self.stats.fields_removed += removed.len();

        for field in self.module.ty(ty).fields.clone() {
            self.prune_attributes(AttributeOwner::Field(field));
            let ok = self
                .classifier()
                .is_sig_reachable(&self.module.field(field).field_type);
            self.check(ok, |m| {
                let def = m.field(field);
                format!(
                    "{}::{} has unreachable type {}",
                    m.type_full_name(ty),
                    def.name,
                    sig_name(m, &def.field_type)
                )
            })?;
        }

        if padding.is_none() && insert_padding(self.module, ty, mode).is_some() {
            debug!("Padding {} ({mode:?})", self.module.type_full_name(ty));
            self.stats.padding_fields_added += 1;
        }
        Ok(())
    }

    fn prune_properties(&mut self, ty: TypeId) {
        for id in self.module.ty(ty).properties.clone() {
            let mut property = self.module.property(id).clone();
            let cleared = property.retain_accessors(|m| self.module.is_method_live(m));
            if cleared > 0 {
                self.stats.accessors_cleared += cleared;
                *self.module.property_mut(id) = property;
            }

            if self.module.property(id).is_empty() {
                debug!(
                    "Removing property {}::{}",
                    self.module.type_full_name(ty),
                    self.module.property(id).name
                );
                self.module.remove_property(id);
                self.stats.properties_removed += 1;
                continue;
            }
            self.prune_attributes(AttributeOwner::Property(id));
        }
    }

    fn prune_events(&mut self, ty: TypeId) -> Step {
        for id in self.module.ty(ty).events.clone() {
            let mut event = self.module.event(id).clone();
            let cleared = event.retain_accessors(|m| self.module.is_method_live(m));
            if cleared > 0 {
                self.stats.accessors_cleared += cleared;
                *self.module.event_mut(id) = event;
            }

            if self.module.event(id).is_empty() {
                debug!(
                    "Removing event {}::{}",
                    self.module.type_full_name(ty),
                    self.module.event(id).name
                );
                self.module.remove_event(id);
                self.stats.events_removed += 1;
                continue;
            }
            self.prune_attributes(AttributeOwner::Event(id));
            let ok = self
                .classifier()
                .is_sig_reachable(&self.module.event(id).event_type);
            self.check(ok, |m| {
                let def = m.event(id);
                format!(
                    "{}::{} has unreachable handler type {}",
                    m.type_full_name(ty),
                    def.name,
                    sig_name(m, &def.event_type)
                )
            })?;
        }
        Ok(())
    }
}

/// Keeps the items whose flag in `keep` is set, returning how many were dropped.
fn retain_mask<T>(items: &mut Vec<T>, keep: &[bool]) -> usize {
    let before = items.len();
    let mut flags = keep.iter();
    items.retain(|_| flags.next().copied().unwrap_or(true));
    before - items.len()
}

/// Diagnostic name of the innermost type a signature wraps.
fn sig_name(module: &Module, sig: &TypeSig) -> String {
    let mut current = sig.strip_modifiers();
    while let Some(element) = current.element() {
        current = element.strip_modifiers();
    }
    module
        .sig_full_name(current)
        .unwrap_or_else(|| format!("{current:?}"))
}
