use log::debug;

use crate::{
    metadata::{
        ids::MethodId,
        members::MemberAccess,
        method::{
            ExceptionHandler, Instruction, MethodBody, MethodModifiers, OpCode, Operand,
            CONSTRUCTOR_NAME, FINALIZER_NAME,
        },
        module::Module,
        signatures::{MemberRef, MethodRef, MethodSig, TypeSig},
    },
    reachability::{Classifier, Policy},
};

/// Body selection switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyOptions {
    /// Every body becomes a bare `ret`
    pub use_ret: bool,
    /// Emit bodies that run: `ret` where possible, base constructor chaining and
    /// finalizers that call their base
    pub runtime_mode: bool,
}

/// What [`BodySynthesizer::synthesize`] did to a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesis {
    /// Abstract methods and delegate members never get a body
    NotApplicable,
    /// No managed body to replace outside runtime mode
    Skipped,
    /// The synthesized body equals the existing one
    Unchanged,
    /// The body or implementation flags changed
    Rewritten,
}

/// Replaces method bodies with minimal stand-ins.
///
/// The default stand-in is `ldnull; throw`, which is what compilers emit for
/// reference assemblies. Runtime mode emits bodies that return normally where
/// the method shape allows it.
///
/// Constructor chaining only targets local base constructors that survive: live
/// ones, and under [`BodySynthesizer::with_policy`] also reachable under that policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodySynthesizer {
    options: BodyOptions,
    policy: Option<Policy>,
}

impl BodySynthesizer {
    /// Creates a synthesizer.
    #[must_use]
    pub fn new(options: BodyOptions) -> Self {
        BodySynthesizer { options, policy: None }
    }

    /// Restricts chaining targets to methods `policy` keeps, for use during a pass
    /// that has not removed them yet.
    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// True if a call to the local method `id` stays valid in the output.
    fn keeps(&self, module: &Module, id: MethodId) -> bool {
        if !module.is_method_live(id) {
            return false;
        }
        self.policy.map_or(true, |policy| {
            let classifier = Classifier::new(module, policy);
            classifier.is_type_reachable_nested(module.method(id).declaring_type)
                && classifier.is_method_reachable(id)
        })
    }

    /// Replaces the body of `id`.
    pub fn synthesize(&self, module: &mut Module, id: MethodId) -> Synthesis {
        let method = module.method(id);
        if method.is_abstract() || module.ty(method.declaring_type).is_delegate() {
            return Synthesis::NotApplicable;
        }
        if !self.options.runtime_mode && (!method.is_il() || method.body.is_none()) {
            debug!("Skipped method: {} (no IL body)", module.method_full_name(id));
            return Synthesis::Skipped;
        }

        let old_body = method.body.clone();
        let simple = self.options.use_ret
            || (self.options.runtime_mode && !method.has_return_type() && !method.has_out_only_param());

        let body = if !simple {
            throw_body()
        } else if method.is_instance_constructor() && !self.options.use_ret {
            self.constructor_body(module, id, old_body.as_ref())
        } else if self.options.runtime_mode {
            self.finalizer_body(module, id, old_body.as_ref())
                .unwrap_or_else(ret_body)
        } else {
            ret_body()
        };

        let method = module.method_mut(id);
        let impl_flags = method.impl_flags.as_managed_il();
        let changed = old_body.as_ref() != Some(&body)
            || method.impl_flags != impl_flags
            || method.impl_map.is_some()
            || method.modifiers.contains(MethodModifiers::PINVOKE_IMPL);

        method.impl_flags = impl_flags;
        method.impl_map = None;
        method.modifiers.remove(MethodModifiers::PINVOKE_IMPL);
        method.body = Some(body);

        if changed {
            Synthesis::Rewritten
        } else {
            Synthesis::Unchanged
        }
    }

    fn constructor_body(&self, module: &Module, id: MethodId, old_body: Option<&MethodBody>) -> MethodBody {
        let declaring = module.ty(module.method(id).declaring_type);
        if declaring.is_value_type() {
            return throw_body();
        }
        let Some(base) = &declaring.base_type else {
            return ret_body();
        };

        match base_constructor(module, base, old_body, |ctor| self.keeps(module, ctor)) {
            Some(target) => finish(vec![
                Instruction::simple(OpCode::Ldarg0),
                Instruction::call(target),
                Instruction::simple(OpCode::Ret),
            ]),
            None => throw_body(),
        }
    }

    /// `try { leave RET } finally { base.Finalize() } RET: ret` for overriding finalizers.
    fn finalizer_body(&self, module: &Module, id: MethodId, old_body: Option<&MethodBody>) -> Option<MethodBody> {
        let method = module.method(id);
        let base = module.ty(method.declaring_type).base_type.as_ref()?;
        let is_finalizer = !method.is_static()
            && method.access == MemberAccess::Family
            && method.name == FINALIZER_NAME
            && method.params.is_empty()
            && method.generic_params.is_empty()
            && method.overrides.len() == 1;
        if !is_finalizer {
            return None;
        }

        let mut target = method.overrides[0].declaration.clone();
        let mut search = !module.same_type(base, &module.method_ref_declaring_type(&target));

        if search {
            if let Some(call) = old_body.and_then(tail_finalizer_call) {
                if module.method_ref_name(call) == FINALIZER_NAME {
                    let sig = module.method_ref_signature(call);
                    if sig.return_type.is_void() && sig.params.is_empty() {
                        target = call.clone();
                        search = false;
                    }
                }
            }
        }
        if search {
            if let TypeSig::Def(base_id) = base.strip_modifiers() {
                let wanted = module.method_ref_signature(&target);
                let found = module.ty(*base_id).methods.iter().copied().find(|m| {
                    let candidate = module.method(*m);
                    candidate.name == FINALIZER_NAME && candidate.signature() == wanted
                });
                if let Some(found) = found {
                    let candidate = module.method(found);
                    if candidate.access == MemberAccess::Family && candidate.is_virtual() {
                        target = MethodRef::Def(found);
                    }
                }
            }
        }

        let mut body = MethodBody::new(vec![
            Instruction::with_operand(OpCode::LeaveS, Operand::Target(4)),
            Instruction::simple(OpCode::Ldarg0),
            Instruction::call(target),
            Instruction::simple(OpCode::Endfinally),
            Instruction::simple(OpCode::Ret),
        ]);
        body.exception_handlers.push(ExceptionHandler::finally(0, 1, 1, Some(4)));
        body.update_offsets();
        Some(body)
    }
}

/// Locates the parameterless base constructor a synthesized constructor chains to.
///
/// Local constructors are only chosen when `keeps` accepts them.
fn base_constructor(
    module: &Module,
    base: &TypeSig,
    old_body: Option<&MethodBody>,
    keeps: impl Fn(MethodId) -> bool,
) -> Option<MethodRef> {
    if let Some(body) = old_body.filter(|b| b.instructions.len() >= 3) {
        let found = body.instructions.windows(2).find_map(|pair| {
            if !pair[0].is_ldarg_this() || pair[1].opcode != OpCode::Call {
                return None;
            }
            let Operand::Method(callee) = &pair[1].operand else {
                return None;
            };
            let sig = module.method_ref_signature(callee);
            let matches = module.same_type(&module.method_ref_declaring_type(callee), base)
                && module.method_ref_name(callee) == CONSTRUCTOR_NAME
                && sig.params.is_empty()
                && sig.generic_param_count == 0
                && !matches!(callee, MethodRef::Def(id) if !keeps(*id));
            matches.then(|| callee.clone())
        });
        if found.is_some() {
            return found;
        }
    }

    if module.is_root_object(base) {
        return Some(MethodRef::Member(MemberRef {
            declaring_type: base.clone(),
            name: CONSTRUCTOR_NAME.to_string(),
            signature: MethodSig::instance_void(),
        }));
    }

    if let TypeSig::Def(base_id) = base.strip_modifiers() {
        let ctor = module.parameterless_constructor(*base_id)?;
        if module.method(ctor).access >= MemberAccess::Family && keeps(ctor) {
            return Some(MethodRef::Def(ctor));
        }
    }
    None
}

/// The `call` three instructions from the end of a `try { ... } finally { base.Finalize(); }` body.
fn tail_finalizer_call(body: &MethodBody) -> Option<&MethodRef> {
    let len = body.instructions.len();
    if len < 5 {
        return None;
    }
    body.instructions[len - 3]
        .method_operand()
        .filter(|_| body.instructions[len - 3].opcode == OpCode::Call)
}

fn finish(instructions: Vec<Instruction>) -> MethodBody {
    let mut body = MethodBody::new(instructions);
    body.update_offsets();
    body
}

/// `ldnull; throw`
#[must_use]
pub fn throw_body() -> MethodBody {
    finish(vec![Instruction::simple(OpCode::Ldnull), Instruction::simple(OpCode::Throw)])
}

/// `ret`
#[must_use]
pub fn ret_body() -> MethodBody {
    finish(vec![Instruction::simple(OpCode::Ret)])
}
