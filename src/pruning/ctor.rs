//! Default constructor injection for classes that lost every instance constructor.
//!
//! A class with no constructor at all would let consumers of the reference
//! assembly call `new` on it through the implicit default constructor. A private
//! one keeps the type non-constructible from outside, as it was.

use crate::{
    body::{BodySynthesizer, Synthesis},
    metadata::{
        builder::MethodBuilder,
        ids::{MethodId, TypeId},
        members::MemberAccess,
        method::MethodBody,
        module::Module,
    },
};

/// True if `ty` is a retained class that needs a synthesized constructor.
#[must_use]
pub fn needs_default_constructor(module: &Module, ty: TypeId) -> bool {
    let def = module.ty(ty);
    ty != module.global_type
        && !def.is_value_type()
        && !def.is_interface()
        && !def.is_static_class()
        && module.instance_constructors(ty).is_empty()
}

/// Inserts a private parameterless constructor as the first method of `ty` and
/// gives it a synthesized body.
pub fn inject_default_constructor(
    module: &mut Module,
    ty: TypeId,
    synthesizer: &BodySynthesizer,
) -> (MethodId, Synthesis) {
    let mut ctor = MethodBuilder::constructor()
        .access(MemberAccess::Private)
        .into_def(ty);
    ctor.body = Some(MethodBody::new(Vec::new()));

    let id = module.insert_method(0, ctor);
    (id, synthesizer.synthesize(module, id))
}
