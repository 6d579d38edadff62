//! Marking the output with `ReferenceAssemblyAttribute`.
//!
//! Runtimes refuse to load assemblies carrying the attribute for execution, which
//! is the point of the marker. The attribute type is looked up in the module and
//! synthesized as an internal type when missing; corlib is never consulted since
//! its reference assemblies are not always at hand.

use log::{debug, warn};

use crate::{
    body::BodySynthesizer,
    metadata::{
        builder::{corlib_type, MethodBuilder, TypeBuilder},
        customattributes::{CustomAttribute, REFERENCE_ASSEMBLY_ATTRIBUTE},
        ids::TypeId,
        method::MethodBody,
        module::Module,
        signatures::MethodRef,
        types::{TypeFlags, TypeVisibility},
    },
};

const ATTRIBUTE_NAMESPACE: &str = "System.Runtime.CompilerServices";
const ATTRIBUTE_NAME: &str = "ReferenceAssemblyAttribute";

/// Outcome of [`inject_reference_assembly_attribute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// The assembly already carried the attribute
    AlreadyMarked,
    /// An attribute instance was appended
    Added,
    /// No assembly manifest, or the attribute type has no usable constructor
    Skipped,
}

/// Appends a `ReferenceAssemblyAttribute` instance to the assembly attributes.
///
/// Running it twice leaves one attribute type and one instance.
pub fn inject_reference_assembly_attribute(module: &mut Module, synthesizer: &BodySynthesizer) -> Injection {
    let Some(assembly) = &module.assembly else {
        warn!("{}: no assembly manifest, not marking as reference assembly", module.name);
        return Injection::Skipped;
    };
    if module.is_defined(&assembly.custom_attributes, REFERENCE_ASSEMBLY_ATTRIBUTE) {
        return Injection::AlreadyMarked;
    }

    let ty = match module.find_type(REFERENCE_ASSEMBLY_ATTRIBUTE) {
        Some(ty) => ty,
        None => define_attribute_type(module, synthesizer),
    };
    let Some(ctor) = module.parameterless_constructor(ty) else {
        warn!(
            "{}: {} has no parameterless constructor, not marking as reference assembly",
            module.name, REFERENCE_ASSEMBLY_ATTRIBUTE
        );
        return Injection::Skipped;
    };

    if let Some(assembly) = module.assembly.as_mut() {
        assembly
            .custom_attributes
            .push(CustomAttribute::new(MethodRef::Def(ctor)));
    }
    debug!("{}: marked as reference assembly", module.name);
    Injection::Added
}

/// `internal sealed class ReferenceAssemblyAttribute : System.Attribute { public ReferenceAssemblyAttribute() }`
fn define_attribute_type(module: &mut Module, synthesizer: &BodySynthesizer) -> TypeId {
    let base = corlib_type(module, "System", "Attribute");
    let ty = TypeBuilder::class(ATTRIBUTE_NAMESPACE, ATTRIBUTE_NAME)
        .visibility(TypeVisibility::NotPublic)
        .flags(TypeFlags::SEALED)
        .base(base)
        .build(module);

    let mut ctor = MethodBuilder::constructor().into_def(ty);
    ctor.body = Some(MethodBody::new(Vec::new()));
    let ctor = module.add_method(ctor);
    synthesizer.synthesize(module, ctor);
    ty
}
