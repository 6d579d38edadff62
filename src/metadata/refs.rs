//! Walking the ids an entity refers to.
//!
//! Every place a definition can name another definition of the same module by id
//! (a `TypeSig::Def` inside any signature, a `MethodRef::Def` in an attribute
//! constructor, an override or an instruction operand) is reached through the
//! `walk_*` functions here. Owner lists (`methods`, `nested_types`, ...) and
//! declaring types are structural and are not visited.
//!
//! Module compaction uses the same walk twice: once to find what a kept entity
//! needs, and once to rewrite ids into the compacted arena.

use crate::metadata::{
    customattributes::{AttributeValue, CustomAttribute, CustomAttributeArgument},
    generics::GenericParam,
    ids::{MethodId, TypeId},
    members::{EventDef, FieldDef, PropertyDef},
    method::{MethodDef, MethodOverride, Operand},
    signatures::{MethodRef, TypeSig},
    types::TypeDef,
};

/// Receives every id reference found by a walk.
pub trait IdVisitor {
    /// Called for each referenced type.
    fn visit_type(&mut self, id: &mut TypeId);

    /// Called for each referenced method.
    fn visit_method(&mut self, id: &mut MethodId);
}

/// Visits the type ids inside a signature.
pub fn walk_sig<V: IdVisitor + ?Sized>(sig: &mut TypeSig, visitor: &mut V) {
    match sig {
        TypeSig::Def(id) => visitor.visit_type(id),
        TypeSig::GenericInst(definition, args) => {
            walk_sig(definition, visitor);
            for arg in args {
                walk_sig(arg, visitor);
            }
        }
        TypeSig::Ptr(inner)
        | TypeSig::ByRef(inner)
        | TypeSig::SzArray(inner)
        | TypeSig::Array(inner, _)
        | TypeSig::Pinned(inner) => walk_sig(inner, visitor),
        TypeSig::Modified {
            modifier, inner, ..
        } => {
            walk_sig(modifier, visitor);
            walk_sig(inner, visitor);
        }
        _ => {}
    }
}

/// Visits a method reference: the method itself, or the types of a member reference.
pub fn walk_method_ref<V: IdVisitor + ?Sized>(method: &mut MethodRef, visitor: &mut V) {
    match method {
        MethodRef::Def(id) => visitor.visit_method(id),
        MethodRef::Member(member) => {
            walk_sig(&mut member.declaring_type, visitor);
            walk_sig(&mut member.signature.return_type, visitor);
            for param in &mut member.signature.params {
                walk_sig(param, visitor);
            }
        }
    }
}

fn walk_argument<V: IdVisitor + ?Sized>(argument: &mut CustomAttributeArgument, visitor: &mut V) {
    walk_sig(&mut argument.arg_type, visitor);
    match &mut argument.value {
        AttributeValue::Type(sig) => walk_sig(sig, visitor),
        AttributeValue::Array(items) => {
            for item in items {
                walk_argument(item, visitor);
            }
        }
        _ => {}
    }
}

/// Visits attribute constructors and every `typeof` value in the arguments.
pub fn walk_attributes<V: IdVisitor + ?Sized>(attributes: &mut [CustomAttribute], visitor: &mut V) {
    for attribute in attributes {
        walk_method_ref(&mut attribute.constructor, visitor);
        for argument in &mut attribute.fixed_args {
            walk_argument(argument, visitor);
        }
        for named in &mut attribute.named_args {
            walk_argument(&mut named.argument, visitor);
        }
    }
}

/// Visits constraints and attributes of a generic parameter list.
pub fn walk_generic_params<V: IdVisitor + ?Sized>(params: &mut [GenericParam], visitor: &mut V) {
    for param in params {
        walk_attributes(&mut param.custom_attributes, visitor);
        for constraint in &mut param.constraints {
            walk_sig(&mut constraint.constraint, visitor);
            walk_attributes(&mut constraint.custom_attributes, visitor);
        }
    }
}

/// Visits the base type, interfaces, generic parameters and attributes of a type.
pub fn walk_type<V: IdVisitor + ?Sized>(ty: &mut TypeDef, visitor: &mut V) {
    if let Some(base) = &mut ty.base_type {
        walk_sig(base, visitor);
    }
    for interface in &mut ty.interfaces {
        walk_sig(&mut interface.interface, visitor);
        walk_attributes(&mut interface.custom_attributes, visitor);
    }
    walk_generic_params(&mut ty.generic_params, visitor);
    walk_attributes(&mut ty.custom_attributes, visitor);
}

/// Visits the signature, attributes, overrides and body of a method.
pub fn walk_method<V: IdVisitor + ?Sized>(method: &mut MethodDef, visitor: &mut V) {
    for param in &mut method.params {
        walk_sig(&mut param.param_type, visitor);
        walk_attributes(&mut param.custom_attributes, visitor);
    }
    walk_sig(&mut method.ret.return_type, visitor);
    walk_attributes(&mut method.ret.custom_attributes, visitor);
    walk_generic_params(&mut method.generic_params, visitor);
    walk_attributes(&mut method.custom_attributes, visitor);
    for MethodOverride { declaration } in &mut method.overrides {
        walk_method_ref(declaration, visitor);
    }
    if let Some(body) = &mut method.body {
        for instruction in &mut body.instructions {
            if let Operand::Method(target) = &mut instruction.operand {
                walk_method_ref(target, visitor);
            }
        }
        for local in &mut body.locals {
            walk_sig(&mut local.local_type, visitor);
        }
        for handler in &mut body.exception_handlers {
            if let Some(catch_type) = &mut handler.catch_type {
                walk_sig(catch_type, visitor);
            }
        }
    }
}

/// Visits the type and attributes of a field.
pub fn walk_field<V: IdVisitor + ?Sized>(field: &mut FieldDef, visitor: &mut V) {
    walk_sig(&mut field.field_type, visitor);
    walk_attributes(&mut field.custom_attributes, visitor);
}

/// Visits the type and attributes of a property. Accessors are structural.
pub fn walk_property<V: IdVisitor + ?Sized>(property: &mut PropertyDef, visitor: &mut V) {
    walk_sig(&mut property.property_type, visitor);
    walk_attributes(&mut property.custom_attributes, visitor);
}

/// Visits the type and attributes of an event. Accessors are structural.
pub fn walk_event<V: IdVisitor + ?Sized>(event: &mut EventDef, visitor: &mut V) {
    walk_sig(&mut event.event_type, visitor);
    walk_attributes(&mut event.custom_attributes, visitor);
}
