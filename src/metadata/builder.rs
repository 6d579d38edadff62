//! Fluent builders for types and members.
//!
//! Builders collect a definition and attach it to a [`Module`] in `build`, which
//! returns the new id. They fill in the conventional defaults so call sites
//! only state what differs:
//!
//! - types derive from the core library's `System.Object`, `System.ValueType`,
//!   `System.Enum` or `System.MulticastDelegate` according to their kind
//! - constructors get `.ctor` naming and the special-name flags
//!
//! # Examples
//!
//! ```rust
//! use refasm::metadata::{
//!     builder::{FieldBuilder, MethodBuilder, TypeBuilder},
//!     members::MemberAccess,
//!     module::Module,
//!     signatures::TypeSig,
//! };
//!
//! let mut module = Module::new("Sample.dll");
//! let foo = TypeBuilder::class("Sample", "Foo").build(&mut module);
//! FieldBuilder::new("_x", TypeSig::I4)
//!     .access(MemberAccess::Assembly)
//!     .build(&mut module, foo);
//! MethodBuilder::constructor().build(&mut module, foo);
//!
//! assert_eq!(module.ty(foo).fields.len(), 1);
//! assert_eq!(module.instance_constructors(foo).len(), 1);
//! ```

use crate::metadata::{
    customattributes::CustomAttribute,
    generics::GenericParam,
    ids::{EventId, FieldId, MethodId, PropertyId, TypeId},
    members::{EventDef, FieldDef, FieldFlags, MemberAccess, PropertyDef},
    method::{
        ImplMap, Instruction, MethodBody, MethodDef, MethodImplFlags, MethodModifiers,
        MethodOverride, OpCode, Param, ParamFlags, CONSTRUCTOR_NAME,
    },
    module::Module,
    signatures::{MemberRef, MethodRef, MethodSig, TypeSig},
    types::{InterfaceImpl, TypeDef, TypeFlags, TypeKind, TypeVisibility},
};

/// A reference to `namespace.name` in the module's core library.
#[must_use]
pub fn corlib_type(module: &Module, namespace: &str, name: &str) -> TypeSig {
    TypeSig::external(module.corlib.clone(), namespace, name)
}

/// An attribute instance constructed through the parameterless constructor of `attribute_type`.
#[must_use]
pub fn attribute(attribute_type: TypeSig) -> CustomAttribute {
    CustomAttribute::new(MethodRef::Member(MemberRef {
        declaring_type: attribute_type,
        name: CONSTRUCTOR_NAME.to_string(),
        signature: MethodSig::instance_void(),
    }))
}

/// Builder for [`TypeDef`]
pub struct TypeBuilder {
    def: TypeDef,
    base: BaseType,
}

enum BaseType {
    ByKind,
    Explicit(TypeSig),
    None,
}

impl TypeBuilder {
    /// Starts a public type of `kind`.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        let mut def = TypeDef::new(namespace, name);
        def.kind = kind;
        match kind {
            TypeKind::Interface => def.flags |= TypeFlags::ABSTRACT,
            TypeKind::Struct | TypeKind::Enum | TypeKind::Delegate => def.flags |= TypeFlags::SEALED,
            TypeKind::Class => {}
        }
        TypeBuilder {
            def,
            base: BaseType::ByKind,
        }
    }

    /// Starts a public class.
    #[must_use]
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Class)
    }

    /// Starts a public struct.
    #[must_use]
    pub fn value_type(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Struct)
    }

    /// Starts a public interface.
    #[must_use]
    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, TypeKind::Interface)
    }

    /// Starts a nested public class inside `declaring`.
    #[must_use]
    pub fn nested(declaring: TypeId, name: impl Into<String>) -> Self {
        let mut builder = Self::class("", name);
        builder.def.declaring_type = Some(declaring);
        builder.def.visibility = TypeVisibility::NestedPublic;
        builder
    }

    /// Sets the kind.
    #[must_use]
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.def.kind = kind;
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub fn visibility(mut self, visibility: TypeVisibility) -> Self {
        self.def.visibility = visibility;
        self
    }

    /// Adds flags.
    #[must_use]
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.def.flags |= flags;
        self
    }

    /// Sets an explicit base type.
    #[must_use]
    pub fn base(mut self, base: TypeSig) -> Self {
        self.base = BaseType::Explicit(base);
        self
    }

    /// Builds a type without base type.
    #[must_use]
    pub fn no_base(mut self) -> Self {
        self.base = BaseType::None;
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: TypeSig) -> Self {
        self.def.interfaces.push(InterfaceImpl::new(interface));
        self
    }

    /// Adds a generic parameter.
    #[must_use]
    pub fn generic_param(mut self, param: GenericParam) -> Self {
        self.def.generic_params.push(param);
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.def.custom_attributes.push(attribute);
        self
    }

    /// Adds the type to `module`.
    pub fn build(self, module: &mut Module) -> TypeId {
        let mut def = self.def;
        def.base_type = match self.base {
            BaseType::Explicit(base) => Some(base),
            BaseType::None => None,
            BaseType::ByKind => match def.kind {
                TypeKind::Class => Some(corlib_type(module, "System", "Object")),
                TypeKind::Struct => Some(corlib_type(module, "System", "ValueType")),
                TypeKind::Enum => Some(corlib_type(module, "System", "Enum")),
                TypeKind::Delegate => Some(corlib_type(module, "System", "MulticastDelegate")),
                TypeKind::Interface => None,
            },
        };
        module.add_type(def)
    }
}

/// Builder for [`MethodDef`]
pub struct MethodBuilder {
    def: MethodDef,
}

impl MethodBuilder {
    /// Starts a public instance method returning `void`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        MethodBuilder {
            def: MethodDef::new(name, TypeId::new(0)),
        }
    }

    /// Starts a public instance constructor.
    #[must_use]
    pub fn constructor() -> Self {
        Self::new(CONSTRUCTOR_NAME)
            .modifiers(MethodModifiers::SPECIAL_NAME | MethodModifiers::RT_SPECIAL_NAME)
    }

    /// Sets the access.
    #[must_use]
    pub fn access(mut self, access: MemberAccess) -> Self {
        self.def.access = access;
        self
    }

    /// Adds modifiers.
    #[must_use]
    pub fn modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.def.modifiers |= modifiers;
        self
    }

    /// Sets the implementation flags.
    #[must_use]
    pub fn impl_flags(mut self, flags: MethodImplFlags) -> Self {
        self.def.impl_flags = flags;
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, param_type: TypeSig) -> Self {
        self.def.params.push(Param::new(name, param_type));
        self
    }

    /// Adds a parameter with flags.
    #[must_use]
    pub fn param_with_flags(mut self, name: impl Into<String>, param_type: TypeSig, flags: ParamFlags) -> Self {
        let mut param = Param::new(name, param_type);
        param.flags = flags;
        self.def.params.push(param);
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, return_type: TypeSig) -> Self {
        self.def.ret.return_type = return_type;
        self
    }

    /// Adds a generic parameter.
    #[must_use]
    pub fn generic_param(mut self, param: GenericParam) -> Self {
        self.def.generic_params.push(param);
        self
    }

    /// Adds an explicit implementation record.
    #[must_use]
    pub fn overrides(mut self, declaration: MethodRef) -> Self {
        self.def.overrides.push(MethodOverride { declaration });
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, instructions: Vec<Instruction>) -> Self {
        let mut body = MethodBody::new(instructions);
        body.update_offsets();
        self.def.body = Some(body);
        self
    }

    /// Sets a `ret` body.
    #[must_use]
    pub fn ret_body(self) -> Self {
        self.body(vec![Instruction::simple(OpCode::Ret)])
    }

    /// Sets a P/Invoke binding and removes the body.
    #[must_use]
    pub fn pinvoke(mut self, module: impl Into<String>, entry_point: impl Into<String>) -> Self {
        self.def.modifiers |= MethodModifiers::PINVOKE_IMPL | MethodModifiers::STATIC;
        self.def.impl_flags |= MethodImplFlags::PRESERVE_SIG;
        self.def.impl_map = Some(ImplMap {
            module: module.into(),
            entry_point: entry_point.into(),
        });
        self.def.body = None;
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.def.custom_attributes.push(attribute);
        self
    }

    /// Returns the collected definition for `declaring` without adding it.
    #[must_use]
    pub fn into_def(mut self, declaring: TypeId) -> MethodDef {
        self.def.declaring_type = declaring;
        self.def
    }

    /// Appends the method to `declaring`.
    pub fn build(self, module: &mut Module, declaring: TypeId) -> MethodId {
        module.add_method(self.into_def(declaring))
    }
}

/// Builder for [`FieldDef`]
pub struct FieldBuilder {
    def: FieldDef,
}

impl FieldBuilder {
    /// Starts a public instance field.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: TypeSig) -> Self {
        FieldBuilder {
            def: FieldDef {
                name: name.into(),
                access: MemberAccess::Public,
                flags: FieldFlags::empty(),
                field_type,
                declaring_type: TypeId::new(0),
                custom_attributes: Vec::new(),
                removed: false,
            },
        }
    }

    /// Sets the access.
    #[must_use]
    pub fn access(mut self, access: MemberAccess) -> Self {
        self.def.access = access;
        self
    }

    /// Adds flags.
    #[must_use]
    pub fn flags(mut self, flags: FieldFlags) -> Self {
        self.def.flags |= flags;
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.def.custom_attributes.push(attribute);
        self
    }

    /// Returns the collected definition for `declaring` without adding it.
    #[must_use]
    pub fn into_def(mut self, declaring: TypeId) -> FieldDef {
        self.def.declaring_type = declaring;
        self.def
    }

    /// Appends the field to `declaring`.
    pub fn build(self, module: &mut Module, declaring: TypeId) -> FieldId {
        module.add_field(self.into_def(declaring))
    }
}

/// Builder for [`PropertyDef`]
pub struct PropertyBuilder {
    def: PropertyDef,
}

impl PropertyBuilder {
    /// Starts a property without accessors.
    #[must_use]
    pub fn new(name: impl Into<String>, property_type: TypeSig) -> Self {
        PropertyBuilder {
            def: PropertyDef {
                name: name.into(),
                property_type,
                getter: None,
                setter: None,
                others: Vec::new(),
                declaring_type: TypeId::new(0),
                custom_attributes: Vec::new(),
                removed: false,
            },
        }
    }

    /// Sets the getter.
    #[must_use]
    pub fn getter(mut self, method: MethodId) -> Self {
        self.def.getter = Some(method);
        self
    }

    /// Sets the setter.
    #[must_use]
    pub fn setter(mut self, method: MethodId) -> Self {
        self.def.setter = Some(method);
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.def.custom_attributes.push(attribute);
        self
    }

    /// Appends the property to `declaring`.
    pub fn build(mut self, module: &mut Module, declaring: TypeId) -> PropertyId {
        self.def.declaring_type = declaring;
        module.add_property(self.def)
    }
}

/// Builder for [`EventDef`]
pub struct EventBuilder {
    def: EventDef,
}

impl EventBuilder {
    /// Starts an event without accessors.
    #[must_use]
    pub fn new(name: impl Into<String>, event_type: TypeSig) -> Self {
        EventBuilder {
            def: EventDef {
                name: name.into(),
                event_type,
                add: None,
                remove: None,
                raise: None,
                others: Vec::new(),
                declaring_type: TypeId::new(0),
                custom_attributes: Vec::new(),
                removed: false,
            },
        }
    }

    /// Sets the add and remove accessors.
    #[must_use]
    pub fn accessors(mut self, add: MethodId, remove: MethodId) -> Self {
        self.def.add = Some(add);
        self.def.remove = Some(remove);
        self
    }

    /// Appends the event to `declaring`.
    pub fn build(mut self, module: &mut Module, declaring: TypeId) -> EventId {
        self.def.declaring_type = declaring;
        module.add_event(self.def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_by_kind() {
        let mut module = Module::new("m.dll");
        let class = TypeBuilder::class("N", "C").build(&mut module);
        let value = TypeBuilder::value_type("N", "S").build(&mut module);
        let iface = TypeBuilder::interface("N", "I").build(&mut module);
        let root = TypeBuilder::class("System", "Object").no_base().build(&mut module);

        assert!(module.is_root_object(module.ty(class).base_type.as_ref().unwrap_or(&TypeSig::Void)));
        assert_eq!(
            module.ty(value).base_type,
            Some(TypeSig::external("System.Runtime", "System", "ValueType"))
        );
        assert!(module.ty(value).is_value_type());
        assert_eq!(module.ty(iface).base_type, None);
        assert_eq!(module.ty(root).base_type, None);
    }

    #[test]
    fn test_nested_builder_attaches_to_declaring() {
        let mut module = Module::new("m.dll");
        let outer = TypeBuilder::class("N", "Outer").build(&mut module);
        let inner = TypeBuilder::nested(outer, "Inner").build(&mut module);
        assert_eq!(module.ty(outer).nested_types, vec![inner]);
        assert!(!module.types.contains(&inner));
    }

    #[test]
    fn test_pinvoke_method() {
        let mut module = Module::new("m.dll");
        let ty = TypeBuilder::class("N", "Native").build(&mut module);
        let id = MethodBuilder::new("Beep").pinvoke("kernel32", "Beep").build(&mut module, ty);
        let method = module.method(id);
        assert!(method.impl_map.is_some());
        assert!(method.body.is_none());
        assert!(method.is_static());
    }
}
