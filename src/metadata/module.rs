//! The module arena.
//!
//! [`Module`] owns every entity of a loaded module in per-kind vectors and exposes
//! navigation, mutation and liveness queries over them. Ids handed out by one
//! module index only into that module; [`Module::validate`] checks that every id
//! reachable from the graph is in range, which codecs run after loading so that
//! the indexing accessors ([`Module::ty`], [`Module::method`], ...) cannot panic on
//! a graph that passed validation.
//!
//! # Removal and liveness
//!
//! Removing an entity detaches its id from the owner's list and sets the arena
//! slot's `removed` flag. Ids never shift while pruning, so signatures that still
//! mention a removed type can be detected with [`Module::is_type_live`]:
//!
//! - a type is live iff neither it nor any type on its declaring chain was removed
//! - a member is live iff it was not removed and its declaring type is live
//!
//! Writers serialize [`Module::compact`] instead of the module itself, which drops
//! the tombstones and renumbers the survivors.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    metadata::{
        customattributes::{AttributeOwner, CustomAttribute},
        generics::{GenericParam, GenericParamOwner},
        ids::{EventId, FieldId, MethodId, PropertyId, TypeId},
        members::{EventDef, FieldDef, PropertyDef},
        method::{MethodDef, MethodOverride},
        refs::{walk_attributes, walk_event, walk_field, walk_method, walk_property, walk_type, IdVisitor},
        signatures::{MethodRef, MethodSig, TypeSig},
        types::{TypeDef, TypeVisibility},
    },
    Result,
};

/// Name of the synthetic type holding module-level members
pub const GLOBAL_TYPE_NAME: &str = "<Module>";
/// Core library scope used when none is specified
pub const DEFAULT_CORLIB: &str = "System.Runtime";

bitflags! {
    /// Runtime flags of the module header
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ModuleFlags: u32 {
        /// Module contains only IL code
        const IL_ONLY = 0x0000_0001;
        /// Module requires a 32-bit process
        const REQUIRED_32BIT = 0x0000_0002;
        /// Module is an IL library
        const IL_LIBRARY = 0x0000_0004;
        /// Module image is strong-name signed
        const STRONG_NAME_SIGNED = 0x0000_0008;
        /// Entry point is native code
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// Runtime should track debug data
        const TRACK_DEBUG_DATA = 0x0001_0000;
        /// Module prefers running as a 32-bit process
        const PREFER_32BIT = 0x0002_0000;
    }
}

/// Four-part assembly version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AssemblyVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.build, self.revision)
    }
}

/// The assembly manifest of a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyDef {
    /// Assembly name
    pub name: String,
    /// Assembly version
    pub version: AssemblyVersion,
    /// Culture, empty for neutral
    #[serde(default)]
    pub culture: String,
    /// Strong-name public key
    pub public_key: Option<Vec<u8>>,
    /// Assembly-level attributes
    pub custom_attributes: Vec<CustomAttribute>,
}

impl AssemblyDef {
    /// Creates an unsigned, culture-neutral assembly with version 1.0.0.0.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        AssemblyDef {
            name: name.into(),
            version: AssemblyVersion {
                major: 1,
                ..AssemblyVersion::default()
            },
            culture: String::new(),
            public_key: None,
            custom_attributes: Vec::new(),
        }
    }
}

/// An embedded manifest resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource name
    pub name: String,
    /// Public or private visibility
    pub public: bool,
    /// Raw contents
    pub data: Vec<u8>,
}

/// A loaded managed module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module name, usually the file name
    pub name: String,
    /// Core library scope used for synthesized references
    pub corlib: String,
    /// Header flags
    pub flags: ModuleFlags,
    /// Assembly manifest, absent for netmodules
    pub assembly: Option<AssemblyDef>,
    /// Module-level attributes
    pub custom_attributes: Vec<CustomAttribute>,
    /// Top-level types in declaration order, the global type included
    pub types: Vec<TypeId>,
    /// The `<Module>` type
    pub global_type: TypeId,
    /// Managed entry point
    pub entry_point: Option<MethodId>,
    /// Embedded resources
    pub resources: Vec<Resource>,
    type_arena: Vec<TypeDef>,
    method_arena: Vec<MethodDef>,
    field_arena: Vec<FieldDef>,
    property_arena: Vec<PropertyDef>,
    event_arena: Vec<EventDef>,
}

impl Module {
    /// Creates an empty IL-only module holding only the `<Module>` type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut global = TypeDef::new("", GLOBAL_TYPE_NAME);
        global.visibility = TypeVisibility::NotPublic;

        Module {
            name: name.into(),
            corlib: DEFAULT_CORLIB.to_string(),
            flags: ModuleFlags::IL_ONLY,
            assembly: None,
            custom_attributes: Vec::new(),
            types: vec![TypeId::new(0)],
            global_type: TypeId::new(0),
            entry_point: None,
            resources: Vec::new(),
            type_arena: vec![global],
            method_arena: Vec::new(),
            field_arena: Vec::new(),
            property_arena: Vec::new(),
            event_arena: Vec::new(),
        }
    }

    // Arena access

    /// Returns the type with `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    #[must_use]
    pub fn ty(&self, id: TypeId) -> &TypeDef {
        &self.type_arena[id.index()]
    }

    /// Mutable variant of [`Module::ty`].
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    pub fn ty_mut(&mut self, id: TypeId) -> &mut TypeDef {
        &mut self.type_arena[id.index()]
    }

    /// Returns the method with `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.method_arena[id.index()]
    }

    /// Mutable variant of [`Module::method`].
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDef {
        &mut self.method_arena[id.index()]
    }

    /// Returns the field with `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.field_arena[id.index()]
    }

    /// Mutable variant of [`Module::field`].
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    pub fn field_mut(&mut self, id: FieldId) -> &mut FieldDef {
        &mut self.field_arena[id.index()]
    }

    /// Returns the property with `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    #[must_use]
    pub fn property(&self, id: PropertyId) -> &PropertyDef {
        &self.property_arena[id.index()]
    }

    /// Mutable variant of [`Module::property`].
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    pub fn property_mut(&mut self, id: PropertyId) -> &mut PropertyDef {
        &mut self.property_arena[id.index()]
    }

    /// Returns the event with `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    #[must_use]
    pub fn event(&self, id: EventId) -> &EventDef {
        &self.event_arena[id.index()]
    }

    /// Mutable variant of [`Module::event`].
    ///
    /// # Panics
    ///
    /// Panics if `id` was not minted by this module.
    pub fn event_mut(&mut self, id: EventId) -> &mut EventDef {
        &mut self.event_arena[id.index()]
    }

    /// Returns the type with `id`, or `None` if the id is out of range.
    #[must_use]
    pub fn get_type(&self, id: TypeId) -> Option<&TypeDef> {
        self.type_arena.get(id.index())
    }

    /// Returns the method with `id`, or `None` if the id is out of range.
    #[must_use]
    pub fn get_method(&self, id: MethodId) -> Option<&MethodDef> {
        self.method_arena.get(id.index())
    }

    /// Number of type slots, removed ones included.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.type_arena.len()
    }

    /// Number of method slots, removed ones included.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.method_arena.len()
    }

    /// Ids of every live type, top-level and nested, in depth-first declaration order.
    #[must_use]
    pub fn all_types(&self) -> Vec<TypeId> {
        let mut out = Vec::new();
        let mut stack: Vec<TypeId> = self.types.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.ty(id).nested_types.iter().rev().copied());
        }
        out
    }

    // Insertion

    /// Adds a type and attaches it to its declaring type, or to the module when top-level.
    pub fn add_type(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId::new(self.type_arena.len() as u32);
        let owner = def.declaring_type;
        self.type_arena.push(def);
        match owner {
            Some(parent) => self.ty_mut(parent).nested_types.push(id),
            None => self.types.push(id),
        }
        id
    }

    /// Adds a method at the end of its declaring type's list.
    pub fn add_method(&mut self, def: MethodDef) -> MethodId {
        let index = self.ty(def.declaring_type).methods.len();
        self.insert_method(index, def)
    }

    /// Adds a method at `index` of its declaring type's list.
    pub fn insert_method(&mut self, index: usize, def: MethodDef) -> MethodId {
        let id = MethodId::new(self.method_arena.len() as u32);
        let owner = def.declaring_type;
        self.method_arena.push(def);
        let methods = &mut self.ty_mut(owner).methods;
        methods.insert(index.min(methods.len()), id);
        id
    }

    /// Adds a field at the end of its declaring type's list.
    pub fn add_field(&mut self, def: FieldDef) -> FieldId {
        let index = self.ty(def.declaring_type).fields.len();
        self.insert_field(index, def)
    }

    /// Adds a field at `index` of its declaring type's list.
    pub fn insert_field(&mut self, index: usize, def: FieldDef) -> FieldId {
        let id = FieldId::new(self.field_arena.len() as u32);
        let owner = def.declaring_type;
        self.field_arena.push(def);
        let fields = &mut self.ty_mut(owner).fields;
        fields.insert(index.min(fields.len()), id);
        id
    }

    /// Adds a property to its declaring type.
    pub fn add_property(&mut self, def: PropertyDef) -> PropertyId {
        let id = PropertyId::new(self.property_arena.len() as u32);
        let owner = def.declaring_type;
        self.property_arena.push(def);
        self.ty_mut(owner).properties.push(id);
        id
    }

    /// Adds an event to its declaring type.
    pub fn add_event(&mut self, def: EventDef) -> EventId {
        let id = EventId::new(self.event_arena.len() as u32);
        let owner = def.declaring_type;
        self.event_arena.push(def);
        self.ty_mut(owner).events.push(id);
        id
    }

    // Removal

    /// Detaches a type from its owner and tombstones it.
    ///
    /// Members and nested types are left in place; they stop being live because
    /// their declaring chain is no longer live.
    pub fn remove_type(&mut self, id: TypeId) {
        match self.ty(id).declaring_type {
            Some(parent) => self.ty_mut(parent).nested_types.retain(|t| *t != id),
            None => self.types.retain(|t| *t != id),
        }
        self.ty_mut(id).removed = true;
    }

    /// Detaches a method from its declaring type and tombstones it.
    pub fn remove_method(&mut self, id: MethodId) {
        let owner = self.method(id).declaring_type;
        self.ty_mut(owner).methods.retain(|m| *m != id);
        self.method_mut(id).removed = true;
    }

    /// Detaches a field from its declaring type and tombstones it.
    pub fn remove_field(&mut self, id: FieldId) {
        let owner = self.field(id).declaring_type;
        self.ty_mut(owner).fields.retain(|f| *f != id);
        self.field_mut(id).removed = true;
    }

    /// Detaches a property from its declaring type and tombstones it.
    pub fn remove_property(&mut self, id: PropertyId) {
        let owner = self.property(id).declaring_type;
        self.ty_mut(owner).properties.retain(|p| *p != id);
        self.property_mut(id).removed = true;
    }

    /// Detaches an event from its declaring type and tombstones it.
    pub fn remove_event(&mut self, id: EventId) {
        let owner = self.event(id).declaring_type;
        self.ty_mut(owner).events.retain(|e| *e != id);
        self.event_mut(id).removed = true;
    }

    /// Empties a type in place, tombstoning every member and nested type.
    ///
    /// Used for the global type, which must never be removed.
    pub fn clear_type(&mut self, id: TypeId) {
        let ty = self.ty_mut(id);
        ty.custom_attributes.clear();
        ty.generic_params.clear();
        ty.interfaces.clear();
        let methods = std::mem::take(&mut ty.methods);
        let fields = std::mem::take(&mut ty.fields);
        let properties = std::mem::take(&mut ty.properties);
        let events = std::mem::take(&mut ty.events);
        let nested = std::mem::take(&mut ty.nested_types);

        for m in methods {
            self.method_mut(m).removed = true;
        }
        for f in fields {
            self.field_mut(f).removed = true;
        }
        for p in properties {
            self.property_mut(p).removed = true;
        }
        for e in events {
            self.event_mut(e).removed = true;
        }
        for t in nested {
            self.ty_mut(t).removed = true;
        }
    }

    // Liveness

    /// True if neither the type nor any type on its declaring chain was removed.
    ///
    /// A cyclic declaring chain, which [`Module::validate`] rejects, counts as not live.
    #[must_use]
    pub fn is_type_live(&self, id: TypeId) -> bool {
        let mut current = id;
        for _ in 0..=self.type_arena.len() {
            let Some(ty) = self.get_type(current) else {
                return false;
            };
            if ty.removed {
                return false;
            }
            match ty.declaring_type {
                Some(parent) => current = parent,
                None => return true,
            }
        }
        false
    }

    /// True if the method was not removed and its declaring type is live.
    #[must_use]
    pub fn is_method_live(&self, id: MethodId) -> bool {
        self.get_method(id)
            .is_some_and(|m| !m.removed && self.is_type_live(m.declaring_type))
    }

    /// True if the field was not removed and its declaring type is live.
    #[must_use]
    pub fn is_field_live(&self, id: FieldId) -> bool {
        self.field_arena
            .get(id.index())
            .is_some_and(|f| !f.removed && self.is_type_live(f.declaring_type))
    }

    /// True if the property was not removed and its declaring type is live.
    #[must_use]
    pub fn is_property_live(&self, id: PropertyId) -> bool {
        self.property_arena
            .get(id.index())
            .is_some_and(|p| !p.removed && self.is_type_live(p.declaring_type))
    }

    /// True if the event was not removed and its declaring type is live.
    #[must_use]
    pub fn is_event_live(&self, id: EventId) -> bool {
        self.event_arena
            .get(id.index())
            .is_some_and(|e| !e.removed && self.is_type_live(e.declaring_type))
    }

    // Names and lookups

    /// Full name of a type; nested types are joined to their declaring type with `/`.
    #[must_use]
    pub fn type_full_name(&self, id: TypeId) -> String {
        let mut names = Vec::new();
        let mut current = self.ty(id);
        while let Some(parent) = current.declaring_type {
            // cyclic chains are cut at the arena length
            if names.len() > self.type_arena.len() {
                break;
            }
            names.push(current.name.as_str());
            current = self.ty(parent);
        }
        let outer = if current.namespace.is_empty() {
            current.name.clone()
        } else {
            format!("{}.{}", current.namespace, current.name)
        };
        names.iter().rev().fold(outer, |full, name| format!("{full}/{name}"))
    }

    /// `DeclaringType::Name` of a method, for diagnostics.
    #[must_use]
    pub fn method_full_name(&self, id: MethodId) -> String {
        let method = self.method(id);
        format!("{}::{}", self.type_full_name(method.declaring_type), method.name)
    }

    /// Full name of the type a signature names, looking through generic instantiations.
    #[must_use]
    pub fn sig_full_name(&self, sig: &TypeSig) -> Option<String> {
        match sig.strip_modifiers() {
            TypeSig::Def(id) => Some(self.type_full_name(*id)),
            TypeSig::Ref(r) => Some(r.full_name()),
            TypeSig::GenericInst(definition, _) => self.sig_full_name(definition),
            TypeSig::Object => Some("System.Object".to_string()),
            TypeSig::String => Some("System.String".to_string()),
            _ => None,
        }
    }

    /// Finds a live type by full name, nested types included (`Outer/Inner`).
    #[must_use]
    pub fn find_type(&self, full_name: &str) -> Option<TypeId> {
        self.all_types()
            .into_iter()
            .find(|id| self.type_full_name(*id) == full_name)
    }

    /// Finds a live method of `ty` by name.
    #[must_use]
    pub fn find_method(&self, ty: TypeId, name: &str) -> Option<MethodId> {
        self.ty(ty)
            .methods
            .iter()
            .copied()
            .find(|m| self.method(*m).name == name)
    }

    /// True for the root object type, whether as element type or as a reference.
    #[must_use]
    pub fn is_root_object(&self, sig: &TypeSig) -> bool {
        match sig.strip_modifiers() {
            TypeSig::Object => true,
            TypeSig::Ref(r) => r.namespace == "System" && r.name == "Object",
            _ => false,
        }
    }

    /// Signature equality that treats both spellings of the root object type as equal.
    #[must_use]
    pub fn same_type(&self, a: &TypeSig, b: &TypeSig) -> bool {
        let (a, b) = (a.strip_modifiers(), b.strip_modifiers());
        a == b || (self.is_root_object(a) && self.is_root_object(b))
    }

    /// True if the type a signature names is a local value type.
    #[must_use]
    pub fn is_local_value_type(&self, sig: &TypeSig) -> bool {
        matches!(sig.strip_modifiers(), TypeSig::Def(id) if self.ty(*id).is_value_type())
    }

    /// Live instance constructors of a type, in declaration order.
    #[must_use]
    pub fn instance_constructors(&self, id: TypeId) -> Vec<MethodId> {
        self.ty(id)
            .methods
            .iter()
            .copied()
            .filter(|m| self.method(*m).is_instance_constructor())
            .collect()
    }

    /// The designated default constructor: the first instance constructor whose
    /// parameters are all optional, parameterless ones included.
    #[must_use]
    pub fn default_constructor(&self, id: TypeId) -> Option<MethodId> {
        self.instance_constructors(id)
            .into_iter()
            .find(|m| self.method(*m).all_params_optional())
    }

    /// The first instance constructor without parameters.
    #[must_use]
    pub fn parameterless_constructor(&self, id: TypeId) -> Option<MethodId> {
        self.instance_constructors(id)
            .into_iter()
            .find(|m| self.method(*m).params.is_empty())
    }

    // Method references

    /// Declaring type of a method reference.
    #[must_use]
    pub fn method_ref_declaring_type(&self, method: &MethodRef) -> TypeSig {
        match method {
            MethodRef::Def(id) => TypeSig::Def(self.method(*id).declaring_type),
            MethodRef::Member(member) => member.declaring_type.clone(),
        }
    }

    /// Name of the referenced method.
    #[must_use]
    pub fn method_ref_name<'a>(&'a self, method: &'a MethodRef) -> &'a str {
        match method {
            MethodRef::Def(id) => &self.method(*id).name,
            MethodRef::Member(member) => &member.name,
        }
    }

    /// Signature of the referenced method.
    #[must_use]
    pub fn method_ref_signature(&self, method: &MethodRef) -> MethodSig {
        match method {
            MethodRef::Def(id) => self.method(*id).signature(),
            MethodRef::Member(member) => member.signature.clone(),
        }
    }

    /// The attribute type of an attribute instance.
    #[must_use]
    pub fn attribute_type(&self, attribute: &CustomAttribute) -> TypeSig {
        self.method_ref_declaring_type(&attribute.constructor)
    }

    /// True if `attributes` holds an instance of the attribute type `full_name`.
    #[must_use]
    pub fn is_defined(&self, attributes: &[CustomAttribute], full_name: &str) -> bool {
        attributes.iter().any(|attr| {
            self.sig_full_name(&self.attribute_type(attr))
                .is_some_and(|name| name == full_name)
        })
    }

    // Attribute lists and generic parameters

    /// The attribute list of `owner`, `None` when the owner does not exist.
    #[must_use]
    pub fn attributes(&self, owner: AttributeOwner) -> Option<&Vec<CustomAttribute>> {
        Some(match owner {
            AttributeOwner::Assembly => &self.assembly.as_ref()?.custom_attributes,
            AttributeOwner::Module => &self.custom_attributes,
            AttributeOwner::Type(id) => &self.get_type(id)?.custom_attributes,
            AttributeOwner::InterfaceImpl(id, index) => {
                &self.get_type(id)?.interfaces.get(index)?.custom_attributes
            }
            AttributeOwner::Method(id) => &self.get_method(id)?.custom_attributes,
            AttributeOwner::Param(id, index) => {
                &self.get_method(id)?.params.get(index)?.custom_attributes
            }
            AttributeOwner::Return(id) => &self.get_method(id)?.ret.custom_attributes,
            AttributeOwner::GenericParam(gp_owner, index) => {
                &self.generic_params(gp_owner)?.get(index)?.custom_attributes
            }
            AttributeOwner::GenericParamConstraint(gp_owner, index, constraint) => {
                &self
                    .generic_params(gp_owner)?
                    .get(index)?
                    .constraints
                    .get(constraint)?
                    .custom_attributes
            }
            AttributeOwner::Field(id) => &self.field_arena.get(id.index())?.custom_attributes,
            AttributeOwner::Property(id) => &self.property_arena.get(id.index())?.custom_attributes,
            AttributeOwner::Event(id) => &self.event_arena.get(id.index())?.custom_attributes,
        })
    }

    /// Mutable variant of [`Module::attributes`].
    pub fn attributes_mut(&mut self, owner: AttributeOwner) -> Option<&mut Vec<CustomAttribute>> {
        Some(match owner {
            AttributeOwner::Assembly => &mut self.assembly.as_mut()?.custom_attributes,
            AttributeOwner::Module => &mut self.custom_attributes,
            AttributeOwner::Type(id) => &mut self.type_arena.get_mut(id.index())?.custom_attributes,
            AttributeOwner::InterfaceImpl(id, index) => {
                &mut self
                    .type_arena
                    .get_mut(id.index())?
                    .interfaces
                    .get_mut(index)?
                    .custom_attributes
            }
            AttributeOwner::Method(id) => {
                &mut self.method_arena.get_mut(id.index())?.custom_attributes
            }
            AttributeOwner::Param(id, index) => {
                &mut self
                    .method_arena
                    .get_mut(id.index())?
                    .params
                    .get_mut(index)?
                    .custom_attributes
            }
            AttributeOwner::Return(id) => {
                &mut self.method_arena.get_mut(id.index())?.ret.custom_attributes
            }
            AttributeOwner::GenericParam(gp_owner, index) => {
                &mut self
                    .generic_params_mut(gp_owner)?
                    .get_mut(index)?
                    .custom_attributes
            }
            AttributeOwner::GenericParamConstraint(gp_owner, index, constraint) => {
                &mut self
                    .generic_params_mut(gp_owner)?
                    .get_mut(index)?
                    .constraints
                    .get_mut(constraint)?
                    .custom_attributes
            }
            AttributeOwner::Field(id) => &mut self.field_arena.get_mut(id.index())?.custom_attributes,
            AttributeOwner::Property(id) => {
                &mut self.property_arena.get_mut(id.index())?.custom_attributes
            }
            AttributeOwner::Event(id) => &mut self.event_arena.get_mut(id.index())?.custom_attributes,
        })
    }

    /// The generic parameter list of a type or method.
    #[must_use]
    pub fn generic_params(&self, owner: GenericParamOwner) -> Option<&Vec<GenericParam>> {
        match owner {
            GenericParamOwner::Type(id) => self.get_type(id).map(|t| &t.generic_params),
            GenericParamOwner::Method(id) => self.get_method(id).map(|m| &m.generic_params),
        }
    }

    /// Mutable variant of [`Module::generic_params`].
    pub fn generic_params_mut(&mut self, owner: GenericParamOwner) -> Option<&mut Vec<GenericParam>> {
        match owner {
            GenericParamOwner::Type(id) => self.type_arena.get_mut(id.index()).map(|t| &mut t.generic_params),
            GenericParamOwner::Method(id) => {
                self.method_arena.get_mut(id.index()).map(|m| &mut m.generic_params)
            }
        }
    }

    // Compaction

    /// Copies the live part of the module into fresh arenas with dense ids.
    ///
    /// Tombstoned entities are left behind, so nothing that was pruned reaches a
    /// writer. Relative order is preserved in every arena and owner list.
    ///
    /// A removed type or method that a live entity still references (possible only
    /// after a violation was accepted under [`crate::config::ViolationPolicy::Warn`])
    /// is carried over as an empty declaration: its name and signature survive, its
    /// members, attributes and body do not. Such entities are listed in
    /// [`Compaction::retained`] and appended to their owner's list.
    #[must_use]
    pub fn compact(&self) -> Compaction {
        let mut marker = Marker::new(self);
        marker.keep_type(self.global_type);
        for id in &self.types {
            marker.keep_type(*id);
        }
        if let Some(entry) = self.entry_point {
            marker.keep_method(entry);
        }
        let mut custom_attributes = self.custom_attributes.clone();
        walk_attributes(&mut custom_attributes, &mut marker);
        let mut assembly = self.assembly.clone();
        if let Some(assembly) = assembly.as_mut() {
            walk_attributes(&mut assembly.custom_attributes, &mut marker);
        }
        marker.drain();

        let Marker {
            types,
            methods,
            fields,
            properties,
            events,
            retained,
            ..
        } = marker;
        let mut remap = Remap {
            types: dense_ids(&types, TypeId::new),
            methods: dense_ids(&methods, MethodId::new),
            fields: dense_ids(&fields, FieldId::new),
            properties: dense_ids(&properties, PropertyId::new),
            events: dense_ids(&events, EventId::new),
        };

        let mut type_arena = Vec::new();
        let mut shell_types = Vec::new();
        for (index, def) in types.into_iter().enumerate() {
            let Some(mut def) = def else { continue };
            if !self.is_type_live(TypeId::new(index as u32)) {
                shell_types.push((type_arena.len(), def.declaring_type));
            }
            def.declaring_type = def.declaring_type.and_then(|t| remap.ty(t));
            def.nested_types = def.nested_types.iter().filter_map(|t| remap.ty(*t)).collect();
            def.methods = def.methods.iter().filter_map(|m| remap.method(*m)).collect();
            def.fields = def.fields.iter().filter_map(|f| remap.field(*f)).collect();
            def.properties = def.properties.iter().filter_map(|p| remap.property(*p)).collect();
            def.events = def.events.iter().filter_map(|e| remap.event(*e)).collect();
            walk_type(&mut def, &mut remap);
            type_arena.push(def);
        }

        let mut top_level: Vec<TypeId> = self.types.iter().filter_map(|t| remap.ty(*t)).collect();
        for (index, old_parent) in shell_types {
            let id = TypeId::new(index as u32);
            let list = match old_parent.and_then(|p| remap.ty(p)) {
                Some(parent) => &mut type_arena[parent.index()].nested_types,
                None => &mut top_level,
            };
            if !list.contains(&id) {
                list.push(id);
            }
        }

        let mut method_arena = Vec::new();
        for (index, def) in methods.into_iter().enumerate() {
            let Some(mut def) = def else { continue };
            let id = MethodId::new(method_arena.len() as u32);
            if let Some(owner) = remap.ty(def.declaring_type) {
                def.declaring_type = owner;
                if !self.is_method_live(MethodId::new(index as u32)) {
                    type_arena[owner.index()].methods.push(id);
                }
            }
            walk_method(&mut def, &mut remap);
            method_arena.push(def);
        }

        let mut field_arena = Vec::new();
        for mut def in fields.into_iter().flatten() {
            if let Some(owner) = remap.ty(def.declaring_type) {
                def.declaring_type = owner;
            }
            walk_field(&mut def, &mut remap);
            field_arena.push(def);
        }
        let mut property_arena = Vec::new();
        for mut def in properties.into_iter().flatten() {
            if let Some(owner) = remap.ty(def.declaring_type) {
                def.declaring_type = owner;
            }
            def.getter = def.getter.and_then(|m| remap.method(m));
            def.setter = def.setter.and_then(|m| remap.method(m));
            def.others = def.others.iter().filter_map(|m| remap.method(*m)).collect();
            walk_property(&mut def, &mut remap);
            property_arena.push(def);
        }
        let mut event_arena = Vec::new();
        for mut def in events.into_iter().flatten() {
            if let Some(owner) = remap.ty(def.declaring_type) {
                def.declaring_type = owner;
            }
            def.add = def.add.and_then(|m| remap.method(m));
            def.remove = def.remove.and_then(|m| remap.method(m));
            def.raise = def.raise.and_then(|m| remap.method(m));
            def.others = def.others.iter().filter_map(|m| remap.method(*m)).collect();
            walk_event(&mut def, &mut remap);
            event_arena.push(def);
        }

        walk_attributes(&mut custom_attributes, &mut remap);
        if let Some(assembly) = assembly.as_mut() {
            walk_attributes(&mut assembly.custom_attributes, &mut remap);
        }

        let module = Module {
            name: self.name.clone(),
            corlib: self.corlib.clone(),
            flags: self.flags,
            assembly,
            custom_attributes,
            types: top_level,
            global_type: remap.ty(self.global_type).unwrap_or(self.global_type),
            entry_point: self.entry_point.and_then(|m| remap.method(m)),
            resources: self.resources.clone(),
            type_arena,
            method_arena,
            field_arena,
            property_arena,
            event_arena,
        };
        Compaction { module, retained }
    }

    // Validation

    /// Checks that every id reachable from the graph refers to an existing arena slot,
    /// that owner lists agree with the entities' declaring types and that no
    /// declaring chain loops back on itself.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        let checker = IdChecker { module: self };

        if self.get_type(self.global_type).is_none() {
            return Err(malformed_error!("global type {} does not exist", self.global_type));
        }
        if let Some(entry) = self.entry_point {
            checker.method(entry)?;
        }
        for id in &self.types {
            checker.ty(*id)?;
            if self.ty(*id).declaring_type.is_some() {
                return Err(malformed_error!("nested type {} listed at top level", id));
            }
        }
        checker.attributes(&self.custom_attributes)?;
        if let Some(assembly) = &self.assembly {
            checker.attributes(&assembly.custom_attributes)?;
        }

        for (index, ty) in self.type_arena.iter().enumerate() {
            let id = TypeId::new(index as u32);
            if let Some(parent) = ty.declaring_type {
                checker.ty(parent)?;
                if !ty.removed && !self.ty(parent).nested_types.contains(&id) && !self.ty(parent).removed {
                    return Err(malformed_error!("{} is not listed by its declaring type {}", id, parent));
                }
            }
            if let Some(base) = &ty.base_type {
                checker.sig(base)?;
            }
            for interface in &ty.interfaces {
                checker.sig(&interface.interface)?;
                checker.attributes(&interface.custom_attributes)?;
            }
            checker.generic_params(&ty.generic_params)?;
            checker.attributes(&ty.custom_attributes)?;

            for nested in &ty.nested_types {
                if checker.ty(*nested)?.declaring_type != Some(id) {
                    return Err(malformed_error!("{} lists {} which it does not declare", id, nested));
                }
            }
            for m in &ty.methods {
                if checker.method(*m)?.declaring_type != id {
                    return Err(malformed_error!("{} lists {} which it does not declare", id, m));
                }
            }
            for f in &ty.fields {
                match self.field_arena.get(f.index()) {
                    Some(field) if field.declaring_type == id => {}
                    _ => return Err(malformed_error!("{} lists invalid {}", id, f)),
                }
            }
            for p in &ty.properties {
                match self.property_arena.get(p.index()) {
                    Some(property) if property.declaring_type == id => {}
                    _ => return Err(malformed_error!("{} lists invalid {}", id, p)),
                }
            }
            for e in &ty.events {
                match self.event_arena.get(e.index()) {
                    Some(event) if event.declaring_type == id => {}
                    _ => return Err(malformed_error!("{} lists invalid {}", id, e)),
                }
            }
        }

        // A declaring chain longer than the arena revisits a type.
        for index in 0..self.type_arena.len() {
            let id = TypeId::new(index as u32);
            let mut current = self.type_arena[index].declaring_type;
            let mut depth = 0;
            while let Some(parent) = current {
                depth += 1;
                if depth > self.type_arena.len() {
                    return Err(malformed_error!("declaring chain of {} is cyclic", id));
                }
                current = checker.ty(parent)?.declaring_type;
            }
        }

        for method in &self.method_arena {
            checker.ty(method.declaring_type)?;
            for sig in method.signature_types() {
                checker.sig(sig)?;
            }
            for param in &method.params {
                checker.attributes(&param.custom_attributes)?;
            }
            checker.attributes(&method.ret.custom_attributes)?;
            checker.attributes(&method.custom_attributes)?;
            checker.generic_params(&method.generic_params)?;
            for MethodOverride { declaration } in &method.overrides {
                checker.method_ref(declaration)?;
            }
            if let Some(body) = &method.body {
                for instruction in &body.instructions {
                    if let Some(target) = instruction.method_operand() {
                        checker.method_ref(target)?;
                    }
                }
            }
        }
        for field in &self.field_arena {
            checker.ty(field.declaring_type)?;
            checker.sig(&field.field_type)?;
            checker.attributes(&field.custom_attributes)?;
        }
        for property in &self.property_arena {
            checker.ty(property.declaring_type)?;
            checker.sig(&property.property_type)?;
            checker.attributes(&property.custom_attributes)?;
            for accessor in property.getter.iter().chain(&property.setter).chain(&property.others) {
                checker.method(*accessor)?;
            }
        }
        for event in &self.event_arena {
            checker.ty(event.declaring_type)?;
            checker.sig(&event.event_type)?;
            checker.attributes(&event.custom_attributes)?;
            for accessor in event
                .add
                .iter()
                .chain(&event.remove)
                .chain(&event.raise)
                .chain(&event.others)
            {
                checker.method(*accessor)?;
            }
        }
        Ok(())
    }
}

/// Outcome of [`Module::compact`]
#[derive(Debug, Clone, PartialEq)]
pub struct Compaction {
    /// The live part of the module, ids renumbered densely
    pub module: Module,
    /// Full names of removed types and methods kept as empty declarations
    /// because live entities still reference them
    pub retained: Vec<String>,
}

/// Collects what survives compaction: every listed entity, and whatever kept
/// entities refer to.
struct Marker<'a> {
    module: &'a Module,
    types: Vec<Option<TypeDef>>,
    methods: Vec<Option<MethodDef>>,
    fields: Vec<Option<FieldDef>>,
    properties: Vec<Option<PropertyDef>>,
    events: Vec<Option<EventDef>>,
    pending_types: Vec<TypeId>,
    pending_methods: Vec<MethodId>,
    retained: Vec<String>,
}

impl<'a> Marker<'a> {
    fn new(module: &'a Module) -> Self {
        Marker {
            module,
            types: vec![None; module.type_arena.len()],
            methods: vec![None; module.method_arena.len()],
            fields: vec![None; module.field_arena.len()],
            properties: vec![None; module.property_arena.len()],
            events: vec![None; module.event_arena.len()],
            pending_types: Vec::new(),
            pending_methods: Vec::new(),
            retained: Vec::new(),
        }
    }

    fn keep_type(&mut self, id: TypeId) {
        let Some(def) = self.module.get_type(id) else { return };
        if self.types[id.index()].is_some() {
            return;
        }
        let mut def = def.clone();
        if !self.module.is_type_live(id) {
            def.fields.clear();
            def.methods.clear();
            def.properties.clear();
            def.events.clear();
            def.nested_types.clear();
            def.interfaces.clear();
            def.custom_attributes.clear();
            for param in &mut def.generic_params {
                param.constraints.clear();
                param.custom_attributes.clear();
            }
            self.retained.push(self.module.type_full_name(id));
        }
        def.removed = false;
        self.types[id.index()] = Some(def);
        self.pending_types.push(id);
    }

    fn keep_method(&mut self, id: MethodId) {
        let Some(def) = self.module.get_method(id) else { return };
        if self.methods[id.index()].is_some() {
            return;
        }
        let mut def = def.clone();
        if !self.module.is_method_live(id) {
            def.body = None;
            def.overrides.clear();
            def.custom_attributes.clear();
            def.ret.custom_attributes.clear();
            for param in &mut def.params {
                param.custom_attributes.clear();
            }
            for param in &mut def.generic_params {
                param.constraints.clear();
                param.custom_attributes.clear();
            }
            self.retained.push(self.module.method_full_name(id));
        }
        def.removed = false;
        self.methods[id.index()] = Some(def);
        self.pending_methods.push(id);
    }

    /// Walks kept entities until no new reference turns up.
    fn drain(&mut self) {
        loop {
            if let Some(id) = self.pending_types.pop() {
                self.scan_type(id);
            } else if let Some(id) = self.pending_methods.pop() {
                self.scan_method(id);
            } else {
                break;
            }
        }
    }

    fn scan_type(&mut self, id: TypeId) {
        let Some(mut def) = self.types[id.index()].clone() else { return };
        if let Some(parent) = def.declaring_type {
            self.keep_type(parent);
        }
        for nested in &def.nested_types {
            self.keep_type(*nested);
        }
        for method in &def.methods {
            self.keep_method(*method);
        }
        for field in &def.fields {
            if self.fields.get(field.index()).is_some_and(Option::is_none) {
                let mut field_def = self.module.field(*field).clone();
                walk_field(&mut field_def, self);
                self.fields[field.index()] = Some(field_def);
            }
        }
        for property in &def.properties {
            if self.properties.get(property.index()).is_some_and(Option::is_none) {
                let mut property_def = self.module.property(*property).clone();
                walk_property(&mut property_def, self);
                self.properties[property.index()] = Some(property_def);
            }
        }
        for event in &def.events {
            if self.events.get(event.index()).is_some_and(Option::is_none) {
                let mut event_def = self.module.event(*event).clone();
                walk_event(&mut event_def, self);
                self.events[event.index()] = Some(event_def);
            }
        }
        walk_type(&mut def, self);
    }

    fn scan_method(&mut self, id: MethodId) {
        let Some(mut def) = self.methods[id.index()].clone() else { return };
        self.keep_type(def.declaring_type);
        walk_method(&mut def, self);
    }
}

impl IdVisitor for Marker<'_> {
    fn visit_type(&mut self, id: &mut TypeId) {
        self.keep_type(*id);
    }

    fn visit_method(&mut self, id: &mut MethodId) {
        self.keep_method(*id);
    }
}

/// Maps each kept slot to its position among the kept slots.
fn dense_ids<T, I>(slots: &[Option<T>], make: impl Fn(u32) -> I) -> Vec<Option<I>> {
    let mut next = 0;
    slots
        .iter()
        .map(|slot| {
            slot.as_ref().map(|_| {
                let id = make(next);
                next += 1;
                id
            })
        })
        .collect()
}

/// Old-to-new id tables of a compaction.
struct Remap {
    types: Vec<Option<TypeId>>,
    methods: Vec<Option<MethodId>>,
    fields: Vec<Option<FieldId>>,
    properties: Vec<Option<PropertyId>>,
    events: Vec<Option<EventId>>,
}

impl Remap {
    fn ty(&self, id: TypeId) -> Option<TypeId> {
        self.types.get(id.index()).copied().flatten()
    }

    fn method(&self, id: MethodId) -> Option<MethodId> {
        self.methods.get(id.index()).copied().flatten()
    }

    fn field(&self, id: FieldId) -> Option<FieldId> {
        self.fields.get(id.index()).copied().flatten()
    }

    fn property(&self, id: PropertyId) -> Option<PropertyId> {
        self.properties.get(id.index()).copied().flatten()
    }

    fn event(&self, id: EventId) -> Option<EventId> {
        self.events.get(id.index()).copied().flatten()
    }
}

impl IdVisitor for Remap {
    fn visit_type(&mut self, id: &mut TypeId) {
        if let Some(new) = self.ty(*id) {
            *id = new;
        }
    }

    fn visit_method(&mut self, id: &mut MethodId) {
        if let Some(new) = self.method(*id) {
            *id = new;
        }
    }
}

struct IdChecker<'a> {
    module: &'a Module,
}

impl<'a> IdChecker<'a> {
    fn ty(&self, id: TypeId) -> Result<&'a TypeDef> {
        self.module
            .get_type(id)
            .ok_or_else(|| malformed_error!("unknown {}", id))
    }

    fn method(&self, id: MethodId) -> Result<&'a MethodDef> {
        self.module
            .get_method(id)
            .ok_or_else(|| malformed_error!("unknown {}", id))
    }

    fn sig(&self, sig: &TypeSig) -> Result<()> {
        match sig {
            TypeSig::Def(id) => self.ty(*id).map(|_| ()),
            TypeSig::GenericInst(definition, args) => {
                self.sig(definition)?;
                args.iter().try_for_each(|arg| self.sig(arg))
            }
            TypeSig::Ptr(inner)
            | TypeSig::ByRef(inner)
            | TypeSig::SzArray(inner)
            | TypeSig::Array(inner, _)
            | TypeSig::Pinned(inner) => self.sig(inner),
            TypeSig::Modified {
                modifier, inner, ..
            } => {
                self.sig(modifier)?;
                self.sig(inner)
            }
            _ => Ok(()),
        }
    }

    fn method_ref(&self, method: &MethodRef) -> Result<()> {
        match method {
            MethodRef::Def(id) => self.method(*id).map(|_| ()),
            MethodRef::Member(member) => {
                self.sig(&member.declaring_type)?;
                self.sig(&member.signature.return_type)?;
                member.signature.params.iter().try_for_each(|p| self.sig(p))
            }
        }
    }

    fn attributes(&self, attributes: &[CustomAttribute]) -> Result<()> {
        for attribute in attributes {
            self.method_ref(&attribute.constructor)?;
        }
        Ok(())
    }

    fn generic_params(&self, params: &[GenericParam]) -> Result<()> {
        for param in params {
            self.attributes(&param.custom_attributes)?;
            for constraint in &param.constraints {
                self.sig(&constraint.constraint)?;
                self.attributes(&constraint.custom_attributes)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        members::MemberAccess,
        method::{Instruction, MethodBody, OpCode},
        signatures::MemberRef,
    };

    fn sample() -> (Module, TypeId, TypeId, MethodId) {
        let mut module = Module::new("Sample.dll");
        let outer = module.add_type(TypeDef::new("N", "Outer"));
        let mut inner_def = TypeDef::new("", "Inner");
        inner_def.visibility = TypeVisibility::NestedPublic;
        inner_def.declaring_type = Some(outer);
        let inner = module.add_type(inner_def);
        let method = module.add_method(MethodDef::new("Run", inner));
        (module, outer, inner, method)
    }

    #[test]
    fn test_full_names() {
        let (module, outer, inner, _) = sample();
        assert_eq!(module.type_full_name(outer), "N.Outer");
        assert_eq!(module.type_full_name(inner), "N.Outer/Inner");
        assert_eq!(module.type_full_name(module.global_type), "<Module>");
        assert_eq!(module.find_type("N.Outer"), Some(outer));
    }

    #[test]
    fn test_liveness_follows_declaring_chain() {
        let (mut module, outer, inner, method) = sample();
        assert!(module.is_method_live(method));

        module.remove_type(outer);
        assert!(!module.is_type_live(outer));
        assert!(!module.is_type_live(inner));
        assert!(!module.is_method_live(method));
        assert!(!module.types.contains(&outer));
    }

    #[test]
    fn test_remove_method_detaches() {
        let (mut module, _, inner, method) = sample();
        module.remove_method(method);
        assert!(module.ty(inner).methods.is_empty());
        assert!(module.method(method).removed);
        assert!(module.is_type_live(inner));
    }

    #[test]
    fn test_clear_type_tombstones_members() {
        let (mut module, outer, inner, method) = sample();
        module.clear_type(outer);
        assert!(module.ty(outer).is_empty());
        assert!(module.is_type_live(outer));
        assert!(!module.is_type_live(inner));
        assert!(!module.is_method_live(method));
    }

    #[test]
    fn test_insert_keeps_order() {
        let (mut module, outer, _, _) = sample();
        let first = module.add_field(FieldDef {
            name: "a".into(),
            access: MemberAccess::Public,
            flags: Default::default(),
            field_type: TypeSig::I4,
            declaring_type: outer,
            custom_attributes: Vec::new(),
            removed: false,
        });
        let mut padding = module.field(first).clone();
        padding.name = "_dummy".into();
        let second = module.insert_field(0, padding);
        assert_eq!(module.ty(outer).fields, vec![second, first]);
    }

    #[test]
    fn test_default_constructor_selection() {
        let (mut module, outer, _, _) = sample();
        let mut with_arg = MethodDef::new(".ctor", outer);
        with_arg.params.push(crate::metadata::method::Param::new("x", TypeSig::I4));
        module.add_method(with_arg);
        assert_eq!(module.default_constructor(outer), None);

        let plain = module.add_method(MethodDef::new(".ctor", outer));
        assert_eq!(module.default_constructor(outer), Some(plain));
        assert_eq!(module.parameterless_constructor(outer), Some(plain));
    }

    #[test]
    fn test_is_defined_by_name() {
        let (mut module, outer, _, _) = sample();
        module.ty_mut(outer).custom_attributes.push(CustomAttribute::new(MethodRef::Member(MemberRef {
            declaring_type: TypeSig::external("System.Runtime", "System", "ObsoleteAttribute"),
            name: ".ctor".into(),
            signature: MethodSig::instance_void(),
        })));
        assert!(module.is_defined(&module.ty(outer).custom_attributes, "System.ObsoleteAttribute"));
        assert!(!module.is_defined(&module.ty(outer).custom_attributes, "System.FlagsAttribute"));
    }

    #[test]
    fn test_root_object_spellings() {
        let module = Module::new("m");
        assert!(module.same_type(&TypeSig::Object, &TypeSig::external("mscorlib", "System", "Object")));
        assert!(!module.same_type(&TypeSig::Object, &TypeSig::String));
    }

    #[test]
    fn test_compact_drops_tombstones() {
        let (mut module, outer, _, _) = sample();
        let kept = module.add_type(TypeDef::new("N", "Kept"));
        let stay = module.add_method(MethodDef::new("Stay", kept));
        module.remove_type(outer);

        let compaction = module.compact();
        let compacted = &compaction.module;
        assert!(compaction.retained.is_empty());
        assert_eq!(compacted.type_count(), 2);
        assert_eq!(compacted.method_count(), 1);
        assert!(compacted.validate().is_ok());

        let kept = compacted.find_type("N.Kept").unwrap();
        assert_eq!(kept, TypeId::new(1));
        assert_eq!(compacted.find_method(kept, "Stay"), Some(MethodId::new(0)));
        assert_eq!(compacted.method(MethodId::new(0)).name, module.method(stay).name);
        assert!(compacted.find_type("N.Outer").is_none());
        assert!((0..compacted.type_count()).all(|i| compacted.is_type_live(TypeId::new(i as u32))));
    }

    #[test]
    fn test_compact_without_removals_is_identity() {
        let (module, _, _, _) = sample();
        let compaction = module.compact();
        assert_eq!(compaction.module, module);
        assert!(compaction.retained.is_empty());
    }

    #[test]
    fn test_compact_keeps_referenced_removed_type_as_declaration() {
        let (mut module, outer, inner, _) = sample();
        let get = module.add_method(MethodDef::new("Get", outer));
        module.method_mut(get).ret.return_type = TypeSig::Def(inner);
        module.remove_type(inner);

        let compaction = module.compact();
        let compacted = &compaction.module;
        assert_eq!(compaction.retained, vec!["N.Outer/Inner".to_string()]);
        assert!(compacted.validate().is_ok());

        let shell = compacted.find_type("N.Outer/Inner").unwrap();
        assert!(compacted.ty(shell).is_empty());
        let outer = compacted.find_type("N.Outer").unwrap();
        let get = compacted.find_method(outer, "Get").unwrap();
        assert_eq!(compacted.method(get).ret.return_type, TypeSig::Def(shell));
        assert_eq!(compacted.method_count(), 1);
    }

    #[test]
    fn test_compact_keeps_called_removed_method_without_body() {
        let (mut module, outer, _, _) = sample();
        let helper = module.add_method(MethodDef::new("Helper", outer));
        module.method_mut(helper).body = Some(MethodBody::new(vec![
            Instruction::simple(OpCode::Ret),
        ]));
        let caller = module.add_method(MethodDef::new("Caller", outer));
        module.method_mut(caller).body = Some(MethodBody::new(vec![
            Instruction::call(MethodRef::Def(helper)),
            Instruction::simple(OpCode::Ret),
        ]));
        module.remove_method(helper);

        let compaction = module.compact();
        let compacted = &compaction.module;
        assert_eq!(compaction.retained, vec!["N.Outer::Helper".to_string()]);
        let outer = compacted.find_type("N.Outer").unwrap();
        let helper = compacted.find_method(outer, "Helper").unwrap();
        assert!(compacted.method(helper).body.is_none());
        let caller = compacted.find_method(outer, "Caller").unwrap();
        assert_eq!(
            compacted.method(caller).body.as_ref().and_then(|b| b.instructions[0].method_operand()),
            Some(&MethodRef::Def(helper))
        );
    }

    #[test]
    fn test_validate_rejects_declaring_cycle() {
        let (mut module, outer, inner, _) = sample();
        module.ty_mut(inner).nested_types.push(outer);
        module.ty_mut(outer).declaring_type = Some(inner);
        module.types.retain(|t| *t != outer);
        assert!(matches!(module.validate(), Err(crate::Error::Malformed { .. })));

        let mut module = Module::new("m");
        let a = module.add_type(TypeDef::new("", "A"));
        module.types.retain(|t| *t != a);
        module.ty_mut(a).declaring_type = Some(a);
        module.ty_mut(a).nested_types.push(a);
        assert!(matches!(module.validate(), Err(crate::Error::Malformed { .. })));
        assert!(!module.is_type_live(a));
        assert!(module.type_full_name(a).starts_with("A/A"));
    }

    #[test]
    fn test_validate_rejects_unknown_ids() {
        let (mut module, outer, _, _) = sample();
        assert!(module.validate().is_ok());
        module.ty_mut(outer).base_type = Some(TypeSig::Def(TypeId::new(99)));
        assert!(matches!(module.validate(), Err(crate::Error::Malformed { .. })));
    }
}
