//! Padding fields for value types that lost instance fields.
//!
//! A struct whose private fields were stripped would look empty, or look
//! `unmanaged`, to a compiler consuming the reference assembly. One private
//! placeholder field keeps both properties of the original layout.

use crate::metadata::{
    builder::FieldBuilder,
    customattributes::IS_READ_ONLY_ATTRIBUTE,
    ids::{FieldId, TypeId},
    members::{FieldFlags, MemberAccess},
    module::Module,
    signatures::TypeSig,
};

/// Name of the placeholder inserted when a reference-typed field was removed
pub const OBJECT_PADDING_NAME: &str = "_dummy";
/// Name of the placeholder inserted when only primitive fields were removed
pub const PRIMITIVE_PADDING_NAME: &str = "_dummyPrimitive";

/// Which placeholder a value type needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PaddingMode {
    /// No instance field was removed
    None,
    /// Only primitive instance fields were removed
    Primitive,
    /// At least one non-primitive instance field was removed
    Object,
}

impl PaddingMode {
    /// Classifies the instance fields among `removed`.
    #[must_use]
    pub fn from_removed(module: &Module, removed: &[FieldId]) -> Self {
        removed
            .iter()
            .map(|id| module.field(*id))
            .filter(|field| !field.is_static())
            .map(|field| {
                if field.field_type.is_primitive() {
                    PaddingMode::Primitive
                } else {
                    PaddingMode::Object
                }
            })
            .max()
            .unwrap_or(PaddingMode::None)
    }

    fn field(self) -> Option<(&'static str, TypeSig)> {
        match self {
            PaddingMode::None => None,
            PaddingMode::Primitive => Some((PRIMITIVE_PADDING_NAME, TypeSig::I4)),
            PaddingMode::Object => Some((OBJECT_PADDING_NAME, TypeSig::Object)),
        }
    }
}

/// A padding field inserted by an earlier pass.
///
/// The first field counts only with the exact shape [`insert_padding`] gives it:
/// a private instance field with a placeholder name and type, no attributes and
/// no flags besides `initonly`. No other private instance field may remain beside
/// it, since a pass never leaves one next to the padding it inserted.
#[must_use]
pub fn existing_padding(module: &Module, ty: TypeId) -> Option<FieldId> {
    let fields = &module.ty(ty).fields;
    let first = *fields.first()?;
    let field = module.field(first);
    if field.access != MemberAccess::Private
        || !field.flags.difference(FieldFlags::INIT_ONLY).is_empty()
        || !field.custom_attributes.is_empty()
    {
        return None;
    }
    let matches = match field.name.as_str() {
        OBJECT_PADDING_NAME => module.is_root_object(&field.field_type),
        PRIMITIVE_PADDING_NAME => field.field_type == TypeSig::I4,
        _ => false,
    };
    let private_sibling = fields[1..].iter().map(|f| module.field(*f)).any(|f| {
        !f.is_static() && matches!(f.access, MemberAccess::Private | MemberAccess::CompilerControlled)
    });
    (matches && !private_sibling).then_some(first)
}

/// Inserts the placeholder for `mode` as the first field of `ty`.
///
/// The field is read-only when the type is a `readonly struct`.
pub fn insert_padding(module: &mut Module, ty: TypeId, mode: PaddingMode) -> Option<FieldId> {
    let (name, field_type) = mode.field()?;
    let mut field = FieldBuilder::new(name, field_type).access(MemberAccess::Private);
    if module.is_defined(&module.ty(ty).custom_attributes, IS_READ_ONLY_ATTRIBUTE) {
        field = field.flags(FieldFlags::INIT_ONLY);
    }
    Some(module.insert_field(0, field.into_def(ty)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::builder::{attribute, corlib_type, TypeBuilder};

    #[test]
    fn test_mode_from_removed() {
        let mut module = Module::new("Lib.dll");
        let ty = TypeBuilder::value_type("N", "S").build(&mut module);
        let a = FieldBuilder::new("a", TypeSig::I4).build(&mut module, ty);
        let b = FieldBuilder::new("b", TypeSig::Object).build(&mut module, ty);
        let s = FieldBuilder::new("s", TypeSig::String)
            .flags(FieldFlags::STATIC)
            .build(&mut module, ty);

        assert_eq!(PaddingMode::from_removed(&module, &[]), PaddingMode::None);
        assert_eq!(PaddingMode::from_removed(&module, &[a]), PaddingMode::Primitive);
        assert_eq!(PaddingMode::from_removed(&module, &[a, b]), PaddingMode::Object);
        assert_eq!(PaddingMode::from_removed(&module, &[s]), PaddingMode::None);
    }

    #[test]
    fn test_insert_and_detect() {
        let mut module = Module::new("Lib.dll");
        let read_only = corlib_type(&module, "System.Runtime.CompilerServices", "IsReadOnlyAttribute");
        let ty = TypeBuilder::value_type("N", "S")
            .attribute(attribute(read_only))
            .build(&mut module);
        FieldBuilder::new("x", TypeSig::I4).build(&mut module, ty);

        assert_eq!(existing_padding(&module, ty), None);
        let padding = insert_padding(&mut module, ty, PaddingMode::Object).unwrap();
        assert_eq!(module.ty(ty).fields[0], padding);
        let field = module.field(padding);
        assert_eq!(field.name, OBJECT_PADDING_NAME);
        assert_eq!(field.access, MemberAccess::Private);
        assert!(field.flags.contains(FieldFlags::INIT_ONLY));
        assert_eq!(existing_padding(&module, ty), Some(padding));

        assert_eq!(insert_padding(&mut module, ty, PaddingMode::None), None);
    }

    #[test]
    fn test_hand_written_dummy_is_not_padding() {
        let mut module = Module::new("Lib.dll");
        let with_sibling = TypeBuilder::value_type("N", "Cache").build(&mut module);
        FieldBuilder::new(PRIMITIVE_PADDING_NAME, TypeSig::I4)
            .access(MemberAccess::Private)
            .build(&mut module, with_sibling);
        FieldBuilder::new("_entries", TypeSig::Object)
            .access(MemberAccess::Private)
            .build(&mut module, with_sibling);
        assert_eq!(existing_padding(&module, with_sibling), None);

        let non_serialized = corlib_type(&module, "System", "NonSerializedAttribute");
        let attributed = TypeBuilder::value_type("N", "Slot").build(&mut module);
        FieldBuilder::new(OBJECT_PADDING_NAME, TypeSig::Object)
            .access(MemberAccess::Private)
            .attribute(attribute(non_serialized))
            .build(&mut module, attributed);
        assert_eq!(existing_padding(&module, attributed), None);

        let flagged = TypeBuilder::value_type("N", "Flagged").build(&mut module);
        FieldBuilder::new(OBJECT_PADDING_NAME, TypeSig::Object)
            .access(MemberAccess::Private)
            .flags(FieldFlags::NOT_SERIALIZED)
            .build(&mut module, flagged);
        assert_eq!(existing_padding(&module, flagged), None);

        let padded = TypeBuilder::value_type("N", "Padded").build(&mut module);
        let padding = FieldBuilder::new(OBJECT_PADDING_NAME, TypeSig::Object)
            .access(MemberAccess::Private)
            .build(&mut module, padded);
        FieldBuilder::new("Value", TypeSig::I4).build(&mut module, padded);
        FieldBuilder::new("_shared", TypeSig::Object)
            .access(MemberAccess::Private)
            .flags(FieldFlags::STATIC)
            .build(&mut module, padded);
        assert_eq!(existing_padding(&module, padded), Some(padding));
    }

    #[test]
    fn test_public_dummy_is_not_padding() {
        let mut module = Module::new("Lib.dll");
        let ty = TypeBuilder::value_type("N", "S").build(&mut module);
        FieldBuilder::new(PRIMITIVE_PADDING_NAME, TypeSig::I4).build(&mut module, ty);
        assert_eq!(existing_padding(&module, ty), None);
    }
}
