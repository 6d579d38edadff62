//! Structural guarantees of generated output, checked over a module that mixes
//! visible and hidden types across every kind of reference.

use refasm::{
    metadata::{
        builder::{attribute, corlib_type},
        generics::GenericParam,
        method::MethodModifiers,
        refs::{walk_sig, IdVisitor},
        signatures::MethodRef,
        types::TypeFlags,
    },
    prelude::*,
    pruning::ctor::needs_default_constructor,
    Result,
};

/// `S.Api` and friends: visible types that mention hidden ones through a base
/// list, an attribute, a field, parameters, a constraint and an explicit override.
fn surface() -> Module {
    let mut module = Module::new("Surface.dll");
    module.assembly = Some(AssemblyDef::new("Surface"));

    let base = TypeBuilder::class("S", "Base").build(&mut module);
    MethodBuilder::constructor().ret_body().build(&mut module, base);

    let hidden = TypeBuilder::class("S", "Hidden")
        .visibility(TypeVisibility::NotPublic)
        .build(&mut module);
    let hidden_interface = TypeBuilder::interface("S", "IHidden")
        .visibility(TypeVisibility::NotPublic)
        .build(&mut module);
    let hidden_run = MethodBuilder::new("Run")
        .modifiers(MethodModifiers::ABSTRACT | MethodModifiers::VIRTUAL)
        .build(&mut module, hidden_interface);
    let attribute_base = corlib_type(&module, "System", "Attribute");
    let hidden_attribute = TypeBuilder::class("S", "HiddenAttribute")
        .visibility(TypeVisibility::NotPublic)
        .base(attribute_base)
        .build(&mut module);
    MethodBuilder::constructor().ret_body().build(&mut module, hidden_attribute);

    let api = TypeBuilder::class("S", "Api")
        .base(TypeSig::Def(base))
        .implements(TypeSig::Def(hidden_interface))
        .attribute(attribute(TypeSig::Def(hidden_attribute)))
        .build(&mut module);
    MethodBuilder::constructor().ret_body().build(&mut module, api);
    FieldBuilder::new("_hidden", TypeSig::Def(hidden))
        .access(MemberAccess::Assembly)
        .build(&mut module, api);
    MethodBuilder::new("Helper")
        .access(MemberAccess::Private)
        .param("hidden", TypeSig::Def(hidden))
        .ret_body()
        .build(&mut module, api);
    MethodBuilder::new("Map")
        .generic_param(GenericParam::new("T", 0).with_constraint(TypeSig::Def(hidden_interface)))
        .param("value", TypeSig::GenericParamMethod(0))
        .returns(TypeSig::GenericParamMethod(0))
        .ret_body()
        .build(&mut module, api);
    MethodBuilder::new("S.IHidden.Run")
        .access(MemberAccess::Private)
        .modifiers(MethodModifiers::VIRTUAL | MethodModifiers::FINAL)
        .overrides(MethodRef::Def(hidden_run))
        .ret_body()
        .build(&mut module, api);

    let helpers = TypeBuilder::class("S", "Helpers")
        .flags(TypeFlags::ABSTRACT | TypeFlags::SEALED)
        .build(&mut module);
    MethodBuilder::new("Clamp")
        .modifiers(MethodModifiers::STATIC)
        .param("value", TypeSig::I4)
        .returns(TypeSig::I4)
        .ret_body()
        .build(&mut module, helpers);

    TypeBuilder::class("S", "Shape")
        .flags(TypeFlags::ABSTRACT)
        .build(&mut module);

    let widget = TypeBuilder::class("S", "Widget").build(&mut module);
    MethodBuilder::constructor()
        .access(MemberAccess::Assembly)
        .param("hidden", TypeSig::Def(hidden))
        .ret_body()
        .build(&mut module, widget);

    let rect = TypeBuilder::value_type("S", "Rect").build(&mut module);
    FieldBuilder::new("Width", TypeSig::I4).build(&mut module, rect);
    FieldBuilder::new("_owner", TypeSig::Def(hidden))
        .access(MemberAccess::Private)
        .build(&mut module, rect);

    let outer = TypeBuilder::class("S", "Outer").build(&mut module);
    TypeBuilder::nested(outer, "Inner")
        .visibility(TypeVisibility::NestedPrivate)
        .build(&mut module);
    TypeBuilder::nested(outer, "Visible")
        .visibility(TypeVisibility::NestedPublic)
        .build(&mut module);

    module
}

/// Names of everything [`surface`] hides from a `Drop` pass.
const HIDDEN_NAMES: [&str; 8] = [
    "Hidden",
    "IHidden",
    "HiddenAttribute",
    "Inner",
    "Helper",
    "S.IHidden.Run",
    "_hidden",
    "_owner",
];

fn find(module: &Module, full_name: &str) -> TypeId {
    module
        .find_type(full_name)
        .unwrap_or_else(|| panic!("{full_name} is missing"))
}

fn generate(module: &Module, config: GeneratorConfig) -> Result<(Module, Generated)> {
    let codec = ImageCodec::new();
    let generated = ReferenceAssemblyGenerator::new(codec, config).generate(&codec.to_image(module)?)?;
    Ok((codec.load(&generated.bytes)?, generated))
}

/// Every type signature a live entity of `ty` mentions, paired with where it appears.
fn mentioned_types(module: &Module, ty: TypeId) -> Vec<(String, TypeSig)> {
    let def = module.ty(ty);
    let owner = module.type_full_name(ty);
    let mut out = Vec::new();
    let mut attributes = |place: String, attrs: &[refasm::metadata::customattributes::CustomAttribute]| {
        for attr in attrs {
            out.push((format!("attribute on {place}"), module.attribute_type(attr)));
        }
    };

    attributes(owner.clone(), &def.custom_attributes);
    let mut sigs: Vec<(String, TypeSig)> = Vec::new();
    if let Some(base) = &def.base_type {
        sigs.push((format!("base of {owner}"), base.clone()));
    }
    for interface in &def.interfaces {
        sigs.push((format!("interface of {owner}"), interface.interface.clone()));
    }
    for param in &def.generic_params {
        for constraint in &param.constraints {
            sigs.push((format!("constraint on {owner}"), constraint.constraint.clone()));
        }
    }
    for field in &def.fields {
        let field = module.field(*field);
        attributes(field.name.clone(), &field.custom_attributes);
        sigs.push((format!("field {owner}::{}", field.name), field.field_type.clone()));
    }
    for method in &def.methods {
        let name = module.method_full_name(*method);
        let method = module.method(*method);
        attributes(name.clone(), &method.custom_attributes);
        sigs.push((format!("return of {name}"), method.ret.return_type.clone()));
        for param in &method.params {
            sigs.push((format!("parameter {} of {name}", param.name), param.param_type.clone()));
        }
        for generic in &method.generic_params {
            for constraint in &generic.constraints {
                sigs.push((format!("constraint on {name}"), constraint.constraint.clone()));
            }
        }
    }
    out.extend(sigs);
    out
}

struct Referenced(Vec<TypeId>);

impl IdVisitor for Referenced {
    fn visit_type(&mut self, id: &mut TypeId) {
        self.0.push(*id);
    }

    fn visit_method(&mut self, _: &mut MethodId) {}
}

/// Every arena slot is live and every signature of a live type resolves to a live type.
fn assert_no_dangling_references(module: &Module) {
    for index in 0..module.type_count() {
        let id = TypeId::new(index as u32);
        assert!(module.is_type_live(id), "tombstone {} survived", module.type_full_name(id));
    }
    for index in 0..module.method_count() {
        let id = MethodId::new(index as u32);
        assert!(module.is_method_live(id), "tombstone {} survived", module.method_full_name(id));
    }

    if let Some(assembly) = &module.assembly {
        for attr in &assembly.custom_attributes {
            let mut referenced = Referenced(Vec::new());
            walk_sig(&mut module.attribute_type(attr), &mut referenced);
            assert!(referenced.0.iter().all(|t| module.is_type_live(*t)), "assembly attribute is dangling");
        }
    }
    for ty in module.all_types() {
        for (place, mut sig) in mentioned_types(module, ty) {
            let mut referenced = Referenced(Vec::new());
            walk_sig(&mut sig, &mut referenced);
            for id in referenced.0 {
                assert!(module.is_type_live(id), "{place} references missing type {id}");
            }
        }
    }
}

fn assert_constructors_complete(module: &Module) {
    for ty in module.all_types() {
        let def = module.ty(ty);
        if ty == module.global_type || def.is_interface() || def.is_value_type() || def.is_static_class() {
            continue;
        }
        assert!(
            !module.instance_constructors(ty).is_empty(),
            "{} has no instance constructor",
            module.type_full_name(ty)
        );
        assert!(!needs_default_constructor(module, ty));
    }
}

#[test]
fn test_drop_removes_hidden_types_without_dangling_references() -> Result<()> {
    let (output, generated) = generate(&surface(), GeneratorConfig::default().with_keep_internal(KeepInternal::Drop))?;

    assert_eq!(generated.attempts, 1);
    assert!(generated.stats.violations.is_empty(), "{:?}", generated.stats.violations);
    for removed in ["S.Hidden", "S.IHidden", "S.HiddenAttribute", "S.Outer/Inner"] {
        assert!(output.find_type(removed).is_none(), "{removed} survived");
    }
    assert!(output.find_type("S.Outer/Visible").is_some());

    let api = find(&output, "S.Api");
    let def = output.ty(api);
    assert!(def.interfaces.is_empty());
    assert!(def.custom_attributes.is_empty());
    assert!(def.fields.is_empty());
    let map = output.find_method(api, "Map");
    assert!(map.is_some_and(|m| output.method(m).generic_params[0].constraints.is_empty()));
    assert!(output.find_method(api, "S.IHidden.Run").is_none());

    assert_no_dangling_references(&output);
    assert_constructors_complete(&output);
    Ok(())
}

#[test]
fn test_removed_entities_absent_from_image() -> Result<()> {
    let codec = ImageCodec::new();
    let config = GeneratorConfig::default().with_keep_internal(KeepInternal::Drop);
    let generated = ReferenceAssemblyGenerator::new(codec, config).generate(&codec.to_image(&surface())?)?;

    let text = String::from_utf8_lossy(&generated.bytes);
    for name in HIDDEN_NAMES {
        assert!(!text.contains(&format!("\"name\":\"{name}\"")), "image still names {name}");
    }
    assert!(!text.contains("\"removed\":true"));

    let output = codec.load(&generated.bytes)?;
    assert_no_dangling_references(&output);
    Ok(())
}

#[test]
fn test_load_rejects_cyclic_declaring_chains() -> Result<()> {
    let mut module = surface();
    let outer = find(&module, "S.Outer");
    let visible = find(&module, "S.Outer/Visible");
    let image: serde_json::Value = serde_json::from_slice(&ImageCodec::new().to_image(&module)?)
        .map_err(|e| Error::WriteFailure(e.to_string()))?;

    // self-nesting, and a two-type loop detached from the top-level list
    let outer_index = outer.index();
    let visible_index = visible.index();
    let mut self_nested = image.clone();
    self_nested["module"]["type_arena"][visible_index]["declaring_type"] = visible_index.into();
    self_nested["module"]["type_arena"][visible_index]["nested_types"] = vec![visible_index].into();
    let mut looped = image;
    looped["module"]["type_arena"][outer_index]["declaring_type"] = visible_index.into();
    looped["module"]["type_arena"][visible_index]["nested_types"] = vec![outer_index].into();
    let top_level: Vec<serde_json::Value> = looped["module"]["types"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|t| t.as_u64() != Some(outer_index as u64))
        .collect();
    looped["module"]["types"] = top_level.into();

    let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), GeneratorConfig::default());
    for crafted in [self_nested, looped] {
        let bytes = serde_json::to_vec(&crafted).map_err(|e| Error::WriteFailure(e.to_string()))?;
        assert!(matches!(ImageCodec::new().load(&bytes), Err(Error::Malformed { .. })));
        let err = generator.generate(&bytes).unwrap_err();
        assert!(!err.is_skippable());
    }

    module.ty_mut(visible).declaring_type = Some(visible);
    assert!(module.validate().is_err());
    Ok(())
}

#[test]
fn test_constructors_injected_where_missing() -> Result<()> {
    let (output, _) = generate(&surface(), GeneratorConfig::default())?;

    for name in ["S.Shape", "S.Widget", "S.Outer/Visible"] {
        let ctors = output.instance_constructors(find(&output, name));
        assert_eq!(ctors.len(), 1, "{name}");
        assert_eq!(output.method(ctors[0]).access, MemberAccess::Private);
        assert!(output.method(ctors[0]).params.is_empty());
    }
    assert_constructors_complete(&output);
    Ok(())
}

#[test]
fn test_every_policy_leaves_consistent_output() -> Result<()> {
    let module = surface();
    let configs = [
        GeneratorConfig::default(),
        GeneratorConfig::default().with_keep_internal(KeepInternal::Keep),
        GeneratorConfig::default().with_keep_non_public(true),
        GeneratorConfig::runtime(),
        GeneratorConfig::strict().with_keep_internal(KeepInternal::Drop),
    ];
    for config in configs {
        let (output, generated) = generate(&module, config)?;
        assert!(generated.stats.violations.is_empty());
        assert_no_dangling_references(&output);
        assert_constructors_complete(&output);
    }
    Ok(())
}

#[test]
fn test_keep_internal_retains_hidden_types() -> Result<()> {
    let (output, generated) = generate(&surface(), GeneratorConfig::default().with_keep_internal(KeepInternal::Keep))?;

    assert!(output.find_type("S.Hidden").is_some());
    assert!(output.find_type("S.IHidden").is_some());
    assert!(output.find_type("S.Outer/Inner").is_none());
    let api = find(&output, "S.Api");
    assert_eq!(output.ty(api).interfaces.len(), 1);
    assert_eq!(output.ty(api).fields.len(), 1);
    assert_eq!(generated.stats.padding_fields_added, 1);
    Ok(())
}
