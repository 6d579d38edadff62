use crate::{
    metadata::{
        customattributes::{AttributeValue, CustomAttribute, CustomAttributeArgument},
        signatures::MethodRef,
    },
    reachability::Classifier,
};

impl Classifier<'_> {
    /// Attribute instance reachability.
    ///
    /// The attribute type, a local constructor, and every positional and named
    /// argument must be reachable. Constructors referenced from other modules are
    /// trusted. Named arguments are not checked against the members of the
    /// attribute type, which may already have been pruned or live in a base type.
    #[must_use]
    pub fn is_attribute_reachable(&self, attribute: &CustomAttribute) -> bool {
        if let MethodRef::Def(ctor) = &attribute.constructor {
            if !self.module.is_method_live(*ctor) {
                return false;
            }
        }
        if !self.is_sig_reachable(&self.module.attribute_type(attribute)) {
            return false;
        }
        if let MethodRef::Def(ctor) = &attribute.constructor {
            if !self.is_method_reachable(*ctor) {
                return false;
            }
        }
        attribute
            .fixed_args
            .iter()
            .all(|arg| self.is_argument_reachable(arg))
            && attribute
                .named_args
                .iter()
                .all(|named| self.is_argument_reachable(&named.argument))
    }

    /// Argument reachability: the declared type and any `typeof` or array element
    /// value nested inside it.
    #[must_use]
    pub fn is_argument_reachable(&self, argument: &CustomAttributeArgument) -> bool {
        if !self.is_sig_reachable(&argument.arg_type) {
            return false;
        }
        match &argument.value {
            AttributeValue::Type(sig) => self.is_sig_reachable(sig),
            AttributeValue::Array(items) => items.iter().all(|item| self.is_argument_reachable(item)),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        metadata::{
            builder::{attribute, corlib_type, MethodBuilder, TypeBuilder},
            customattributes::{AttributeValue, CustomAttribute, CustomAttributeArgument, CustomAttributeNamedArgument},
            members::MemberAccess,
            module::Module,
            signatures::{MethodRef, TypeSig},
            types::TypeVisibility,
        },
        reachability::{Classifier, KeepInternal, Policy},
    };

    fn drop_policy() -> Policy {
        Policy::new(false, KeepInternal::Drop)
    }

    #[test]
    fn test_local_attribute_type_and_ctor() {
        let mut module = Module::new("Lib.dll");
        let base = corlib_type(&module, "System", "Attribute");
        let public_attr = TypeBuilder::class("N", "MarkerAttribute").base(base.clone()).build(&mut module);
        let public_ctor = MethodBuilder::constructor().build(&mut module, public_attr);
        let internal_ctor = MethodBuilder::constructor()
            .access(MemberAccess::Assembly)
            .param("x", TypeSig::I4)
            .build(&mut module, public_attr);
        let hidden_attr = TypeBuilder::class("N", "HiddenAttribute")
            .base(base)
            .visibility(TypeVisibility::NotPublic)
            .build(&mut module);
        let hidden_ctor = MethodBuilder::constructor().build(&mut module, hidden_attr);

        let classifier = Classifier::new(&module, drop_policy());
        assert!(classifier.is_attribute_reachable(&CustomAttribute::new(MethodRef::Def(public_ctor))));
        assert!(!classifier.is_attribute_reachable(&CustomAttribute::new(MethodRef::Def(internal_ctor))));
        assert!(!classifier.is_attribute_reachable(&CustomAttribute::new(MethodRef::Def(hidden_ctor))));
    }

    #[test]
    fn test_removed_ctor_is_unreachable() {
        let mut module = Module::new("Lib.dll");
        let attr = TypeBuilder::class("N", "MarkerAttribute").build(&mut module);
        let ctor = MethodBuilder::constructor().build(&mut module, attr);
        module.remove_method(ctor);
        let classifier = Classifier::new(&module, Policy::new(true, KeepInternal::Keep));
        assert!(!classifier.is_attribute_reachable(&CustomAttribute::new(MethodRef::Def(ctor))));
    }

    #[test]
    fn test_nested_typeof_arguments() {
        let mut module = Module::new("Lib.dll");
        let hidden = TypeBuilder::class("N", "Hidden")
            .visibility(TypeVisibility::NotPublic)
            .build(&mut module);
        let system_type = corlib_type(&module, "System", "Type");
        let typeof_hidden = CustomAttributeArgument::new(system_type.clone(), AttributeValue::Type(TypeSig::Def(hidden)));
        let typeof_int = CustomAttributeArgument::new(system_type.clone(), AttributeValue::Type(TypeSig::I4));

        let mut ok = attribute(corlib_type(&module, "System", "ObsoleteAttribute"));
        ok.fixed_args.push(CustomAttributeArgument::new(
            TypeSig::sz_array(system_type.clone()),
            AttributeValue::Array(vec![typeof_int.clone()]),
        ));
        ok.fixed_args.push(CustomAttributeArgument::new(TypeSig::String, AttributeValue::Null));

        let mut nested = ok.clone();
        nested.fixed_args.push(CustomAttributeArgument::new(
            TypeSig::sz_array(system_type),
            AttributeValue::Array(vec![typeof_int, typeof_hidden.clone()]),
        ));

        let mut named = ok.clone();
        named.named_args.push(CustomAttributeNamedArgument {
            is_field: false,
            name: "Target".into(),
            argument: typeof_hidden,
        });

        let mut enum_valued = ok.clone();
        enum_valued
            .fixed_args
            .push(CustomAttributeArgument::new(TypeSig::Def(hidden), AttributeValue::Int(1)));

        let classifier = Classifier::new(&module, drop_policy());
        assert!(classifier.is_attribute_reachable(&ok));
        assert!(!classifier.is_attribute_reachable(&nested));
        assert!(!classifier.is_attribute_reachable(&named));
        assert!(!classifier.is_attribute_reachable(&enum_valued));
    }

    #[test]
    fn test_named_argument_members_are_not_checked() {
        let module = Module::new("Lib.dll");
        let mut attr = attribute(corlib_type(&module, "System", "ObsoleteAttribute"));
        attr.named_args.push(CustomAttributeNamedArgument {
            is_field: true,
            name: "DoesNotExist".into(),
            argument: CustomAttributeArgument::new(TypeSig::Boolean, AttributeValue::Bool(true)),
        });
        assert!(Classifier::new(&module, drop_policy()).is_attribute_reachable(&attr));
    }
}
