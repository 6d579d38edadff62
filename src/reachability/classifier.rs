use crate::{
    metadata::{
        customattributes::COMPILER_GENERATED_ATTRIBUTE,
        ids::{FieldId, MethodId, TypeId},
        members::MemberAccess,
        module::Module,
        signatures::TypeSig,
        types::TypeVisibility,
    },
    reachability::Policy,
};

/// Namespaces whose internal attribute types compilers inject into every assembly
const COMPILER_INJECTED_PREFIXES: [&str; 3] = [
    "System.Runtime.CompilerServices.",
    "Microsoft.CodeAnalysis.",
    "System.Diagnostics.CodeAnalysis.",
];

/// Answers whether an entity is part of the surface that must be kept.
///
/// Every predicate is pure over the current state of the graph. The pruning engine
/// walks types top-down, so [`Classifier::is_type_reachable`] assumes the
/// declaring type was already found reachable; signatures, which can name a
/// nested type from anywhere, check the whole declaring chain.
pub struct Classifier<'a> {
    pub(crate) module: &'a Module,
    pub(crate) policy: Policy,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier over `module` for one attempt's policy.
    #[must_use]
    pub fn new(module: &'a Module, policy: Policy) -> Self {
        Classifier { module, policy }
    }

    /// The policy this classifier applies.
    #[must_use]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Type reachability with the declaring type taken as reachable.
    #[must_use]
    pub fn is_type_reachable(&self, id: TypeId) -> bool {
        self.type_reachable(id, false)
    }

    /// Type reachability including the declaring chain.
    #[must_use]
    pub fn is_type_reachable_nested(&self, id: TypeId) -> bool {
        self.type_reachable(id, true)
    }

    fn type_reachable(&self, id: TypeId, check_declaring: bool) -> bool {
        if !self.module.is_type_live(id) {
            return false;
        }
        if self.policy.keep_non_public {
            return true;
        }
        if self.is_well_known_compiler_injected(id) {
            return true;
        }

        let ty = self.module.ty(id);
        if self.policy.is_auto_pending()
            && matches!(ty.visibility, TypeVisibility::NotPublic | TypeVisibility::NestedAssembly)
            && self.module.is_defined(&ty.custom_attributes, COMPILER_GENERATED_ATTRIBUTE)
        {
            return false;
        }

        let declaring_ok = || {
            !check_declaring
                || ty
                    .declaring_type
                    .is_some_and(|parent| self.type_reachable(parent, true))
        };
        let reachable = match ty.visibility {
            TypeVisibility::Public => return true,
            TypeVisibility::NestedPublic
            | TypeVisibility::NestedFamily
            | TypeVisibility::NestedFamOrAssem => declaring_ok(),
            TypeVisibility::NotPublic => self.policy.keeps_internal(),
            TypeVisibility::NestedAssembly | TypeVisibility::NestedFamAndAssem => {
                self.policy.keeps_internal() && declaring_ok()
            }
            TypeVisibility::NestedPrivate => false,
        };

        reachable || self.is_on_entry_point_chain(id)
    }

    /// True for internal attribute types compilers synthesize, such as
    /// `System.Runtime.CompilerServices.IsReadOnlyAttribute`, unless the module
    /// itself lives in that namespace.
    #[must_use]
    pub fn is_well_known_compiler_injected(&self, id: TypeId) -> bool {
        if self.module.ty(id).visibility != TypeVisibility::NotPublic {
            return false;
        }
        let full_name = self.module.type_full_name(id);
        if !full_name.ends_with("Attribute") {
            return false;
        }
        COMPILER_INJECTED_PREFIXES
            .iter()
            .find(|prefix| full_name.starts_with(*prefix))
            .is_some_and(|prefix| !self.module.name.starts_with(prefix))
    }

    /// True if `id` declares the entry point, directly or through a nested type.
    #[must_use]
    pub fn is_on_entry_point_chain(&self, id: TypeId) -> bool {
        let Some(entry) = self.module.entry_point else {
            return false;
        };
        let Some(method) = self.module.get_method(entry) else {
            return false;
        };
        let mut current = Some(method.declaring_type);
        while let Some(ty) = current {
            if ty == id {
                return true;
            }
            current = self.module.ty(ty).declaring_type;
        }
        false
    }

    /// Field reachability; the declaring type is taken as reachable.
    #[must_use]
    pub fn is_field_reachable(&self, id: FieldId) -> bool {
        if !self.module.is_field_live(id) {
            return false;
        }
        if self.policy.keep_non_public {
            return true;
        }
        let field = self.module.field(id);
        if self.policy.is_auto_pending()
            && field.access == MemberAccess::Assembly
            && self.module.is_defined(&field.custom_attributes, COMPILER_GENERATED_ATTRIBUTE)
        {
            return false;
        }
        self.access_reachable(field.access)
    }

    /// Method reachability; the declaring type is taken as reachable.
    #[must_use]
    pub fn is_method_reachable(&self, id: MethodId) -> bool {
        if !self.module.is_method_live(id) {
            return false;
        }
        if self.policy.keep_non_public {
            return true;
        }
        let method = self.module.method(id);
        if method.is_static_constructor() {
            return false;
        }
        if self.policy.is_auto_pending()
            && method.access == MemberAccess::Assembly
            && self.module.is_defined(&method.custom_attributes, COMPILER_GENERATED_ATTRIBUTE)
            && !method.has_overrides()
        {
            return false;
        }

        let reachable = match method.access {
            MemberAccess::CompilerControlled | MemberAccess::Private => method.has_overrides(),
            access => self.access_reachable(access),
        };
        if reachable {
            return true;
        }

        let declaring = method.declaring_type;
        if method.is_instance_constructor() && !self.module.ty(declaring).is_value_type() {
            match self.module.default_constructor(declaring) {
                Some(default) if default == id => return true,
                Some(_) => {}
                None => {
                    let minimum = if self.policy.keeps_internal() {
                        MemberAccess::FamAndAssem
                    } else {
                        MemberAccess::Family
                    };
                    let params_ok = method.params.iter().all(|p| self.is_sig_reachable(&p.param_type));
                    let visible_ctor = self
                        .module
                        .instance_constructors(declaring)
                        .iter()
                        .any(|c| self.module.method(*c).access >= minimum);
                    if params_ok && !visible_ctor {
                        return true;
                    }
                }
            }
        }

        self.module.entry_point == Some(id)
    }

    fn access_reachable(&self, access: MemberAccess) -> bool {
        match access {
            MemberAccess::Public | MemberAccess::Family | MemberAccess::FamOrAssem => true,
            MemberAccess::Assembly | MemberAccess::FamAndAssem => self.policy.keeps_internal(),
            MemberAccess::Private | MemberAccess::CompilerControlled => false,
        }
    }

    /// Type signature reachability.
    ///
    /// Element types and generic parameters are always reachable, references into
    /// other modules are trusted when they carry a resolution scope, and local
    /// types follow the type rule including their declaring chain.
    #[must_use]
    pub fn is_sig_reachable(&self, sig: &TypeSig) -> bool {
        let sig = sig.strip_modifiers();
        if let Some(element) = sig.element() {
            return self.is_sig_reachable(element);
        }
        match sig {
            TypeSig::Def(id) => self.is_type_reachable_nested(*id),
            TypeSig::Ref(reference) => reference.scope.is_some(),
            TypeSig::GenericInst(definition, args) => {
                self.is_sig_reachable(definition) && args.iter().all(|arg| self.is_sig_reachable(arg))
            }
            _ => true,
        }
    }
}
