use indexmap::IndexMap;

use registrar_core::canonical::{CodeGen, NamedInstance};
use registrar_parser::resolve::ResolvedModel;

/// Per-document lookup state for token derivation.
///
/// Built once from a [`ResolvedModel`] and passed to every derivation call.
/// Nothing is cached outside of it, so independent documents never share
/// state.
#[derive(Debug, Clone)]
pub struct DerivationContext<'a> {
    model: &'a ResolvedModel,
    instances: IndexMap<&'a str, &'a NamedInstance>,
}

impl<'a> DerivationContext<'a> {
    pub fn new(model: &'a ResolvedModel) -> Self {
        let instances = model
            .instances()
            .iter()
            .map(|(name, instance)| (name.as_str(), instance))
            .collect();
        Self { model, instances }
    }

    pub fn model(&self) -> &'a ResolvedModel {
        self.model
    }

    pub fn code_gen(&self) -> &'a CodeGen {
        self.model.configuration().code_gen()
    }

    pub fn registry_class_name(&self) -> &'a str {
        self.code_gen().registry_class_name()
    }

    pub fn initializer_name(&self) -> &'a str {
        self.code_gen().initializer_name()
    }

    /// Look up a named instance that survived resolution.
    pub fn instance(&self, name: &str) -> Option<&'a NamedInstance> {
        self.instances.get(name).copied()
    }

    /// Every resolved named instance, in declaration order.
    pub fn instances(&self) -> impl Iterator<Item = &'a NamedInstance> + '_ {
        self.instances.values().copied()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` when `type_name` names an interface of the document.
    pub fn is_interface(&self, type_name: &str) -> bool {
        self.model.interfaces().contains_key(type_name)
    }

    /// Expression reading a named instance through the registry's internal
    /// accessor, e.g. `Registry.MyFooInternal`.
    pub fn accessor_expression(&self, name: &str) -> String {
        format!("{}.{name}Internal", self.registry_class_name())
    }
}
