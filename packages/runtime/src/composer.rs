//! Class composition.
//!
//! Merges injected mixins, a specification's mixins (depth-first,
//! left-to-right), and finally the specification itself into a single
//! prototype. Every member name is checked against the interface policy table
//! before it is merged:
//!
//! - base runtime methods may only be replaced when declared `OverrideBase`
//! - a name already in the prototype may only be redefined when its policy is
//!   `DefineMany` (chained) or `DefineManyMerged` (results merged)
//! - everything else is assigned once
//!
//! Plain function members outside the interface are recorded for auto-binding.
//! Composition never touches an instance.

use crate::callable::Callable;
use crate::class::{ClassDef, ComponentClass, TypeDecls, DEFAULT_DISPLAY_NAME};
use crate::error::{ComposeError, ComposeResult};
use crate::registry::{self, MixinRegistry};
use crate::spec::{
    hooks, interface_policy, is_base_method, is_reserved_key, ClassSpec, Mixin, SpecMember,
    SpecPolicy,
};
use crate::validator::TypeLocation;
use crate::value::Value;
use tracing::{debug, instrument, warn};

/// Composes class specifications into component classes
#[derive(Debug, Clone, Default)]
pub struct Composer {
    /// Mixins applied before every specification
    injected: Vec<Mixin>,
}

/// Compose a specification with the process-wide injected mixins
pub fn create_class(spec: &ClassSpec) -> ComposeResult<ComponentClass> {
    Composer::global().compose(spec)
}

impl Composer {
    /// Composer without injected mixins
    pub fn new() -> Self {
        Self::default()
    }

    /// Composer applying the mixins of an explicit registry
    pub fn with_registry(registry: &MixinRegistry) -> Self {
        Self {
            injected: registry.mixins().to_vec(),
        }
    }

    /// Composer applying the process-wide injected mixins
    pub fn global() -> Self {
        Self {
            injected: registry::injected_mixins(),
        }
    }

    #[instrument(skip(self, spec), fields(display_name = spec.display_name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME), injected = self.injected.len()))]
    pub fn compose(&self, spec: &ClassSpec) -> ComposeResult<ComponentClass> {
        let mut builder = ClassBuilder::new(spec.display_name.clone());

        for mixin in &self.injected {
            builder.mix(mixin)?;
        }
        builder.mix_spec(spec)?;

        let class = builder.finish()?;
        debug!(
            members = class.member_names().count(),
            autobind = class.autobind_names().count(),
            "Composed component class"
        );
        Ok(class)
    }
}

struct ClassBuilder {
    /// Name used in error messages until the final display name is known
    label: String,
    def: ClassDef,
}

impl ClassBuilder {
    fn new(primary_name: Option<String>) -> Self {
        Self {
            label: primary_name.unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            def: ClassDef::default(),
        }
    }

    fn mix(&mut self, mixin: &Mixin) -> ComposeResult<()> {
        match mixin {
            Mixin::Spec(spec) => self.mix_spec(spec),
            Mixin::Class(class) => Err(ComposeError::MixinIsClass {
                component: self.label.clone(),
                mixin: class.display_name().to_string(),
            }),
            Mixin::Element(element) => Err(ComposeError::MixinIsElement {
                component: self.label.clone(),
                mixin: element.type_name(),
            }),
        }
    }

    fn mix_spec(&mut self, spec: &ClassSpec) -> ComposeResult<()> {
        for mixin in &spec.mixins {
            self.mix(mixin)?;
        }

        if let Some(name) = &spec.display_name {
            self.def.display_name = Some(name.clone());
        }

        self.mix_statics(&spec.statics)?;
        merge_type_decls(
            &mut self.def.prop_types,
            &spec.prop_types,
            TypeLocation::Prop,
            &self.label,
        )?;
        merge_type_decls(
            &mut self.def.context_types,
            &spec.context_types,
            TypeLocation::Context,
            &self.label,
        )?;
        merge_type_decls(
            &mut self.def.child_context_types,
            &spec.child_context_types,
            TypeLocation::ChildContext,
            &self.label,
        )?;

        for member in &spec.members {
            self.mix_member(member)?;
        }

        Ok(())
    }

    fn validate_override(&self, name: &str) -> ComposeResult<Option<SpecPolicy>> {
        let policy = interface_policy(name);

        if is_base_method(name) && policy != Some(SpecPolicy::OverrideBase) {
            return Err(ComposeError::BaseMethodOverride {
                component: self.label.clone(),
                name: name.to_string(),
            });
        }

        if self.def.prototype.contains_key(name)
            && !matches!(
                policy,
                Some(SpecPolicy::DefineMany) | Some(SpecPolicy::DefineManyMerged)
            )
        {
            return Err(ComposeError::DuplicateDefinition {
                component: self.label.clone(),
                name: name.to_string(),
            });
        }

        Ok(policy)
    }

    fn mix_member(&mut self, member: &SpecMember) -> ComposeResult<()> {
        let name = member.name.as_str();
        if is_reserved_key(name) {
            return Err(ComposeError::ReservedMember {
                component: self.label.clone(),
                name: name.to_string(),
            });
        }

        let policy = self.validate_override(name)?;

        if policy.is_some() && !member.value.is_function() {
            return Err(ComposeError::HookNotCallable {
                component: self.label.clone(),
                name: name.to_string(),
                found: member.value.type_name(),
            });
        }

        let existing = self.def.prototype.get(name).cloned();
        let should_autobind =
            member.value.is_function() && policy.is_none() && existing.is_none() && member.bindable;

        if should_autobind {
            self.def.autobind.insert(name.to_string());
            self.def.prototype.insert(name.to_string(), member.value.clone());
            return Ok(());
        }

        let merged = match (existing, policy, &member.value) {
            (Some(Value::Function(old)), Some(SpecPolicy::DefineMany), Value::Function(new)) => {
                Value::Function(Callable::chain(old, new.clone()))
            }
            (
                Some(Value::Function(old)),
                Some(SpecPolicy::DefineManyMerged),
                Value::Function(new),
            ) => Value::Function(Callable::merge(old, new.clone())),
            (Some(_), _, _) => {
                return Err(ComposeError::DuplicateDefinition {
                    component: self.label.clone(),
                    name: name.to_string(),
                })
            }
            (None, _, value) => value.clone(),
        };

        self.def.prototype.insert(name.to_string(), merged);
        Ok(())
    }

    fn mix_statics(&mut self, statics: &[(String, Value)]) -> ComposeResult<()> {
        for (name, value) in statics {
            if is_reserved_key(name) {
                return Err(ComposeError::ReservedStatic {
                    component: self.label.clone(),
                    name: name.clone(),
                });
            }

            let merged = match (self.def.statics.get(name), value) {
                (None, value) => value.clone(),
                (Some(Value::Function(old)), Value::Function(new)) => {
                    Value::Function(Callable::sequence(old.clone(), new.clone()))
                }
                (Some(_), _) => {
                    return Err(ComposeError::StaticRedefinition {
                        component: self.label.clone(),
                        name: name.clone(),
                    })
                }
            };
            self.def.statics.insert(name.clone(), merged);
        }
        Ok(())
    }

    fn finish(mut self) -> ComposeResult<ComponentClass> {
        let component = self
            .def
            .display_name
            .clone()
            .unwrap_or_else(|| self.label.clone());

        if !self
            .def
            .prototype
            .get(hooks::RENDER)
            .is_some_and(Value::is_function)
        {
            return Err(ComposeError::MissingRender { component });
        }

        if self.def.prototype.contains_key("componentShouldUpdate") {
            warn!(
                component = %component,
                "componentShouldUpdate() is defined; did you mean shouldComponentUpdate()?"
            );
        }

        if let Some(Value::Function(factory)) = self.def.prototype.get(hooks::GET_DEFAULT_PROPS) {
            self.def.default_props = match factory.call_detached(&[]) {
                Ok(Value::Object(map)) => Some(map),
                Ok(value) if value.is_nullish() => None,
                Ok(other) => {
                    return Err(ComposeError::DefaultProps {
                        component,
                        message: format!("must return an object or null, got {}", other.type_name()),
                    })
                }
                Err(e) => {
                    return Err(ComposeError::DefaultProps {
                        component,
                        message: e.to_string(),
                    })
                }
            };
        }

        Ok(ComponentClass::from_def(self.def))
    }
}

/// Validates that every checker is callable, then shallow-merges the
/// declarations (later definitions win per name).
fn merge_type_decls(
    target: &mut Option<TypeDecls>,
    decls: &[(String, Value)],
    location: TypeLocation,
    component: &str,
) -> ComposeResult<()> {
    if decls.is_empty() {
        return Ok(());
    }

    let merged = target.get_or_insert_with(TypeDecls::new);
    for (name, checker) in decls {
        match checker {
            Value::Function(callable) => {
                merged.insert(name.clone(), callable.clone());
            }
            other => {
                return Err(ComposeError::InvalidTypeChecker {
                    component: component.to_string(),
                    location,
                    name: name.clone(),
                    found: other.type_name(),
                })
            }
        }
    }
    Ok(())
}
