//! Effective props, masked context, and derived child context.
//!
//! Type checkers are advisory: a mismatch or a failing checker becomes a
//! [`ValidationWarning`], never an error. Child-context contract violations
//! are real errors.

use crate::class::{ComponentClass, TypeDecls};
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::InstanceId;
use crate::runtime::Runtime;
use crate::spec::hooks;
use crate::validator::{TypeLocation, ValidationWarning};
use crate::value::{Map, Value};

impl Runtime {
    /// Raw props over the class defaults. A default fills a key that is
    /// absent or `Undefined`; an explicit `Null` is kept.
    pub(crate) fn process_props(&mut self, class: &ComponentClass, raw: &Map) -> Map {
        let mut props = raw.clone();

        if let Some(defaults) = class.default_props() {
            for (name, value) in defaults {
                if matches!(props.get(name), None | Some(Value::Undefined)) {
                    props.insert(name.clone(), value.clone());
                }
            }
        }

        if let Some(types) = class.prop_types() {
            self.check_types(class, types, &props, TypeLocation::Prop);
        }
        props
    }

    /// Exactly the declared context keys, `Undefined` when the ambient
    /// context lacks one. `None` when nothing is declared.
    pub(crate) fn mask_context(&mut self, class: &ComponentClass, ambient: &Map) -> Option<Map> {
        let types = class.context_types()?;

        let masked: Map = types
            .keys()
            .map(|name| (name.clone(), ambient.get(name).cloned().unwrap_or_default()))
            .collect();

        self.check_types(class, types, &masked, TypeLocation::Context);
        Some(masked)
    }

    /// Context handed to the rendered subtree: `getChildContext()` merged
    /// over the ambient context
    pub(crate) fn process_child_context(
        &mut self,
        id: InstanceId,
        class: &ComponentClass,
        ambient: &Map,
    ) -> RuntimeResult<Map> {
        if !class.has_hook(hooks::GET_CHILD_CONTEXT) {
            return Ok(ambient.clone());
        }

        let component = class.display_name().to_string();
        let types = class
            .child_context_types()
            .ok_or_else(|| RuntimeError::MissingChildContextTypes {
                component: component.clone(),
            })?;

        let child_context = match self.call_hook(id, hooks::GET_CHILD_CONTEXT, &[])? {
            Some(Value::Object(child_context)) => child_context,
            Some(value) if !value.is_nullish() => {
                return Err(RuntimeError::InvalidChildContext {
                    component,
                    found: value.type_name(),
                })
            }
            _ => return Ok(ambient.clone()),
        };

        self.check_types(class, types, &child_context, TypeLocation::ChildContext);

        if let Some(key) = child_context.keys().find(|key| !types.contains_key(*key)) {
            return Err(RuntimeError::UndeclaredChildContextKey {
                component,
                key: key.clone(),
            });
        }

        let mut merged = ambient.clone();
        merged.extend(child_context);
        Ok(merged)
    }

    /// Runs every declared checker as `(values, name, component, location)`
    fn check_types(
        &mut self,
        class: &ComponentClass,
        types: &TypeDecls,
        values: &Map,
        location: TypeLocation,
    ) {
        if !self.options.validate_types {
            return;
        }

        let component = class.display_name();
        let subject = Value::Object(values.clone());

        for (name, checker) in types {
            let args = [
                subject.clone(),
                Value::from(name.as_str()),
                Value::from(component),
                Value::from(location.as_str()),
            ];

            let warning = match checker.call_detached(&args) {
                Ok(Value::String(message)) => Some(ValidationWarning::warning(message)),
                Ok(Value::Object(error)) => Some(ValidationWarning::warning(
                    error
                        .get("message")
                        .map(Value::to_display_string)
                        .unwrap_or_else(|| format!("invalid {} `{}`", location, name)),
                )),
                Ok(_) => None,
                Err(e) => Some(ValidationWarning::error(format!(
                    "{} type `{}` checker failed: {}",
                    location, name, e
                ))),
            };

            if let Some(warning) = warning {
                self.diagnostics
                    .report(warning.with_component(component).at(location));
            }
        }
    }
}
