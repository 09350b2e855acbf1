/// Data pipeline tests: default props, type checking, context masking, and
/// child context
use crate::tests_support::*;
use crate::*;

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use serde_json::json;

    fn string_checker() -> Callable {
        Callable::validator(|values, name, component, location| {
            match values.get(name) {
                Some(Value::String(_)) | Some(Value::Undefined) | None => None,
                Some(other) => Some(format!(
                    "Invalid {} `{}` of type `{}` supplied to `{}`, expected `string`.",
                    location,
                    name,
                    other.type_name(),
                    component
                )),
            }
        })
    }

    fn required() -> Callable {
        Callable::validator(|values, name, component, location| {
            if values.get(name).map_or(true, Value::is_nullish) {
                Some(format!("Required {} `{}` was not specified in `{}`.", location, name, component))
            } else {
                None
            }
        })
    }

    #[test]
    fn test_defaults_fill_absent_and_undefined_keys() {
        let class = compose(
            ClassSpec::new()
                .default_props(|| object(json!({ "size": "medium", "tone": "neutral", "label": "?" })))
                .render(|_| Ok(text("p", ""))),
        );

        let mut props = object(json!({ "label": null }));
        props.insert("tone".to_string(), Value::Undefined);

        let mut rt = Runtime::new();
        let root = rt.mount_root(class.element(props)).unwrap();
        let props = rt.props(root).unwrap();

        assert_eq!(props.get("size"), Some(&Value::from("medium")));
        assert_eq!(props.get("tone"), Some(&Value::from("neutral")));
        assert_eq!(props.get("label"), Some(&Value::Null));
    }

    #[test]
    fn test_prop_type_mismatch_is_advisory() {
        let class = compose(
            ClassSpec::named("Badge")
                .prop_type("label", string_checker())
                .render(|this| Ok(text("span", this.prop("label")))),
        );

        let mut rt = dev_runtime();
        let root = rt
            .mount_root(class.element(object(json!({ "label": 42 }))))
            .unwrap();

        assert!(rt.is_mounted(root));
        let warnings = rt.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, ValidationLevel::Warning);
        assert_eq!(warnings[0].component.as_deref(), Some("Badge"));
        assert_eq!(warnings[0].location, Some(TypeLocation::Prop));
        assert_eq!(
            warnings[0].message,
            "Invalid prop `label` of type `number` supplied to `Badge`, expected `string`."
        );
        assert!(rt.warnings().is_empty());
    }

    #[test]
    fn test_props_are_checked_on_every_receive() {
        let class = compose(
            ClassSpec::named("Badge")
                .prop_type("label", required())
                .render(|_| Ok(text("span", ""))),
        );

        let mut rt = dev_runtime();
        let root = rt
            .mount_root(class.element(object(json!({ "label": "ok" }))))
            .unwrap();
        assert!(rt.warnings().is_empty());

        rt.update_root(root, class.element(Map::new())).unwrap();
        assert_eq!(rt.warnings().len(), 1);
        assert!(rt.warnings()[0].message.starts_with("Required prop `label`"));
    }

    #[test]
    fn test_repeated_prop_warning_is_kept_once() {
        let class = compose(
            ClassSpec::named("Badge")
                .prop_type("label", required())
                .render(|_| Ok(text("span", ""))),
        );

        let mut rt = dev_runtime();
        let root = rt.mount_root(class.element(Map::new())).unwrap();
        for _ in 0..5 {
            rt.update_root(root, class.element(Map::new())).unwrap();
        }

        assert_eq!(rt.warnings().len(), 1);
        assert_eq!(rt.warnings()[0].component.as_deref(), Some("Badge"));
    }

    #[test]
    fn test_checker_object_result_and_failure() {
        let class = compose(
            ClassSpec::named("Odd")
                .prop_type(
                    "a",
                    Callable::free(|_| Ok(Value::Object(object(json!({ "message": "bad a" }))))),
                )
                .prop_type("b", Callable::free(|_| Err(RuntimeError::hook("checker exploded"))))
                .prop_type("c", Callable::free(|_| Ok(Value::from(false))))
                .render(|_| Ok(text("p", ""))),
        );

        let mut rt = dev_runtime();
        rt.mount_root(class.element(Map::new())).unwrap();

        let warnings = rt.take_warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].message, "bad a");
        assert_eq!(warnings[0].level, ValidationLevel::Warning);
        assert_eq!(warnings[1].level, ValidationLevel::Error);
        assert!(warnings[1].message.contains("checker exploded"));
    }

    #[test]
    fn test_validation_disabled() {
        let class = compose(
            ClassSpec::new()
                .prop_type("label", required())
                .render(|_| Ok(text("p", ""))),
        );

        let mut rt = Runtime::with_options(RuntimeOptions::production());
        rt.mount_root(class.element(Map::new())).unwrap();
        assert!(rt.warnings().is_empty());
    }

    #[test]
    fn test_warnings_not_collected_when_disabled() {
        let class = compose(
            ClassSpec::new()
                .prop_type("label", required())
                .render(|_| Ok(text("p", ""))),
        );

        let options = RuntimeOptions {
            validate_types: true,
            collect_warnings: false,
            ..Default::default()
        };
        let mut rt = Runtime::with_options(options);
        rt.mount_root(class.element(Map::new())).unwrap();
        assert!(rt.warnings().is_empty());
    }

    #[test]
    fn test_context_is_masked_to_declared_keys() {
        let log = Log::new();
        let render_log = log.clone();

        let class = compose(
            ClassSpec::new()
                .context_type("theme", string_checker())
                .context_type("user", string_checker())
                .render(move |this| {
                    let context = this.context().unwrap();
                    render_log.push(format!(
                        "keys={:?} theme={:?} user={:?}",
                        context.keys().collect::<Vec<_>>(),
                        this.context_value("theme"),
                        this.context_value("user")
                    ));
                    Ok(text("p", ""))
                }),
        );

        let mut rt = dev_runtime();
        let root = rt
            .mount_root_with_context(
                class.element(Map::new()),
                object(json!({ "theme": "dark", "secret": "hidden" })),
            )
            .unwrap();

        assert_eq!(
            log.entries(),
            vec![r#"keys=["theme", "user"] theme="dark" user=undefined"#]
        );
        let context = rt.context(root).unwrap().unwrap();
        assert_eq!(context.get("user"), Some(&Value::Undefined));
        assert!(context.get("secret").is_none());
    }

    #[test]
    fn test_no_context_types_means_no_context() {
        let class = compose(ClassSpec::new().render(|_| Ok(text("p", ""))));

        let mut rt = Runtime::new();
        let root = rt
            .mount_root_with_context(class.element(Map::new()), object(json!({ "theme": "dark" })))
            .unwrap();
        assert!(rt.context(root).unwrap().is_none());
    }

    #[test]
    fn test_context_mismatch_reported_at_context_location() {
        let class = compose(
            ClassSpec::named("Themed")
                .context_type("theme", string_checker())
                .render(|_| Ok(text("p", ""))),
        );

        let mut rt = dev_runtime();
        rt.mount_root_with_context(class.element(Map::new()), object(json!({ "theme": 1 })))
            .unwrap();

        let warnings = rt.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].location, Some(TypeLocation::Context));
    }

    fn themed_child(log: &Log) -> ComponentClass {
        let log = log.clone();
        compose(
            ClassSpec::named("ThemedChild")
                .context_type("theme", string_checker())
                .context_type("locale", string_checker())
                .render(move |this| {
                    log.push(format!(
                        "{:?}/{:?}",
                        this.context_value("theme"),
                        this.context_value("locale")
                    ));
                    Ok(text("p", this.context_value("theme")))
                }),
        )
    }

    #[test]
    fn test_child_context_merges_over_ambient() {
        let log = Log::new();
        let child = themed_child(&log);

        let provider = compose(
            ClassSpec::named("ThemeProvider")
                .child_context_type("theme", string_checker())
                .initial_state(|_| Ok(Some(object(json!({ "theme": "dark" })))))
                .child_context(|this| {
                    let mut context = Map::new();
                    context.insert("theme".to_string(), this.state_value("theme"));
                    Ok(context)
                })
                .render(move |_| Ok(child.element(Map::new()))),
        );

        let mut rt = dev_runtime();
        let root = rt
            .mount_root_with_context(
                provider.element(Map::new()),
                object(json!({ "theme": "light", "locale": "en" })),
            )
            .unwrap();
        assert_eq!(log.take(), vec![r#""dark"/"en""#]);

        // A state change on the provider flows down as new context.
        rt.set_state(root, object(json!({ "theme": "contrast" }))).unwrap();
        assert_eq!(log.take(), vec![r#""contrast"/"en""#]);

        let child_id = rt.rendered_child(root).unwrap();
        assert_eq!(
            rt.context(child_id).unwrap().unwrap().get("theme"),
            Some(&Value::from("contrast"))
        );
        assert!(rt.warnings().is_empty());
    }

    #[test]
    fn test_child_context_requires_declarations() {
        let class = compose(
            ClassSpec::named("Provider")
                .child_context(|_| Ok(Map::new()))
                .render(|_| Ok(text("p", ""))),
        );

        let mut rt = Runtime::new();
        let err = rt.mount_root(class.element(Map::new())).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::MissingChildContextTypes {
                component: "Provider".to_string()
            }
        );
    }

    #[test]
    fn test_child_context_rejects_undeclared_keys() {
        let class = compose(
            ClassSpec::named("Provider")
                .child_context_type("theme", string_checker())
                .child_context(|_| Ok(object(json!({ "theme": "dark", "extra": 1 }))))
                .render(|_| Ok(text("p", ""))),
        );

        let mut rt = Runtime::new();
        let err = rt.mount_root(class.element(Map::new())).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UndeclaredChildContextKey {
                component: "Provider".to_string(),
                key: "extra".to_string()
            }
        );
    }

    #[test]
    fn test_child_context_must_be_an_object() {
        let class = compose(
            ClassSpec::named("Provider")
                .child_context_type("theme", string_checker())
                .method(hooks::GET_CHILD_CONTEXT, |_, _| Ok(Value::from("dark")))
                .render(|_| Ok(text("p", ""))),
        );

        let mut rt = Runtime::new();
        let err = rt.mount_root(class.element(Map::new())).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidChildContext { found: "string", .. }));
    }

    #[test]
    fn test_should_update_false_keeps_child_context() {
        let log = Log::new();
        let child = themed_child(&log);

        let provider = compose(
            ClassSpec::named("FrozenProvider")
                .child_context_type("theme", string_checker())
                .initial_state(|_| Ok(Some(object(json!({ "theme": "dark" })))))
                .child_context(|this| Ok(object(json!({ "theme": this.state_value("theme").as_str() }))))
                .should_update(|_, _, _, _| Ok(false))
                .render(move |_| Ok(child.element(Map::new()))),
        );

        let mut rt = Runtime::new();
        let root = rt.mount_root(provider.element(Map::new())).unwrap();
        log.take();

        rt.set_state(root, object(json!({ "theme": "contrast" }))).unwrap();

        assert!(log.entries().is_empty());
        let child_id = rt.rendered_child(root).unwrap();
        assert_eq!(
            rt.context(child_id).unwrap().unwrap().get("theme"),
            Some(&Value::from("dark"))
        );
    }
}
