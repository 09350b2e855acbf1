/// Composition tests: override policy, mixins, statics, type declarations,
/// default props, auto-binding, and mixin injection
use crate::tests_support::*;
use crate::*;

#[cfg(test)]
mod composition_tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn logging_mixin(log: &Log, name: &'static str) -> ClassSpec {
        let log = log.clone();
        ClassSpec::new().did_mount(move |_| {
            log.push(name);
            Ok(())
        })
    }

    fn render_div() -> ClassSpec {
        ClassSpec::new().render(|_| Ok(text("div", "")))
    }

    #[test]
    fn test_define_many_runs_mixins_depth_first_then_spec() {
        let log = Log::new();
        let spec_log = log.clone();

        let spec = render_div()
            .display_name("Ordered")
            .mixin(logging_mixin(&log, "a").mixin(logging_mixin(&log, "nested")))
            .mixin(logging_mixin(&log, "b"))
            .mixin(logging_mixin(&log, "c"))
            .did_mount(move |_| {
                spec_log.push("spec");
                Ok(())
            });

        let class = compose(spec);
        let mut rt = Runtime::new();
        rt.mount_root(class.element(Map::new())).unwrap();

        assert_eq!(log.entries(), vec!["nested", "a", "b", "c", "spec"]);
    }

    #[test]
    fn test_define_many_merged_unions_results() {
        let spec = render_div()
            .mixin(ClassSpec::new().initial_state(|_| Ok(Some(object(json!({ "fromMixin": 1 }))))))
            .initial_state(|_| Ok(Some(object(json!({ "fromSpec": 2 })))));

        let class = compose(spec);
        let mut rt = Runtime::new();
        let root = rt.mount_root(class.element(Map::new())).unwrap();

        let state = rt.state(root).unwrap().unwrap();
        assert_eq!(state.get("fromMixin"), Some(&Value::from(1)));
        assert_eq!(state.get("fromSpec"), Some(&Value::from(2)));
    }

    #[test]
    fn test_define_many_merged_collision_is_fatal() {
        let spec = render_div()
            .mixin(ClassSpec::new().initial_state(|_| Ok(Some(object(json!({ "shared": 1 }))))))
            .initial_state(|_| Ok(Some(object(json!({ "shared": 2 })))));

        let class = compose(spec);
        let mut rt = Runtime::new();
        let err = rt.mount_root(class.element(Map::new())).unwrap_err();

        assert_eq!(
            err,
            RuntimeError::MergeKeyCollision {
                key: "shared".to_string()
            }
        );
        assert_eq!(rt.instance_count(), 0);
    }

    #[test]
    fn test_define_many_merged_null_side_yields_other() {
        let spec = render_div()
            .mixin(ClassSpec::new().initial_state(|_| Ok(None)))
            .initial_state(|_| Ok(Some(object(json!({ "only": true })))));

        let class = compose(spec);
        let mut rt = Runtime::new();
        let root = rt.mount_root(class.element(Map::new())).unwrap();

        assert_eq!(rt.state(root).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_define_once_duplicate_is_rejected() {
        let spec = render_div()
            .display_name("Twice")
            .mixin(ClassSpec::new().should_update(|_, _, _, _| Ok(true)))
            .should_update(|_, _, _, _| Ok(false));

        let err = Composer::new().compose(&spec).unwrap_err();
        assert_eq!(
            err,
            ComposeError::DuplicateDefinition {
                component: "Twice".to_string(),
                name: "shouldComponentUpdate".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_plain_member_is_rejected() {
        let spec = render_div()
            .mixin(ClassSpec::new().member("label", "mixin"))
            .member("label", "spec");

        let err = Composer::new().compose(&spec).unwrap_err();
        assert!(matches!(err, ComposeError::DuplicateDefinition { ref name, .. } if name == "label"));
    }

    #[test]
    fn test_base_method_cannot_be_overridden() {
        let spec = render_div().method("setState", |_, _| Ok(Value::Undefined));

        let err = Composer::new().compose(&spec).unwrap_err();
        assert!(matches!(err, ComposeError::BaseMethodOverride { ref name, .. } if name == "setState"));
    }

    #[test]
    fn test_update_component_may_override_base() {
        let spec = render_div().update_component(|this, _| this.update_rendered_child());
        let class = compose(spec);
        assert!(class.has_hook(hooks::UPDATE_COMPONENT));
        assert!(!class.is_autobound(hooks::UPDATE_COMPONENT));
    }

    #[test]
    fn test_reserved_key_as_member_is_rejected() {
        let spec = render_div().member("propTypes", 1);
        let err = Composer::new().compose(&spec).unwrap_err();
        assert!(matches!(err, ComposeError::ReservedMember { ref name, .. } if name == "propTypes"));
    }

    #[test]
    fn test_hook_must_be_callable() {
        let spec = render_div().member("componentDidMount", "not a function");
        let err = Composer::new().compose(&spec).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::HookNotCallable { found: "string", .. }
        ));
    }

    #[test]
    fn test_missing_render_is_rejected() {
        let err = Composer::new()
            .compose(&ClassSpec::named("Empty"))
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::MissingRender {
                component: "Empty".to_string()
            }
        );
    }

    #[test]
    fn test_render_may_come_from_mixin() {
        let class = compose(ClassSpec::named("Borrowed").mixin(render_div()));
        assert!(class.has_hook(hooks::RENDER));
    }

    #[test]
    fn test_class_and_element_are_not_mixins() {
        let class = compose(render_div().display_name("Base"));

        let err = Composer::new()
            .compose(&render_div().mixin(class.clone()))
            .unwrap_err();
        assert!(matches!(err, ComposeError::MixinIsClass { ref mixin, .. } if mixin == "Base"));

        let err = Composer::new()
            .compose(&render_div().mixin(class.element(Map::new())))
            .unwrap_err();
        assert!(matches!(err, ComposeError::MixinIsElement { .. }));
    }

    #[test]
    fn test_type_checkers_must_be_callable() {
        let err = Composer::new()
            .compose(&render_div().display_name("Typed").prop_type("size", 3))
            .unwrap_err();

        assert_eq!(
            err,
            ComposeError::InvalidTypeChecker {
                component: "Typed".to_string(),
                location: TypeLocation::Prop,
                name: "size".to_string(),
                found: "number",
            }
        );
        assert_eq!(
            err.to_string(),
            "Typed: prop type `size` is invalid; it must be a function, got number"
        );
    }

    #[test]
    fn test_type_declarations_merge_across_mixins() {
        let any = || Callable::validator(|_, _, _, _| None);
        let class = compose(
            render_div()
                .mixin(ClassSpec::new().prop_type("a", any()).context_type("theme", any()))
                .prop_type("b", any()),
        );

        let names: Vec<&str> = class.prop_types().unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(class.context_types().unwrap().contains_key("theme"));
        assert!(class.child_context_types().is_none());
    }

    #[test]
    fn test_static_functions_are_sequenced() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first_calls = calls.clone();

        let class = compose(
            render_div()
                .mixin(ClassSpec::new().static_fn("build", move |_| {
                    first_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::from("mixin"))
                }))
                .static_fn("build", |_| Ok(Value::from("spec")))
                .statics("version", 2),
        );

        assert_eq!(class.call_static("build", &[]).unwrap(), Value::from("spec"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(class.static_member("version"), Some(&Value::from(2)));
        assert!(class.call_static("version", &[]).is_err());
    }

    #[test]
    fn test_static_value_redefinition_is_rejected() {
        let err = Composer::new()
            .compose(
                &render_div()
                    .mixin(ClassSpec::new().statics("version", 1))
                    .statics("version", 2),
            )
            .unwrap_err();
        assert!(matches!(err, ComposeError::StaticRedefinition { ref name, .. } if name == "version"));

        let err = Composer::new()
            .compose(&render_div().statics("mixins", 1))
            .unwrap_err();
        assert!(matches!(err, ComposeError::ReservedStatic { .. }));
    }

    #[test]
    fn test_default_props_merged_and_cached_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();

        let class = compose(
            render_div()
                .mixin(ClassSpec::new().default_props(|| object(json!({ "size": "small" }))))
                .default_props(move || {
                    counted.fetch_add(1, Ordering::SeqCst);
                    object(json!({ "tone": "neutral" }))
                }),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let defaults = class.default_props().unwrap();
        assert_eq!(defaults.get("size"), Some(&Value::from("small")));
        assert_eq!(defaults.get("tone"), Some(&Value::from("neutral")));

        let mut rt = Runtime::new();
        rt.mount_root(class.element(Map::new())).unwrap();
        rt.mount_root(class.element(Map::new())).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_props_must_be_an_object() {
        let spec = render_div()
            .display_name("BadDefaults")
            .member(
                hooks::GET_DEFAULT_PROPS,
                Callable::free(|_| Ok(Value::from(3))),
            );

        let err = Composer::new().compose(&spec).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::DefaultProps { ref component, .. } if component == "BadDefaults"
        ));
    }

    #[test]
    fn test_default_props_collision_is_reported() {
        let spec = render_div()
            .mixin(ClassSpec::new().default_props(|| object(json!({ "size": 1 }))))
            .default_props(|| object(json!({ "size": 2 })));

        let err = Composer::new().compose(&spec).unwrap_err();
        assert!(matches!(err, ComposeError::DefaultProps { ref message, .. } if message.contains("size")));
    }

    #[test]
    fn test_autobind_classification() {
        let class = compose(
            render_div()
                .method("handleClick", |_, _| Ok(Value::Undefined))
                .unbound_method("raw", |_, _| Ok(Value::Undefined))
                .member("label", "plain")
                .did_mount(|_| Ok(())),
        );

        let autobound: Vec<&str> = class.autobind_names().collect();
        assert_eq!(autobound, vec!["handleClick"]);
        assert!(!class.is_autobound("render"));
        assert!(!class.is_autobound("raw"));
        assert!(!class.is_autobound("label"));
    }

    #[test]
    fn test_display_name_defaults_and_last_wins() {
        assert_eq!(compose(render_div()).display_name(), "CompositeComponent");

        let class = compose(
            ClassSpec::named("Outer").mixin(render_div().display_name("Inner")),
        );
        assert_eq!(class.display_name(), "Outer");
    }

    #[test]
    fn test_explicit_registry_mixins_apply_first() {
        let log = Log::new();
        let mut registry = MixinRegistry::new();
        registry.inject(logging_mixin(&log, "injected"));

        let spec_log = log.clone();
        let class = Composer::with_registry(&registry)
            .compose(&render_div().did_mount(move |_| {
                spec_log.push("spec");
                Ok(())
            }))
            .unwrap();

        let mut rt = Runtime::new();
        rt.mount_root(class.element(Map::new())).unwrap();
        assert_eq!(log.entries(), vec!["injected", "spec"]);

        // Composers without the registry are unaffected.
        let plain = compose(render_div());
        assert!(!plain.has_hook(hooks::COMPONENT_DID_MOUNT));
    }

    #[test]
    fn test_global_injection_until_reset() {
        inject_mixin(ClassSpec::new().method("globallyInjectedHelper", |_, _| Ok(Value::from(7))));

        let class = create_class(&render_div()).unwrap();
        assert!(class.member("globallyInjectedHelper").is_some());

        reset_injected_mixins();
        let class = create_class(&render_div()).unwrap();
        assert!(class.member("globallyInjectedHelper").is_none());
    }

    #[test]
    fn test_class_unchanged_by_instances() {
        let class = compose(
            render_div()
                .method("handleClick", |_, _| Ok(Value::Undefined))
                .default_props(|| object(json!({ "size": 1 }))),
        );
        let members: Vec<String> = class.member_names().map(String::from).collect();
        let autobind: Vec<String> = class.autobind_names().map(String::from).collect();
        let defaults = class.default_props().cloned();

        let mut rt = Runtime::new();
        let root = rt
            .mount_root(class.element(object(json!({ "size": 2 }))))
            .unwrap();
        rt.set_state(root, object(json!({ "open": true }))).unwrap();
        rt.unmount_root(root).unwrap();

        assert_eq!(class.member_names().map(String::from).collect::<Vec<_>>(), members);
        assert_eq!(class.autobind_names().map(String::from).collect::<Vec<_>>(), autobind);
        assert_eq!(class.default_props().cloned(), defaults);
    }

    #[test]
    fn test_misspelled_should_update_still_composes() {
        let class = compose(render_div().method("componentShouldUpdate", |_, _| Ok(Value::from(false))));
        assert!(class.member("componentShouldUpdate").is_some());
        assert!(!class.has_hook(hooks::SHOULD_COMPONENT_UPDATE));
    }
}
