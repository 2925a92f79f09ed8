use crate::{
    call_factory, definitions, factory, reference, resolve, resolve_class,
    value, Arguments, CallTarget, Callable, ClassInfo, ClassKind, ClassTable,
    Container, ContainerError, ContainerResult, Injectable, Method, Overrides,
    ParameterInfo, Registry, Svc, Value,
};
use std::{
    error::Error as _,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

#[derive(Debug)]
struct Class1 {
    parameter: Mutex<String>,
}

impl Class1 {
    fn new(parameter: &str) -> Self {
        Class1 {
            parameter: Mutex::new(parameter.to_owned()),
        }
    }

    fn parameter(&self) -> String {
        self.parameter.lock().unwrap().clone()
    }
}

impl Injectable for Class1 {
    const CLASS: &'static str = "Class1";

    fn parameters() -> Vec<ParameterInfo> {
        Vec::new()
    }

    fn construct(_arguments: Arguments) -> ContainerResult<Self> {
        Ok(Class1::new("init"))
    }
}

struct Class2 {
    class1: Svc<Class1>,
}

impl Injectable for Class2 {
    const CLASS: &'static str = "Class2";

    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("class1").typed("Class1")]
    }

    fn construct(arguments: Arguments) -> ContainerResult<Self> {
        Ok(Class2 {
            class1: arguments.object("class1")?,
        })
    }
}

struct Class2OptionalValue {
    value: Mutex<String>,
}

impl Injectable for Class2OptionalValue {
    const CLASS: &'static str = "Class2OptionalValue";

    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("value")
            .builtin("string")
            .with_default("test")]
    }

    fn construct(arguments: Arguments) -> ContainerResult<Self> {
        Ok(Class2OptionalValue {
            value: Mutex::new(arguments.string("value")?),
        })
    }
}

struct Class100;

impl Injectable for Class100 {
    const CLASS: &'static str = "Class100";

    fn parameters() -> Vec<ParameterInfo> {
        Vec::new()
    }

    fn construct(_arguments: Arguments) -> ContainerResult<Self> {
        Ok(Class100)
    }
}

struct Class2RequireInterface1;

impl Injectable for Class2RequireInterface1 {
    const CLASS: &'static str = "Class2RequireInterface1";

    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("interface").typed("Interface1")]
    }

    fn construct(arguments: Arguments) -> ContainerResult<Self> {
        arguments.object::<Class100>("interface")?;
        Ok(Class2RequireInterface1)
    }
}

struct Class2OptionalInterface1 {
    interface: Option<Svc<Class100>>,
}

impl Injectable for Class2OptionalInterface1 {
    const CLASS: &'static str = "Class2OptionalInterface1";

    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("interface")
            .typed("Interface1")
            .with_default(Value::Null)]
    }

    fn construct(arguments: Arguments) -> ContainerResult<Self> {
        Ok(Class2OptionalInterface1 {
            interface: arguments.optional_object("interface")?,
        })
    }
}

struct Circular1;

impl Injectable for Circular1 {
    const CLASS: &'static str = "Circular1";

    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("class").typed("Circular2")]
    }

    fn construct(_arguments: Arguments) -> ContainerResult<Self> {
        Ok(Circular1)
    }
}

struct Circular2;

impl Injectable for Circular2 {
    const CLASS: &'static str = "Circular2";

    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("class").typed("Circular1")]
    }

    fn construct(_arguments: Arguments) -> ContainerResult<Self> {
        Ok(Circular2)
    }
}

#[derive(Clone, Default)]
struct ClassWithMethod {
    label: String,
}

impl Injectable for ClassWithMethod {
    const CLASS: &'static str = "ClassWithMethod";

    fn parameters() -> Vec<ParameterInfo> {
        Vec::new()
    }

    fn construct(_arguments: Arguments) -> ContainerResult<Self> {
        Ok(ClassWithMethod::default())
    }

    fn methods() -> Vec<Method> {
        let class1 = || vec![ParameterInfo::new("class1").typed("Class1")];
        vec![
            Method::new("callMe", class1(), |_: &Value, arguments: Arguments| {
                arguments.value("class1")
            }),
            Method::new_static(
                "callMeStatic",
                class1(),
                |_: &Value, arguments: Arguments| arguments.value("class1"),
            ),
            Method::new("me", Vec::new(), |receiver: &Value, _: Arguments| {
                Ok(receiver.clone())
            }),
        ]
    }
}

struct ClassWithDefaultArgument {
    value: i64,
}

impl Injectable for ClassWithDefaultArgument {
    const CLASS: &'static str = "ClassWithDefaultArgument";

    fn parameters() -> Vec<ParameterInfo> {
        vec![ParameterInfo::new("value").builtin("int").with_default(5)]
    }

    fn construct(arguments: Arguments) -> ContainerResult<Self> {
        Ok(ClassWithDefaultArgument {
            value: arguments.int("value")?,
        })
    }
}

struct Class200 {
    some_string: Value,
    more_strings: String,
}

impl Injectable for Class200 {
    const CLASS: &'static str = "Class200";

    fn parameters() -> Vec<ParameterInfo> {
        vec![
            ParameterInfo::new("class1").typed("Class1"),
            ParameterInfo::new("someString").with_default(Value::Null),
            ParameterInfo::new("moreStrings").with_default("12"),
        ]
    }

    fn construct(arguments: Arguments) -> ContainerResult<Self> {
        arguments.object::<Class1>("class1")?;
        Ok(Class200 {
            some_string: arguments.value("someString")?,
            more_strings: arguments.string("moreStrings")?,
        })
    }
}

struct Wrapper {
    inner: Svc<Class1>,
}

/// Queries its container when dropped.
struct ReentrantDrop {
    container: Container,
    dropped: Arc<AtomicBool>,
}

impl Drop for ReentrantDrop {
    fn drop(&mut self) {
        let found = self.container.has("guard");
        self.dropped.store(found, Ordering::SeqCst);
    }
}

fn classes() -> ClassTable {
    let mut table = ClassTable::new();
    table
        .register::<Class1>()
        .register::<Class2>()
        .register::<Class2OptionalValue>()
        .register::<Class100>()
        .register::<Class2RequireInterface1>()
        .register::<Class2OptionalInterface1>()
        .register::<Circular1>()
        .register::<Circular2>()
        .register::<ClassWithMethod>()
        .register::<ClassWithDefaultArgument>()
        .register::<Class200>()
        .register_info(ClassInfo::interface("Interface1"))
        .register_info(ClassInfo::abstract_class("AbstractClass1"))
        .register_function(
            "double",
            Callable::function(
                vec![ParameterInfo::new("value").builtin("int")],
                |arguments: Arguments| Ok(Value::Int(arguments.int("value")? * 2)),
            ),
        );
    table
}

fn container(registry: Registry) -> Container {
    Container::builder()
        .reflection(classes())
        .definitions(registry)
        .build()
        .unwrap()
}

fn compiled(registry: Registry) -> Container {
    Container::builder()
        .reflection(classes())
        .definitions(registry)
        .enable_compiling()
        .build()
        .unwrap()
}

fn twelve() -> Callable {
    Callable::function(Vec::new(), |_: Arguments| Ok(Value::Int(12)))
}

/// A copyable receiver tagged as `ClassWithMethod`.
fn receiver(label: &str) -> Value {
    let instance = ClassWithMethod {
        label: label.to_owned(),
    };
    crate::tag_class(Value::cloneable(instance), ClassWithMethod::CLASS)
}

fn class_name(value: &Value) -> Option<&str> {
    value.as_instance().map(|instance| instance.class_name())
}

/// A factory closure counting how many times it was invoked.
fn counted() -> (Callable, Arc<AtomicUsize>) {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let callable = Callable::closure(Vec::new(), move |_: Arguments| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::object(Class100))
    });
    (callable, builds)
}

#[test]
fn get_raw_value() {
    let container = container(definitions! {
        "key" => Value::from("value"),
    });
    assert_eq!(Value::from("value"), container.get("key").unwrap());
}

#[test]
fn get_factory() {
    let container = container(definitions! {
        "key" => factory(twelve()),
    });
    assert_eq!(Value::Int(12), container.get("key").unwrap());
}

#[test]
fn get_factory_with_definition_parameter() {
    let callable = Callable::function(
        vec![ParameterInfo::new("instance").typed("Class1")],
        |arguments: Arguments| {
            arguments.object::<Class1>("instance")?;
            Ok(Value::Int(12))
        },
    );
    let container = container(definitions! {
        "key" => factory(callable).parameter("instance", resolve_class("Class1")),
    });
    assert_eq!(Value::Int(12), container.get("key").unwrap());
}

#[test]
fn get_bare_callable() {
    let container = container(definitions! {
        "key" => twelve(),
    });
    assert_eq!(Value::Int(12), container.get("key").unwrap());
}

#[test]
fn get_non_definitions() {
    let container = container(definitions! {
        "hei" => Value::from("lol"),
        "heisann" => Callable::function(Vec::new(), |_: Arguments| Ok(Value::from("null"))),
        "lol2" => Value::Bool(false),
        "qs" => Value::Bool(true),
        "qs2" => Value::Int(0),
        "qs3" => Value::Int(1),
        "qs4" => Value::from(""),
    });

    assert_eq!(Value::from("lol"), container.get("hei").unwrap());
    assert_eq!(Value::from("null"), container.get("heisann").unwrap());
    assert_eq!(Value::Bool(false), container.get("lol2").unwrap());
    assert_eq!(Value::Bool(true), container.get("qs").unwrap());
    assert_eq!(Value::Int(0), container.get("qs2").unwrap());
    assert_eq!(Value::Int(1), container.get("qs3").unwrap());
    assert_eq!(Value::from(""), container.get("qs4").unwrap());
}

#[test]
fn get_object_is_tagged_with_its_class() {
    let container = container(definitions! {
        "key" => resolve_class("Class1"),
    });
    let value = container.get("key").unwrap();
    assert_eq!(Some("Class1"), class_name(&value));
    assert!(value.downcast::<Class1>().is_some());
}

#[test]
fn circular_dependency_is_detected() {
    let container = container(definitions! {
        "Circular1" => resolve(),
        "Circular2" => resolve(),
    });

    let error = container.get("Circular1").unwrap_err();
    assert!(error.is_circular());
    match error.root_cause() {
        ContainerError::CircularDependency { id } => assert_eq!("Circular1", id),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        "circular dependency detected while resolving entry Circular1",
        error.root_cause().to_string()
    );
    assert_eq!(0, container.in_flight_len());

    // Unrelated entries still resolve afterwards.
    assert!(container.get("Class1").is_ok());
    assert!(container.get("Circular2").unwrap_err().is_circular());
    assert_eq!(0, container.in_flight_len());
}

#[test]
fn self_reference_is_circular() {
    let container = container(definitions! {
        "a" => reference("a"),
    });
    assert!(container.get("a").unwrap_err().is_circular());
    assert_eq!(0, container.in_flight_len());
}

#[test]
fn factory_from_method_target() {
    let target = CallTarget::method_on(receiver("factory"), "callMe");
    let container = container(definitions! {
        "key" => call_factory(target),
    });
    let value = container.get("key").unwrap();
    assert_eq!(Some("Class1"), class_name(&value));
}

#[test]
fn class_definition_with_reference_parameter() {
    let container = container(definitions! {
        "class1" => resolve_class("Class1"),
        "class2" => resolve_class("Class2").parameter("class1", reference("class1")),
    });

    let class1 = container.get("class1").unwrap();
    let class2 = container.get("class2").unwrap().downcast::<Class2>().unwrap();
    assert_eq!(class1, Value::shared(class2.class1.clone()));
}

#[test]
fn class_definition_with_parameters() {
    let container = container(definitions! {
        "key" => resolve_class("Class2OptionalValue").parameter("value", "lol"),
    });
    let value = container.get("key").unwrap().downcast::<Class2OptionalValue>().unwrap();
    assert_eq!("lol", *value.value.lock().unwrap());
}

#[test]
fn class_definition_with_parameters_is_not_shared() {
    let container = container(definitions! {
        "key1" => resolve_class("Class2OptionalValue"),
        "key2" => resolve_class("Class2OptionalValue").parameter("value", "lol"),
    });

    let first = container.get("key2").unwrap();
    let second = container.get("key2").unwrap();
    assert_ne!(first, second);

    let shared = container.get("key1").unwrap().downcast::<Class2OptionalValue>().unwrap();
    *shared.value.lock().unwrap() = "singleton".to_owned();

    let customized = container.get("key2").unwrap().downcast::<Class2OptionalValue>().unwrap();
    assert_eq!("lol", *customized.value.lock().unwrap());
}

#[test]
fn class_definition_without_parameters_is_shared() {
    let container = container(definitions! {
        "key" => resolve_class("Class2OptionalValue"),
    });

    let first = container.get("key").unwrap().downcast::<Class2OptionalValue>().unwrap();
    assert_eq!("test", *first.value.lock().unwrap());
    *first.value.lock().unwrap() = "singleton".to_owned();

    let second = container.get("key").unwrap().downcast::<Class2OptionalValue>().unwrap();
    assert_eq!("singleton", *second.value.lock().unwrap());
}

#[test]
fn weak_entries_are_rebuilt_once_released() {
    let (callable, builds) = counted();
    let container = container(definitions! {
        "key" => factory(callable),
    });

    let first = container.get("key").unwrap();
    let second = container.get("key").unwrap();
    assert_eq!(first, second);
    assert_eq!(1, builds.load(Ordering::SeqCst));

    drop((first, second));
    container.get("key").unwrap();
    assert_eq!(2, builds.load(Ordering::SeqCst));
}

#[test]
fn singleton_entries_outlive_their_holders() {
    let (callable, builds) = counted();
    let container = container(definitions! {
        "key" => factory(callable).as_singleton(),
    });

    drop(container.get("key").unwrap());
    drop(container.get("key").unwrap());
    assert_eq!(1, builds.load(Ordering::SeqCst));
}

#[test]
fn has() {
    let container = container(definitions! {
        "key" => factory(twelve()),
        "key1" => Value::Null,
    });

    assert!(container.has("key"));
    assert!(container.has("key1"));
    assert!(!container.has("key2"));
    assert!(container.has(Container::ID));
    assert_eq!(Value::Null, container.get("key1").unwrap());
}

#[test]
fn has_survives_failed_builds() {
    let failing = Callable::function(Vec::new(), |_: Arguments| {
        Err(ContainerError::activation(Some("broken"), "connection refused"))
    });
    let container = container(Registry::new());
    container.set("broken", factory(failing));

    assert!(container.has("broken"));
    match container.get("broken") {
        Err(ContainerError::Unresolved { id, source }) => {
            assert_eq!("broken", id);
            assert!(matches!(*source, ContainerError::ActivationFailed { .. }));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(container.make("broken", Overrides::new()).is_err());
    assert!(container.has("broken"));
}

#[test]
fn call_method_on_instance() {
    let container = container(Registry::new());
    let value = container
        .call(CallTarget::method_on(receiver("instance"), "callMe"), Overrides::new())
        .unwrap();
    assert_eq!(Some("Class1"), class_name(&value));
}

#[test]
fn call_uses_a_copy_of_the_receiver() {
    let container = container(Registry::new());
    let instance = receiver("original");

    let receiver = container
        .call(CallTarget::method_on(instance.clone(), "me"), Overrides::new())
        .unwrap();
    assert_ne!(instance, receiver);
    assert_eq!("original", receiver.downcast::<ClassWithMethod>().unwrap().label);
}

#[test]
fn call_method_on_entry_reuses_cached_receiver() {
    let container = container(definitions! {
        "ClassWithMethod" => resolve().as_singleton(),
    });
    let held = container.get("ClassWithMethod").unwrap();

    let receiver = container
        .call(CallTarget::method("ClassWithMethod", "me"), Overrides::new())
        .unwrap();
    assert_eq!(held, receiver);
}

#[test]
fn call_method_on_entry_built_by_factory() {
    let built = Callable::function(Vec::new(), |_: Arguments| {
        Ok(Value::object(ClassWithMethod {
            label: "factory".to_owned(),
        }))
    });
    let container = container(definitions! {
        "ClassWithMethod" => factory(built),
    });

    let receiver = container
        .call(CallTarget::method("ClassWithMethod", "me"), Overrides::new())
        .unwrap();
    assert_eq!("factory", receiver.downcast::<ClassWithMethod>().unwrap().label);
}

#[test]
fn call_static_method() {
    let container = container(Registry::new());
    let value = container
        .call(CallTarget::method("ClassWithMethod", "callMeStatic"), Overrides::new())
        .unwrap();
    assert_eq!(Some("Class1"), class_name(&value));
}

#[test]
fn call_non_existing_method() {
    let container = container(Registry::new());
    let target = CallTarget::method_on(receiver("missing"), "callMeMaybe");

    match container.call(target, Overrides::new()) {
        Err(error @ ContainerError::InvalidInvocation { .. }) => {
            assert!(error
                .to_string()
                .starts_with("Method callMeMaybe does not exist on class"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn call_unknown_function() {
    let container = container(Registry::new());
    let result = container.call(CallTarget::Function("callMeMaybe".into()), Overrides::new());
    assert!(matches!(result, Err(ContainerError::InvalidInvocation { .. })));
}

#[test]
fn call_named_function() {
    let container = container(Registry::new());
    let value = container
        .call(CallTarget::Function("double".into()), Overrides::new().with("value", 21))
        .unwrap();
    assert_eq!(Value::Int(42), value);
}

#[test]
fn call_not_invokable() {
    let container = container(Registry::new());
    match container.call(CallTarget::method_on(Value::Int(1), "callMe"), Overrides::new()) {
        Err(ContainerError::InvalidInvocation { reason }) => {
            assert_eq!("Unable to invoke non-object instance.", reason);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn call_callable_resolves_typed_parameters() {
    let container = container(Registry::new());
    let callable = Callable::function(
        vec![ParameterInfo::new("class").typed("Class1")],
        |arguments: Arguments| arguments.value("class"),
    );
    let value = container.call(callable, Overrides::new()).unwrap();
    assert_eq!(Some("Class1"), class_name(&value));
}

#[test]
fn make_is_not_cached() {
    let container = container(definitions! {
        "key" => factory(Callable::function(Vec::new(), |_: Arguments| {
            Ok(Value::object(Class1::new("fresh")))
        })),
    });

    let first = container.make("key", Overrides::new()).unwrap();
    let second = container.make("key", Overrides::new()).unwrap();
    assert_ne!(first, second);

    first.downcast::<Class1>().unwrap().parameter.lock().unwrap().push('!');
    let third = container.make("key", Overrides::new()).unwrap();
    assert_eq!("fresh", third.downcast::<Class1>().unwrap().parameter());
}

#[test]
fn make_interface_required_dependency() {
    let container = container(Registry::new());
    let error = container
        .make("Class2RequireInterface1", Overrides::new())
        .unwrap_err();

    match error {
        ContainerError::Unresolved { id, source } => {
            assert_eq!("Class2RequireInterface1", id);
            assert_eq!(
                "unable to resolve parameter interface on entity Class2RequireInterface1",
                source.to_string()
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn make_interface_optional_dependency() {
    let container = container(Registry::new());
    let value = container
        .make("Class2OptionalInterface1", Overrides::new())
        .unwrap()
        .downcast::<Class2OptionalInterface1>()
        .unwrap();
    assert!(value.interface.is_none());
}

#[test]
fn make_non_existing_class() {
    let container = container(Registry::new());
    let error = container
        .make("SomeClassThatDoNotExists", Overrides::new())
        .unwrap_err();
    assert!(error.is_not_found());
    assert_eq!("entry SomeClassThatDoNotExists does not exist", error.to_string());
}

#[test]
fn make_abstract_and_interface() {
    let container = container(Registry::new());

    match container.make("AbstractClass1", Overrides::new()) {
        Err(error @ ContainerError::StructuralInstantiation { kind: ClassKind::Abstract, .. }) => {
            assert_eq!(
                "cannot create an instance of abstract class AbstractClass1",
                error.to_string()
            );
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }

    match container.make("Interface1", Overrides::new()) {
        Err(ContainerError::StructuralInstantiation { kind, .. }) => {
            assert_eq!(ClassKind::Interface, kind);
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn make_resolves_dependency() {
    let container = container(Registry::new());
    let class2 = container
        .make("Class2", Overrides::new())
        .unwrap()
        .downcast::<Class2>()
        .unwrap();
    assert_eq!("init", class2.class1.parameter());
}

#[test]
fn make_injects_overridden_parameter() {
    let container = container(Registry::new());
    let class1 = Class1::new("otherValue");

    let class2 = container
        .make("Class2", Overrides::new().with("class1", Value::object(class1)))
        .unwrap()
        .downcast::<Class2>()
        .unwrap();
    assert_eq!("otherValue", class2.class1.parameter());
}

#[test]
fn make_overrides_do_not_reach_dependencies() {
    let container = container(Registry::new());
    let class2 = container
        .make("Class2", Overrides::new().with("parameter", "ignored"))
        .unwrap()
        .downcast::<Class2>()
        .unwrap();
    assert_eq!("init", class2.class1.parameter());
}

#[test]
fn resolves_with_default() {
    let container = container(Registry::new());
    let value = container
        .get("ClassWithDefaultArgument")
        .unwrap()
        .downcast::<ClassWithDefaultArgument>()
        .unwrap();
    assert_eq!(5, value.value);
}

#[test]
fn builtin_parameter_without_default_is_unresolved() {
    let container = container(Registry::new());
    let required = Callable::function(
        vec![ParameterInfo::new("port").builtin("int")],
        |arguments: Arguments| arguments.value("port"),
    );
    match container.call(required, Overrides::new()) {
        Err(ContainerError::UnresolvedParameter { parameter, entity, .. }) => {
            assert_eq!("port", parameter);
            assert_eq!(None, entity);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let defaulted = Callable::function(
        vec![ParameterInfo::new("port").builtin("int").with_default(80)],
        |arguments: Arguments| arguments.value("port"),
    );
    assert_eq!(Value::Int(80), container.call(defaulted, Overrides::new()).unwrap());
}

#[test]
fn set_value_and_definition() {
    let container = container(Registry::new());
    let pinned = Value::object(Class1::new("pinned"));
    container.set("Class1", pinned.clone());

    assert_eq!(pinned, container.get("Class1").unwrap());
    assert_eq!(pinned, container.make("Class1", Overrides::new()).unwrap());
    let class2 = container.get("Class2").unwrap().downcast::<Class2>().unwrap();
    assert_eq!("pinned", class2.class1.parameter());

    container.set("hei2", factory(Callable::function(Vec::new(), |_: Arguments| {
        Ok(Value::from("hei"))
    })));
    assert_eq!(Value::from("hei"), container.get("hei2").unwrap());
    assert!(container.has("hei2"));
}

#[test]
fn set_definition_replaces_cached_value() {
    let container = container(definitions! {
        "key" => value(1).as_singleton(),
    });
    assert_eq!(Value::Int(1), container.get("key").unwrap());

    container.set("key", value(2));
    assert_eq!(Value::Int(2), container.get("key").unwrap());
}

#[test]
fn references_follow_redefined_target() {
    for container in [container, compiled] {
        let container = container(definitions! {
            "k2" => value(42),
            "k" => reference("k2"),
        });
        assert_eq!(Value::Int(42), container.get("k").unwrap());

        container.set("k2", value(43));
        assert_eq!(Value::Int(43), container.get("k").unwrap());
    }
}

#[test]
fn reference_to_customized_class_is_not_shared() {
    for container in [container, compiled] {
        let container = container(definitions! {
            "custom" => resolve_class("Class2OptionalValue").parameter("value", "lol"),
            "alias" => reference("custom"),
        });

        let first = container.get("alias").unwrap();
        let second = container.get("alias").unwrap();
        assert_ne!(first, second);
        let second = second.downcast::<Class2OptionalValue>().unwrap();
        assert_eq!("lol", *second.value.lock().unwrap());
    }
}

#[test]
fn replaced_values_are_dropped_after_release() {
    let container = container(Registry::new());
    let dropped = Arc::new(AtomicBool::new(false));

    container.set(
        "guard",
        Value::object(ReentrantDrop {
            container: container.clone(),
            dropped: dropped.clone(),
        }),
    );
    container.set("guard", Value::Int(1));
    assert!(dropped.load(Ordering::SeqCst));

    dropped.store(false, Ordering::SeqCst);
    let (handle, flag) = (container.clone(), dropped.clone());
    let build = Callable::closure(Vec::new(), move |_: Arguments| {
        Ok(Value::object(ReentrantDrop {
            container: handle.clone(),
            dropped: flag.clone(),
        }))
    });
    container.set("guard", factory(build).as_singleton());
    drop(container.get("guard").unwrap());
    assert!(!dropped.load(Ordering::SeqCst));

    container.set("guard", value(0));
    assert!(dropped.load(Ordering::SeqCst));
    assert_eq!(Value::Int(0), container.get("guard").unwrap());
}

#[test]
fn dependency_failures_name_the_parameter() {
    let failing = Callable::function(Vec::new(), |_: Arguments| {
        Err(ContainerError::activation(Some("Class1"), "connection refused"))
    });
    for container in [container, compiled] {
        let container = container(definitions! {
            "Class2" => resolve(),
            "Class1" => factory(failing.clone()),
        });

        let error = container.get("Class2").unwrap_err();
        assert_eq!(
            "unable to resolve parameter class1 on entity Class2",
            error.source().unwrap().to_string()
        );
        match error {
            ContainerError::Unresolved { id, source } => {
                assert_eq!("Class2", id);
                match *source {
                    ContainerError::UnresolvedDependency {
                        parameter,
                        entity,
                        source,
                    } => {
                        assert_eq!("class1", parameter);
                        assert_eq!(Some("Class2"), entity.as_deref());
                        assert!(matches!(
                            *source,
                            ContainerError::Unresolved { ref id, .. } if id == "Class1"
                        ));
                    }
                    other => panic!("unexpected source: {other:?}"),
                }
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[test]
fn factory_receives_shared_dependency() {
    let wrap = Callable::function(
        vec![ParameterInfo::new("a").typed("A")],
        |arguments: Arguments| {
            Ok(Value::object(Wrapper {
                inner: arguments.object("a")?,
            }))
        },
    );
    let container = container(definitions! {
        "A" => resolve_class("Class1"),
        "B" => factory(wrap),
    });

    let first = container.get("B").unwrap();
    let wrapper = first.downcast::<Wrapper>().unwrap();
    assert_eq!(container.get("A").unwrap(), Value::shared(wrapper.inner.clone()));

    let second = container.get("B").unwrap();
    assert_eq!(first, second);
}

#[test]
fn value_of_reference_resolves_transitively() {
    let container = container(definitions! {
        "k" => value(reference("k2")),
        "k2" => value(42),
    });
    assert_eq!(Value::Int(42), container.get("k").unwrap());
}

#[test]
fn nested_definitions_in_collections_are_resolved() {
    let container = container(definitions! {
        "list" => value(vec![Value::from(reference("name")), Value::Int(2)]),
        "map" => value(Value::Map(vec![("name".into(), Value::from(reference("name")))])),
        "name" => value("app"),
    });

    assert_eq!(
        Value::List(vec![Value::from("app"), Value::Int(2)]),
        container.get("list").unwrap()
    );
    assert_eq!(
        Value::Map(vec![("name".into(), Value::from("app"))]),
        container.get("map").unwrap()
    );
}

#[test]
fn nested_class_definition_must_name_its_class() {
    let container = container(definitions! {
        "key" => value(vec![Value::from(resolve())]),
    });
    assert!(matches!(
        container.get("key").unwrap_err().root_cause(),
        ContainerError::InvalidDefinition { .. }
    ));
}

#[test]
fn container_resolves_itself() {
    let container = container(definitions! {
        "key" => value(7),
    });
    let resolved = container.get(Container::ID).unwrap().downcast::<Container>().unwrap();
    assert_eq!(Value::Int(7), resolved.get("key").unwrap());

    let uses_container = Callable::function(
        vec![ParameterInfo::new("container").typed(Container::ID)],
        |arguments: Arguments| arguments.object::<Container>("container")?.get("key"),
    );
    assert_eq!(Value::Int(7), container.call(uses_container, Overrides::new()).unwrap());
}

#[test]
fn compiled_container_matches_dynamic_container() {
    let registry = definitions! {
        "Class1" => resolve(),
        "Class2" => resolve(),
        "Class200" => resolve(),
        "alias" => reference("Class1"),
        "key1" => value("value1"),
        "key2" => value(vec!["array1", "array2"]),
        "key3" => value(true),
        "key4" => value(false),
        "key6" => value(2),
        "key7" => value(2.0),
        "key8" => value(reference("key1")),
        "key9" => reference("key2"),
        "nested" => value(vec![Value::from(reference("key1")), Value::Int(3)]),
        "Class10" => factory(Callable::function(
            vec![ParameterInfo::new("name").builtin("string")],
            |arguments: Arguments| arguments.value("name"),
        ))
        .parameter("name", "string"),
        "raw" => Value::from("lol"),
        "callable" => twelve(),
    };

    let dynamic = container(registry.clone());
    let compiled = compiled(registry.clone());
    let unit = compiled.compiled_unit().unwrap();
    assert!(unit.contains("Class200"));
    assert!(!unit.contains("raw"));
    assert!(!unit.contains("callable"));

    for (id, _) in registry.iter() {
        let expected = dynamic.get(id).unwrap();
        let actual = compiled.get(id).unwrap();
        match (class_name(&expected), class_name(&actual)) {
            (Some(expected), Some(actual)) => assert_eq!(expected, actual, "{id}"),
            _ => assert_eq!(expected, actual, "{id}"),
        }
    }

    let class200 = compiled.get("Class200").unwrap().downcast::<Class200>().unwrap();
    assert!(class200.some_string.is_null());
    assert_eq!("12", class200.more_strings);
}

#[test]
fn compiled_entries_are_cached() {
    let container = compiled(definitions! {
        "Class1" => resolve(),
        "Interface1" => reference("Class1"),
    });

    let first = container.get("Class1").unwrap();
    assert_eq!(first, container.get("Class1").unwrap());
    assert_eq!(first, container.get("Interface1").unwrap());
}

#[test]
fn compiled_factory_with_interface_argument() {
    let callable = Callable::function(
        vec![ParameterInfo::new("interface").typed("Interface1")],
        |_: Arguments| Ok(Value::object(Class1::new("init"))),
    );
    let container = compiled(definitions! {
        "Class2" => factory(callable),
        "Class100" => resolve(),
        "Interface1" => reference("Class100"),
    });
    assert!(container.get("Class2").unwrap().downcast::<Class1>().is_some());
}

#[test]
fn compiled_optional_interface() {
    let container = compiled(definitions! {
        "Class2OptionalInterface1" => resolve(),
    });
    let value = container
        .get("Class2OptionalInterface1")
        .unwrap()
        .downcast::<Class2OptionalInterface1>()
        .unwrap();
    assert!(value.interface.is_none());
}

#[test]
fn compile_fails_on_unresolvable_parameter() {
    let result = Container::builder()
        .reflection(classes())
        .define(
            "Class10",
            factory(Callable::function(
                vec![ParameterInfo::new("name").builtin("string")],
                |arguments: Arguments| arguments.value("name"),
            )),
        )
        .enable_compiling()
        .build();

    match result {
        Err(error) => assert!(error
            .root_cause()
            .to_string()
            .starts_with("unable to resolve parameter name on entity")),
        Ok(_) => panic!("compilation should have failed"),
    }
}

#[test]
fn compiled_captured_factory_defers_to_runtime() {
    let greeting = String::from("hello");
    let captured = Callable::closure(
        vec![ParameterInfo::new("name").builtin("string")],
        move |arguments: Arguments| {
            Ok(Value::from(format!("{greeting} {}", arguments.string("name")?)))
        },
    );
    let container = compiled(definitions! {
        "greet" => factory(captured),
    });

    assert!(container.get("greet").unwrap_err().root_cause().to_string().contains("name"));

    let value = container.make("greet", Overrides::new().with("name", "world")).unwrap();
    assert_eq!(Value::from("hello world"), value);
}

#[test]
fn compiled_circular_dependency_is_detected() {
    let container = compiled(definitions! {
        "Circular1" => resolve(),
        "Circular2" => resolve(),
    });
    assert!(container.get("Circular1").unwrap_err().is_circular());
    assert_eq!(0, container.in_flight_len());
}

#[test]
fn redefined_entry_bypasses_compiled_accessor() {
    let container = compiled(definitions! {
        "Class1" => factory(Callable::function(Vec::new(), |_: Arguments| {
            Ok(Value::object(Class1::new("factory")))
        })),
    });
    let built = container.get("Class1").unwrap();
    assert_eq!("factory", built.downcast::<Class1>().unwrap().parameter());

    container.set("Class1", resolve_class("Class1"));
    let rebuilt = container.get("Class1").unwrap();
    assert_eq!("init", rebuilt.downcast::<Class1>().unwrap().parameter());
}

#[test]
fn loaded_unit_reports_replaced_factory() {
    let (callable, _) = counted();
    let unit = crate::compile(
        &definitions! { "Class1" => factory(callable) },
        &classes(),
        &crate::DefaultArgumentResolver,
    )
    .unwrap();

    let container = Container::builder()
        .reflection(classes())
        .define("Class1", resolve_class("Class1"))
        .compiled_unit(Svc::new(unit))
        .build()
        .unwrap();

    match container.get("Class1") {
        Err(error @ ContainerError::NotAFactory { .. }) => {
            assert_eq!("definition Class1 is not a factory", error.to_string());
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn compiled_listing_is_persisted() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("container.listing");

    let container = Container::builder()
        .reflection(classes())
        .definitions(definitions! {
            "Class1" => resolve(),
            "port" => value(8080),
        })
        .compiled_unit_name("AppContainer")
        .write_compiled_to(&path)
        .build()
        .unwrap();

    let listing = std::fs::read_to_string(&path).unwrap();
    assert!(listing.starts_with("unit AppContainer {"));
    assert_eq!(container.compiled_unit().unwrap().to_string(), listing);
    assert_eq!(1, std::fs::read_dir(directory.path()).unwrap().count());
}

#[test]
fn persist_failure_is_reported() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("missing").join("container.listing");

    let result = Container::builder()
        .define("port", value(8080))
        .write_compiled_to(&path)
        .build();
    assert!(matches!(result, Err(ContainerError::Persist { .. })));
}

#[cfg(feature = "arc")]
#[test]
fn concurrent_requests_share_singletons() {
    let container = container(definitions! {
        "Class1" => resolve().as_singleton(),
    });
    let held = container.get("Class1").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let container = container.clone();
            std::thread::spawn(move || container.get("Class1").unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(held, handle.join().unwrap());
    }
}
