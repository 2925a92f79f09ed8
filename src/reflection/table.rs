use crate::{
    Arguments, Callable, ClassInfo, ContainerResult, Identifier, Method,
    ParameterInfo, Service, Value,
};
use std::collections::HashMap;

/// Describes the classes and functions the container may build and invoke.
///
/// Rust has no runtime reflection, so every class the container constructs
/// without an explicit factory must be described up front. [`ClassTable`] is
/// the in-memory implementation.
pub trait Reflection: Service {
    /// Looks up a class by name.
    fn class_info(&self, name: &str) -> Option<&ClassInfo>;

    /// Looks up a free function by name.
    fn function(&self, _name: &str) -> Option<&Callable> {
        None
    }
}

/// A Rust type the container can construct directly.
///
/// ```
/// use hb_container::{Arguments, ContainerResult, Injectable, ParameterInfo};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Injectable for Greeter {
///     const CLASS: &'static str = "Greeter";
///
///     fn parameters() -> Vec<ParameterInfo> {
///         vec![ParameterInfo::new("greeting")
///             .builtin("string")
///             .with_default("hello")]
///     }
///
///     fn construct(arguments: Arguments) -> ContainerResult<Self> {
///         Ok(Greeter {
///             greeting: arguments.string("greeting")?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Service + Sized {
    /// The class name the type is registered under.
    const CLASS: &'static str;

    /// The constructor parameters, in declaration order.
    fn parameters() -> Vec<ParameterInfo>;

    /// Builds the type from resolved constructor arguments.
    fn construct(arguments: Arguments) -> ContainerResult<Self>;

    /// Methods callable through [`Container::call`](crate::Container::call).
    fn methods() -> Vec<Method> {
        Vec::new()
    }
}

/// An in-memory [`Reflection`] table.
#[derive(Clone, Debug, Default)]
pub struct ClassTable {
    classes: HashMap<Identifier, ClassInfo>,
    functions: HashMap<String, Callable>,
}

impl ClassTable {
    #[must_use]
    pub fn new() -> Self {
        ClassTable::default()
    }

    /// Registers a class description, replacing any class with the same name.
    pub fn register_info(&mut self, info: ClassInfo) -> &mut Self {
        self.classes.insert(info.name.clone(), info);
        self
    }

    /// Registers an [`Injectable`] type under [`Injectable::CLASS`].
    pub fn register<T: Injectable>(&mut self) -> &mut Self {
        let constructor = Callable::function(T::parameters(), construct::<T>);
        let info = T::methods()
            .into_iter()
            .fold(ClassInfo::concrete(T::CLASS, constructor), ClassInfo::method);
        self.register_info(info)
    }

    /// Registers a free function callable by name.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        callable: Callable,
    ) -> &mut Self {
        let name = name.into();
        let callable = callable.declared_by(name.clone());
        self.functions.insert(name, callable);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Reflection for ClassTable {
    fn class_info(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    fn function(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }
}

fn construct<T: Injectable>(arguments: Arguments) -> ContainerResult<Value> {
    T::construct(arguments).map(Value::object)
}
