use crate::{
    Arguments, Callable, ContainerResult, Identifier, MethodFn, Svc, Value,
};
use derive_more::Display;
use std::fmt::{Debug, Formatter};

/// The declared type of a parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeHint {
    /// A class or interface. The container can satisfy these by resolving
    /// the named entry.
    Class(Identifier),

    /// A builtin type such as `string` or `int`. The container never
    /// resolves these by type.
    Builtin(String),
}

/// A formal parameter of a constructor, method or function.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterInfo {
    pub name: String,
    pub type_hint: Option<TypeHint>,
    pub default: Option<Value>,
}

impl ParameterInfo {
    /// An untyped parameter without a default.
    pub fn new(name: impl Into<String>) -> Self {
        ParameterInfo {
            name: name.into(),
            type_hint: None,
            default: None,
        }
    }

    /// Declares the parameter as an instance of a class or interface.
    #[must_use]
    pub fn typed(mut self, class: impl Into<Identifier>) -> Self {
        self.type_hint = Some(TypeHint::Class(class.into()));
        self
    }

    /// Declares the parameter as a builtin type.
    #[must_use]
    pub fn builtin(mut self, name: impl Into<String>) -> Self {
        self.type_hint = Some(TypeHint::Builtin(name.into()));
        self
    }

    /// Gives the parameter a default value, making it optional.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    /// The class or interface the parameter is declared as, if any.
    #[must_use]
    pub fn class_hint(&self) -> Option<&str> {
        match &self.type_hint {
            Some(TypeHint::Class(class)) => Some(class),
            _ => None,
        }
    }
}

/// The ordered parameter list of a callable, along with the entity that
/// declares it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signature {
    pub entity: Option<Identifier>,
    pub parameters: Vec<ParameterInfo>,
}

impl Signature {
    #[must_use]
    pub fn new(parameters: Vec<ParameterInfo>) -> Self {
        Signature {
            entity: None,
            parameters,
        }
    }
}

/// What kind of type a class is.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum ClassKind {
    #[display(fmt = "class")]
    Concrete,
    #[display(fmt = "abstract class")]
    Abstract,
    #[display(fmt = "interface")]
    Interface,
}

/// A description of a class known to the container.
#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub name: Identifier,
    pub kind: ClassKind,
    pub constructor: Option<Callable>,
    pub methods: Vec<Method>,
}

impl ClassInfo {
    /// A class which can be constructed with `constructor`.
    pub fn concrete(name: impl Into<Identifier>, constructor: Callable) -> Self {
        let name = name.into();
        ClassInfo {
            constructor: Some(constructor.declared_by(name.clone())),
            name,
            kind: ClassKind::Concrete,
            methods: Vec::new(),
        }
    }

    /// An interface. It exists, but cannot be constructed.
    pub fn interface(name: impl Into<Identifier>) -> Self {
        ClassInfo::structural(name, ClassKind::Interface)
    }

    /// An abstract class. It exists, but cannot be constructed.
    pub fn abstract_class(name: impl Into<Identifier>) -> Self {
        ClassInfo::structural(name, ClassKind::Abstract)
    }

    fn structural(name: impl Into<Identifier>, kind: ClassKind) -> Self {
        ClassInfo {
            name: name.into(),
            kind,
            constructor: None,
            methods: Vec::new(),
        }
    }

    /// Adds a method to the class.
    #[must_use]
    pub fn method(mut self, mut method: Method) -> Self {
        method.signature.entity = Some(self.name.clone());
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete
    }

    /// Finds a method by name.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }
}

/// A method declared by a class.
#[derive(Clone)]
pub struct Method {
    pub name: String,
    pub signature: Signature,
    pub is_static: bool,
    body: Svc<dyn MethodFn>,
}

impl Method {
    /// A method invoked on an instance of the class.
    pub fn new<F>(name: impl Into<String>, parameters: Vec<ParameterInfo>, body: F) -> Self
    where
        F: MethodFn + 'static,
    {
        Method {
            name: name.into(),
            signature: Signature::new(parameters),
            is_static: false,
            body: Svc::new(body),
        }
    }

    /// A method invoked without an instance. Its body receives
    /// [`Value::Null`] as the receiver.
    pub fn new_static<F>(
        name: impl Into<String>,
        parameters: Vec<ParameterInfo>,
        body: F,
    ) -> Self
    where
        F: MethodFn + 'static,
    {
        Method {
            is_static: true,
            ..Method::new(name, parameters, body)
        }
    }

    /// Runs the body with already resolved arguments.
    pub fn invoke(
        &self,
        receiver: &Value,
        arguments: Arguments,
    ) -> ContainerResult<Value> {
        (self.body)(receiver, arguments)
    }
}

impl Debug for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("is_static", &self.is_static)
            .finish()
    }
}
