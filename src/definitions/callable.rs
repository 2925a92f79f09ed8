use crate::{
    Arguments, ContainerResult, FactoryFn, FactoryFnPtr, Identifier,
    ParameterInfo, Signature, Svc, Value,
};
use std::fmt::{Debug, Formatter};

/// Something the container can invoke after resolving its parameters.
#[derive(Clone)]
pub struct Callable {
    signature: Signature,
    body: CallableBody,
}

/// The code run by a [`Callable`].
#[derive(Clone)]
pub enum CallableBody {
    /// A plain function. It cannot capture state, so the compiler may inline
    /// it into a compiled accessor.
    Function(FactoryFnPtr),

    /// A closure which may capture state from where it was created. The
    /// compiler defers these to the live registry at runtime.
    Closure(Svc<dyn FactoryFn>),
}

impl Callable {
    /// Creates a callable from a plain function.
    #[must_use]
    pub fn function(parameters: Vec<ParameterInfo>, body: FactoryFnPtr) -> Self {
        Callable {
            signature: Signature::new(parameters),
            body: CallableBody::Function(body),
        }
    }

    /// Creates a callable from a closure.
    pub fn closure<F: FactoryFn + 'static>(parameters: Vec<ParameterInfo>, body: F) -> Self {
        Callable {
            signature: Signature::new(parameters),
            body: CallableBody::Closure(Svc::new(body)),
        }
    }

    /// Names the class or function declaring this callable. Used when
    /// reporting unresolved parameters.
    #[must_use]
    pub fn declared_by(mut self, entity: impl Into<Identifier>) -> Self {
        self.signature.entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn body(&self) -> &CallableBody {
        &self.body
    }

    /// Whether the body may carry state captured from its environment.
    #[must_use]
    pub fn captures_state(&self) -> bool {
        matches!(self.body, CallableBody::Closure(_))
    }

    /// Runs the body with already resolved arguments.
    pub fn invoke(&self, arguments: Arguments) -> ContainerResult<Value> {
        match &self.body {
            CallableBody::Function(function) => function(arguments),
            CallableBody::Closure(closure) => closure(arguments),
        }
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let body = match self.body {
            CallableBody::Function(_) => "function",
            CallableBody::Closure(_) => "closure",
        };
        f.debug_struct("Callable")
            .field("signature", &self.signature)
            .field("body", &body)
            .finish()
    }
}

/// The target of [`Container::call`](crate::Container::call).
#[derive(Clone, Debug)]
pub enum CallTarget {
    /// Invoke a callable directly.
    Callable(Callable),

    /// Invoke a function registered with the reflection table by name.
    Function(String),

    /// Invoke a method on a receiver.
    Method {
        /// The object (or class, for static methods) owning the method.
        receiver: Receiver,

        /// The name of the method.
        method: String,
    },
}

impl CallTarget {
    /// Targets `method` on the entry named `id`.
    pub fn method(id: impl Into<Identifier>, method: impl Into<String>) -> Self {
        CallTarget::Method {
            receiver: Receiver::Id(id.into()),
            method: method.into(),
        }
    }

    /// Targets `method` on an object the caller already holds.
    pub fn method_on(receiver: Value, method: impl Into<String>) -> Self {
        CallTarget::Method {
            receiver: Receiver::Instance(receiver),
            method: method.into(),
        }
    }
}

impl From<Callable> for CallTarget {
    fn from(callable: Callable) -> Self {
        CallTarget::Callable(callable)
    }
}

/// The receiver of a method call.
#[derive(Clone, Debug)]
pub enum Receiver {
    /// An entry resolved through [`Container::get`](crate::Container::get).
    /// Static methods are invoked without resolving it.
    Id(Identifier),

    /// An object held by the caller. A shallow copy is used as the receiver.
    Instance(Value),
}
