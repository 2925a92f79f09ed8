use crate::{
    Arguments, CallTarget, Callable, Container, ContainerError,
    ContainerResult, Instance, Method, Overrides, ParameterDescriptor,
    Receiver, Resolution, Signature, Value,
};
use tracing::trace;

impl Container {
    /// Invokes a callable, method or named function, resolving its
    /// parameters through the container.
    ///
    /// A method receiver named by identifier is resolved with
    /// [`Container::get`], so cached values are reused. A receiver passed
    /// as a value is shallow-copied first when it was created with
    /// [`Value::cloneable`]. Static methods are invoked without a receiver.
    ///
    /// ```
    /// use hb_container::{CallTarget, Callable, Container, Overrides, ParameterInfo, Value};
    ///
    /// let container = Container::builder().build().unwrap();
    /// let add = Callable::function(
    ///     vec![ParameterInfo::new("a"), ParameterInfo::new("b").with_default(1)],
    ///     |arguments| Ok(Value::Int(arguments.int("a")? + arguments.int("b")?)),
    /// );
    ///
    /// let sum = container.call(add, Overrides::new().with("a", 41)).unwrap();
    /// assert_eq!(Value::Int(42), sum);
    /// ```
    pub fn call(
        &self,
        target: impl Into<CallTarget>,
        overrides: Overrides,
    ) -> ContainerResult<Value> {
        match target.into() {
            CallTarget::Callable(callable) => self.invoke(&callable, &overrides),
            CallTarget::Function(name) => {
                let callable = self.reflection().function(&name).ok_or_else(|| {
                    ContainerError::InvalidInvocation {
                        reason: format!("function {name} does not exist"),
                    }
                })?;
                self.invoke(callable, &overrides)
            }
            CallTarget::Method { receiver, method } => {
                self.call_method(receiver, &method, &overrides)
            }
        }
    }

    fn call_method(
        &self,
        receiver: Receiver,
        method: &str,
        overrides: &Overrides,
    ) -> ContainerResult<Value> {
        // An id receiver names its class, whatever built the object.
        let declared_by_id = match &receiver {
            Receiver::Id(id) => self
                .reflection()
                .class_info(id)
                .and_then(|info| info.find_method(method)),
            Receiver::Instance(_) => None,
        };
        if let Some(declared) = declared_by_id.filter(|declared| declared.is_static) {
            return self.invoke_method(declared, &Value::Null, overrides);
        }

        let instance = match receiver {
            Receiver::Id(id) => self.get(&id)?.as_instance().cloned(),
            Receiver::Instance(value) => {
                value.as_instance().map(Instance::shallow_copy)
            }
        }
        .ok_or_else(|| ContainerError::InvalidInvocation {
            reason: "Unable to invoke non-object instance.".to_owned(),
        })?;

        let declared = match declared_by_id {
            Some(declared) => declared,
            None => {
                let class = instance.class_name();
                self.reflection()
                    .class_info(class)
                    .and_then(|info| info.find_method(method))
                    .ok_or_else(|| ContainerError::InvalidInvocation {
                        reason: format!(
                            "Method {method} does not exist on class {class}"
                        ),
                    })?
            }
        };

        let receiver = if declared.is_static {
            Value::Null
        } else {
            Value::Object(instance)
        };
        self.invoke_method(declared, &receiver, overrides)
    }

    fn invoke_method(
        &self,
        method: &Method,
        receiver: &Value,
        overrides: &Overrides,
    ) -> ContainerResult<Value> {
        trace!(method = %method.name, "invoking method");
        let arguments = self.arguments_for(&method.signature, overrides)?;
        method.invoke(receiver, arguments)
    }

    /// Resolves the parameters of a callable and invokes it.
    pub(crate) fn invoke(
        &self,
        callable: &Callable,
        overrides: &Overrides,
    ) -> ContainerResult<Value> {
        let arguments = self.arguments_for(callable.signature(), overrides)?;
        callable.invoke(arguments)
    }

    /// Constructs a class through its constructor and tags the result with
    /// the class name.
    pub(crate) fn instantiate(
        &self,
        class: &str,
        overrides: &Overrides,
    ) -> ContainerResult<Value> {
        let info = self.reflection().class_info(class).ok_or_else(|| {
            ContainerError::NotFound {
                id: class.to_owned(),
            }
        })?;
        if !info.is_instantiable() {
            return Err(ContainerError::StructuralInstantiation {
                id: class.to_owned(),
                kind: info.kind,
            });
        }

        let constructor = info.constructor.as_ref().ok_or_else(|| {
            ContainerError::InvalidDefinition {
                reason: format!("class {class} has no constructor"),
            }
        })?;
        let value = self.invoke(constructor, overrides)?;
        Ok(tag_class(value, class))
    }

    /// Resolves every parameter of `signature`.
    pub(crate) fn arguments_for(
        &self,
        signature: &Signature,
        overrides: &Overrides,
    ) -> ContainerResult<Arguments> {
        let values = self
            .resolver
            .resolve(signature, overrides)
            .into_iter()
            .map(|descriptor| {
                let value = self.satisfy(&descriptor)?;
                Ok((descriptor.name, value))
            })
            .collect::<ContainerResult<_>>()?;

        Ok(Arguments::new(signature.entity.clone(), values))
    }

    fn satisfy(&self, descriptor: &ParameterDescriptor) -> ContainerResult<Value> {
        match descriptor.resolution() {
            Resolution::Explicit(value) => self.resolve_value(value),
            Resolution::ByType(class) if self.can_build(class) => self
                .get(class)
                .map_err(|error| unresolved(descriptor, Some(error))),
            Resolution::ByType(_) => match &descriptor.default_value {
                Some(default) if descriptor.is_optional => Ok(default.clone()),
                _ => Err(unresolved(descriptor, None)),
            },
            Resolution::Default(default) => Ok(default.clone()),
            Resolution::Unresolved => Err(unresolved(descriptor, None)),
        }
    }

    /// Whether a dependency declared as `class` can be resolved at all.
    pub(crate) fn can_build(&self, class: &str) -> bool {
        self.has(class)
            || self
                .reflection()
                .class_info(class)
                .map_or(false, |info| info.is_instantiable())
    }
}

/// Records which class built an object.
pub(crate) fn tag_class(value: Value, class: &str) -> Value {
    match value {
        Value::Object(instance) => Value::Object(instance.with_class(class)),
        value => value,
    }
}

fn unresolved(
    descriptor: &ParameterDescriptor,
    source: Option<ContainerError>,
) -> ContainerError {
    let parameter = descriptor.name.clone();
    let entity = descriptor.declaring_entity.clone();
    match source {
        Some(source) => ContainerError::UnresolvedDependency {
            parameter,
            entity,
            source: Box::new(source),
        },
        None => ContainerError::UnresolvedParameter { parameter, entity },
    }
}
