use crate::{ContainerError, ContainerResult, Identifier, Service, Svc, Value};

/// The resolved arguments handed to a factory, constructor or method body,
/// in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    entity: Option<Identifier>,
    values: Vec<(String, Value)>,
}

impl Arguments {
    /// Creates a set of arguments for a body declared by `entity`.
    #[must_use]
    pub fn new(entity: Option<Identifier>, values: Vec<(String, Value)>) -> Self {
        Arguments { entity, values }
    }

    /// The class or callable the arguments were resolved for.
    #[must_use]
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Gets an argument, failing if it was not resolved.
    pub fn value(&self, name: &str) -> ContainerResult<Value> {
        self.get(name)
            .cloned()
            .ok_or_else(|| self.invalid(name, "present"))
    }

    /// Moves an argument out, leaving [`Value::Null`] in its place.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.values
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| std::mem::replace(value, Value::Null))
    }

    /// Gets an object argument as a concrete type.
    pub fn object<T: Service>(&self, name: &str) -> ContainerResult<Svc<T>> {
        self.get(name)
            .and_then(Value::downcast::<T>)
            .ok_or_else(|| self.invalid(name, std::any::type_name::<T>()))
    }

    /// Gets an object argument as a concrete type, treating
    /// [`Value::Null`] as absent.
    pub fn optional_object<T: Service>(
        &self,
        name: &str,
    ) -> ContainerResult<Option<Svc<T>>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.object(name).map(Some),
        }
    }

    pub fn string(&self, name: &str) -> ContainerResult<String> {
        self.get(name)
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| self.invalid(name, "a string"))
    }

    pub fn int(&self, name: &str) -> ContainerResult<i64> {
        self.get(name)
            .and_then(Value::as_int)
            .ok_or_else(|| self.invalid(name, "an integer"))
    }

    pub fn bool(&self, name: &str) -> ContainerResult<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| self.invalid(name, "a boolean"))
    }

    pub fn float(&self, name: &str) -> ContainerResult<f64> {
        self.get(name)
            .and_then(Value::as_float)
            .ok_or_else(|| self.invalid(name, "a number"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The argument values in declaration order.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values.into_iter().map(|(_, value)| value).collect()
    }

    fn invalid(&self, name: &str, expected: &'static str) -> ContainerError {
        ContainerError::InvalidArgument {
            parameter: name.to_owned(),
            entity: self.entity.clone(),
            expected,
        }
    }
}
