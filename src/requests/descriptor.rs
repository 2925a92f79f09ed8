use crate::{Identifier, ParameterInfo, Value};

/// The classification of one formal parameter for one invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub declared_type: Option<Identifier>,
    pub is_optional: bool,
    pub default_value: Option<Value>,
    pub resolved: Option<Value>,
    pub declaring_entity: Option<Identifier>,
}

/// How a [`ParameterDescriptor`] is satisfied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution<'a> {
    /// The caller supplied the value.
    Explicit(&'a Value),

    /// The value should be resolved from the container by its declared
    /// class. The default, if any, is used when the class cannot be built.
    ByType(&'a str),

    /// The parameter falls back to its default value.
    Default(&'a Value),

    /// Nothing can satisfy the parameter.
    Unresolved,
}

impl ParameterDescriptor {
    /// Describes `parameter` before any classification takes place.
    #[must_use]
    pub fn of(parameter: &ParameterInfo, entity: Option<&str>) -> Self {
        ParameterDescriptor {
            name: parameter.name.clone(),
            declared_type: None,
            is_optional: parameter.is_optional(),
            default_value: parameter.default.clone(),
            resolved: None,
            declaring_entity: entity.map(ToOwned::to_owned),
        }
    }

    #[must_use]
    pub fn is_explicitly_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution<'_> {
        if let Some(value) = &self.resolved {
            return Resolution::Explicit(value);
        }
        if let Some(class) = &self.declared_type {
            return Resolution::ByType(class);
        }
        match (&self.default_value, self.is_optional) {
            (Some(default), true) => Resolution::Default(default),
            _ => Resolution::Unresolved,
        }
    }
}
