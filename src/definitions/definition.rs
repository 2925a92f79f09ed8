use crate::{
    Arguments, CallTarget, Callable, Container, ContainerError, Identifier,
    Overrides, ParameterInfo, Value,
};
use derive_more::Display;
use std::str::FromStr;

/// How long a resolved object is kept by the container.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// The cache only holds a weak reference. Once every other holder drops
    /// the object, the next request builds a new one.
    #[default]
    #[display(fmt = "weak")]
    Weak,

    /// The cache keeps the object alive for as long as the container lives.
    #[display(fmt = "singleton")]
    Singleton,
}

impl FromStr for Lifetime {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weak" => Ok(Lifetime::Weak),
            "singleton" => Ok(Lifetime::Singleton),
            other => Err(ContainerError::InvalidDefinition {
                reason: format!("unknown lifetime value: {other}"),
            }),
        }
    }
}

/// How a resolved value is stored in the identifier keyed cache.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Not cached; every request builds a new value.
    #[display(fmt = "fresh")]
    Skip,

    /// Cached with a strong hold.
    #[display(fmt = "strong")]
    Strong,

    /// Cached with a weak hold. Values that are not objects cannot be held
    /// weakly and are held strongly instead.
    #[display(fmt = "weak")]
    Weak,
}

impl From<Lifetime> for CachePolicy {
    fn from(lifetime: Lifetime) -> Self {
        match lifetime {
            Lifetime::Weak => CachePolicy::Weak,
            Lifetime::Singleton => CachePolicy::Strong,
        }
    }
}

/// A description of how to build an entry.
#[derive(Clone, Debug)]
pub struct Definition {
    kind: DefinitionKind,
    lifetime: Lifetime,
}

/// The variants of [`Definition`].
#[derive(Clone, Debug)]
pub enum DefinitionKind {
    /// An immediate value. Definitions nested in it are resolved on use.
    Value(Value),

    /// An alias of another entry.
    Reference(Identifier),

    /// Build by constructing a class. When `class_name` is `None`, the
    /// identifier of the entry is used as the class.
    Class {
        class_name: Option<Identifier>,
        parameters: Overrides,
    },

    /// Build by invoking a callable.
    Factory {
        callable: Callable,
        parameters: Overrides,
    },
}

impl Definition {
    /// Creates a definition with the default lifetime.
    #[must_use]
    pub fn new(kind: DefinitionKind) -> Self {
        Definition {
            kind,
            lifetime: Lifetime::default(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &DefinitionKind {
        &self.kind
    }

    #[must_use]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Sets the value of a named constructor or factory parameter. Has no
    /// effect on value and reference definitions.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        match &mut self.kind {
            DefinitionKind::Class { parameters, .. }
            | DefinitionKind::Factory { parameters, .. } => {
                parameters.insert(name, value);
            }
            DefinitionKind::Value(_) | DefinitionKind::Reference(_) => {}
        }
        self
    }

    /// Keeps the resolved object alive for the lifetime of the container.
    #[must_use]
    pub fn as_singleton(self) -> Self {
        self.with_lifetime(Lifetime::Singleton)
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// The explicit parameters of a class or factory definition.
    #[must_use]
    pub fn parameters(&self) -> Option<&Overrides> {
        match &self.kind {
            DefinitionKind::Class { parameters, .. }
            | DefinitionKind::Factory { parameters, .. } => Some(parameters),
            DefinitionKind::Value(_) | DefinitionKind::Reference(_) => None,
        }
    }

    #[must_use]
    pub fn is_factory(&self) -> bool {
        matches!(self.kind, DefinitionKind::Factory { .. })
    }

    /// How the value built from this definition is cached under its
    /// identifier.
    ///
    /// A class definition with explicit parameters describes a customized
    /// instance, so unless it asks to be a singleton it is rebuilt on every
    /// request. A reference is never cached under its own identifier; only
    /// the target's cache applies.
    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        match (&self.kind, self.lifetime) {
            (DefinitionKind::Reference(_), _) => CachePolicy::Skip,
            (DefinitionKind::Class { parameters, .. }, Lifetime::Weak)
                if !parameters.is_empty() =>
            {
                CachePolicy::Skip
            }
            (_, lifetime) => lifetime.into(),
        }
    }
}

/// An immediate value.
pub fn value(value: impl Into<Value>) -> Definition {
    Definition::new(DefinitionKind::Value(value.into()))
}

/// An alias of the entry named `target`.
pub fn reference(target: impl Into<Identifier>) -> Definition {
    Definition::new(DefinitionKind::Reference(target.into()))
}

/// Constructs the class named by the entry's own identifier.
#[must_use]
pub fn resolve() -> Definition {
    Definition::new(DefinitionKind::Class {
        class_name: None,
        parameters: Overrides::new(),
    })
}

/// Constructs the class named `class_name`.
pub fn resolve_class(class_name: impl Into<Identifier>) -> Definition {
    Definition::new(DefinitionKind::Class {
        class_name: Some(class_name.into()),
        parameters: Overrides::new(),
    })
}

/// Invokes `callable`.
#[must_use]
pub fn factory(callable: Callable) -> Definition {
    Definition::new(DefinitionKind::Factory {
        callable,
        parameters: Overrides::new(),
    })
}

/// Invokes a call target through [`Container::call`] each time the entry is
/// built. The target is captured, so the compiler always defers these.
#[must_use]
pub fn call_factory(target: CallTarget) -> Definition {
    let parameters = vec![ParameterInfo::new("container").typed(Container::ID)];
    let callable = Callable::closure(parameters, move |arguments: Arguments| {
        let container = arguments.object::<Container>("container")?;
        container.call(target.clone(), Overrides::new())
    });
    factory(callable)
}
