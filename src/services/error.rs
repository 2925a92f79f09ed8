#![allow(clippy::used_underscore_binding)]

use crate::{ClassKind, Identifier};
use derive_more::{Display, Error};
use std::{error::Error as StdError, path::PathBuf};

/// A result from attempting to resolve an entry or invoke a callable through
/// the container.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// An error that has occurred while resolving an entry, invoking a callable
/// or compiling a registry.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum ContainerError {
    /// The identifier does not name a registry entry or a known class.
    #[display(fmt = "entry {} does not exist", id)]
    NotFound {
        /// The identifier that was requested.
        id: Identifier,
    },

    /// A parameter could not be satisfied by an override, its declared type
    /// or a default value.
    #[display(
        fmt = "unable to resolve parameter {} on entity {}",
        parameter,
        "fmt_entity(entity.as_deref())"
    )]
    UnresolvedParameter {
        /// The name of the parameter.
        parameter: String,

        /// The class or callable declaring the parameter, if known.
        entity: Option<Identifier>,
    },

    /// A parameter was typed as an entry that exists but could not be built.
    #[display(
        fmt = "unable to resolve parameter {} on entity {}",
        parameter,
        "fmt_entity(entity.as_deref())"
    )]
    UnresolvedDependency {
        /// The name of the parameter.
        parameter: String,

        /// The class or callable declaring the parameter, if known.
        entity: Option<Identifier>,

        /// The failure of the dependency.
        source: Box<ContainerError>,
    },

    /// An entry depends on itself within one resolution chain.
    #[display(fmt = "circular dependency detected while resolving entry {}", id)]
    CircularDependency {
        /// The entry that was requested a second time.
        id: Identifier,
    },

    /// A call target has an unsupported shape or refers to something that
    /// does not exist.
    #[display(fmt = "{}", reason)]
    InvalidInvocation {
        /// A description of what is wrong with the target.
        reason: String,
    },

    /// An interface or abstract class was instantiated directly.
    #[display(fmt = "cannot create an instance of {} {}", kind, id)]
    StructuralInstantiation {
        /// The class that was requested.
        id: Identifier,

        /// What kind of class it is.
        kind: ClassKind,
    },

    /// A compiled accessor expected a factory definition for this entry but
    /// the current definition is something else.
    #[display(fmt = "definition {} is not a factory", id)]
    NotAFactory {
        /// The entry whose definition was replaced.
        id: Identifier,
    },

    /// A definition is malformed.
    #[display(fmt = "invalid definition: {}", reason)]
    InvalidDefinition {
        /// A description of what is wrong with the definition.
        reason: String,
    },

    /// A factory or constructor body read one of its arguments as the wrong
    /// shape.
    #[display(
        fmt = "argument {} of {} is not {}",
        parameter,
        "fmt_entity(entity.as_deref())",
        expected
    )]
    InvalidArgument {
        /// The name of the argument.
        parameter: String,

        /// The class or callable reading the argument, if known.
        entity: Option<Identifier>,

        /// What the body expected to find.
        expected: &'static str,
    },

    /// Resolution of an entry failed because of one of its dependencies.
    #[display(fmt = "unable to resolve {}", id)]
    Unresolved {
        /// The entry that was being built.
        id: Identifier,

        /// Why it could not be built.
        source: Box<ContainerError>,
    },

    /// A factory or constructor body returned its own error.
    #[display(
        fmt = "an error occurred during activation of {}",
        "fmt_entity(entity.as_deref())"
    )]
    ActivationFailed {
        /// The class or callable that failed, if known.
        entity: Option<Identifier>,

        /// The error returned by the body.
        #[error(source)]
        inner: ActivationError,
    },

    /// The compiled unit could not be written to disk.
    #[display(fmt = "failed to persist compiled unit to {}", "path.display()")]
    Persist {
        /// The destination of the listing.
        path: PathBuf,

        /// The underlying I/O failure.
        source: std::io::Error,
    },
}

impl ContainerError {
    /// Wraps an error returned by a factory or constructor body.
    pub fn activation(
        entity: Option<&str>,
        inner: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        ContainerError::ActivationFailed {
            entity: entity.map(ToOwned::to_owned),
            inner: ActivationError(inner.into()),
        }
    }

    /// Follows the chain of wrapped failures down to the innermost one.
    #[must_use]
    pub fn root_cause(&self) -> &ContainerError {
        let mut current = self;
        loop {
            match current {
                ContainerError::Unresolved { source, .. }
                | ContainerError::UnresolvedDependency { source, .. } => {
                    current = &**source;
                }
                _ => return current,
            }
        }
    }

    /// Whether the innermost failure is a [`ContainerError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), ContainerError::NotFound { .. })
    }

    /// Whether the innermost failure is a
    /// [`ContainerError::CircularDependency`].
    #[must_use]
    pub fn is_circular(&self) -> bool {
        matches!(self.root_cause(), ContainerError::CircularDependency { .. })
    }

    /// Whether this error already names `id` as its subject, in which case
    /// wrapping it again with `id` adds nothing.
    pub(crate) fn concerns(&self, id: &str) -> bool {
        match self {
            ContainerError::NotFound { id: subject }
            | ContainerError::CircularDependency { id: subject }
            | ContainerError::StructuralInstantiation { id: subject, .. }
            | ContainerError::NotAFactory { id: subject }
            | ContainerError::Unresolved { id: subject, .. } => subject == id,
            _ => false,
        }
    }

    /// Attaches the identifier of the entry under construction.
    pub(crate) fn wrap(self, id: &str) -> Self {
        if self.concerns(id) {
            self
        } else {
            ContainerError::Unresolved {
                id: id.to_owned(),
                source: Box::new(self),
            }
        }
    }
}

/// An error returned by a factory or constructor body.
#[derive(Debug, Display)]
#[display(fmt = "{}", _0)]
pub struct ActivationError(Box<dyn StdError + Send + Sync + 'static>);

impl ActivationError {
    /// The error as returned by the body.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl StdError for ActivationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

fn fmt_entity(entity: Option<&str>) -> &str {
    entity.unwrap_or("N/A")
}
