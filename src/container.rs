mod cache;
mod guard;
mod invoke;

use crate::{
    ArgumentResolver, CachePolicy, CompiledUnit, ContainerBuilder,
    ContainerError, ContainerResult, Definition, DefinitionKind, Entry,
    Identifier, Overrides, Reflection, Registry, Shared, SharedEx, Svc, Value,
};
use std::{collections::HashSet, thread::ThreadId};
use tracing::{debug, trace, warn};

use cache::SingletonCache;
use guard::InFlightGuard;
pub(crate) use invoke::tag_class;

/// Mutable state shared between clones of a [`Container`].
#[derive(Default)]
pub(crate) struct State {
    pub registry: Registry,
    pub cache: SingletonCache,
    pub in_flight: HashSet<(ThreadId, Identifier)>,

    /// Entries replaced through [`Container::set`] since the container was
    /// built. Compiled accessors for these are no longer consulted.
    pub redefined: HashSet<Identifier>,
}

/// A dependency injection container. It resolves identifiers to values by
/// following the definitions in its [`Registry`].
///
/// Cloning a container does not clone its registry or cache. Both clones
/// share the same state, which is what allows the container to be passed to
/// factories as a dependency. The container can be requested as itself under
/// [`Container::ID`] without registering it.
///
/// ```
/// use hb_container::{
///     definitions, factory, reference, value, Arguments, Callable, Container,
///     ParameterInfo, Value,
/// };
///
/// let greeting = Callable::function(
///     vec![ParameterInfo::new("name").builtin("string")],
///     |arguments: Arguments| {
///         Ok(Value::from(format!("hello {}", arguments.string("name")?)))
///     },
/// );
///
/// let container = Container::builder()
///     .definitions(definitions! {
///         "greeting" => factory(greeting).parameter("name", reference("name")),
///         "name" => value("world"),
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(Value::from("hello world"), container.get("greeting").unwrap());
/// ```
#[derive(Clone)]
pub struct Container {
    state: Shared<State>,
    reflection: Svc<dyn Reflection>,
    resolver: Svc<dyn ArgumentResolver>,
    compiled: Option<Svc<CompiledUnit>>,
}

impl Container {
    /// The identifier the container can be resolved as.
    pub const ID: &'static str = "Container";

    /// Creates a builder for a container. This is the preferred way of
    /// creating a container.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    pub(crate) fn new(
        registry: Registry,
        reflection: Svc<dyn Reflection>,
        resolver: Svc<dyn ArgumentResolver>,
        compiled: Option<Svc<CompiledUnit>>,
    ) -> Self {
        Container {
            state: SharedEx::new(State {
                registry,
                ..State::default()
            }),
            reflection,
            resolver,
            compiled,
        }
    }

    /// Resolves an entry, reusing a previously built value if the cache
    /// still holds one.
    ///
    /// Values built from definitions are cached according to
    /// [`Definition::cache_policy`]. Entries with a compiled accessor are
    /// built by that accessor instead of the registry.
    pub fn get(&self, id: &str) -> ContainerResult<Value> {
        if id == Self::ID {
            return Ok(Value::object(self.clone()));
        }

        if let Some(value) =
            self.state.with_inner_mut(|state| state.cache.lookup(id))
        {
            trace!(id, "cache hit");
            return Ok(value);
        }

        trace!(id, "resolving entry");
        let unit = self.compiled_unit_for(id);
        let compiled = unit
            .as_deref()
            .and_then(|unit| Some((unit, unit.accessor(id)?)));
        let (value, policy) = match compiled {
            Some((unit, accessor)) => {
                let _guard = InFlightGuard::enter(&self.state, id)?;
                trace!(id, accessor = accessor.name(), "using compiled accessor");
                let value = accessor
                    .evaluate(unit, self)
                    .map_err(|error| error.wrap(id))?;
                (value, accessor.policy())
            }
            None => {
                let value = self.build(id, &Overrides::new())?;
                (value, self.cache_policy(id))
            }
        };

        let replaced = self
            .state
            .with_inner_mut(|state| state.cache.store(id, &value, policy));
        drop(replaced);
        if policy != CachePolicy::Skip {
            debug!(id, %policy, "cached entry");
        }

        Ok(value)
    }

    /// Builds a new value for an entry, ignoring and bypassing the cache.
    ///
    /// `overrides` supply named constructor or factory parameters for this
    /// build only. They take precedence over the definition's own
    /// parameters and do not reach dependencies. A value set through
    /// [`Container::set`] is returned as-is.
    pub fn make(&self, id: &str, overrides: Overrides) -> ContainerResult<Value> {
        if id == Self::ID {
            return Ok(Value::object(self.clone()));
        }

        if let Some(value) =
            self.state.with_inner(|state| state.cache.pinned(id))
        {
            return Ok(value);
        }

        self.build(id, &overrides)
    }

    /// Whether the container has an entry for `id`.
    ///
    /// This does not mean resolving it will succeed, only that it will not
    /// fail with [`ContainerError::NotFound`] for `id` itself.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        id == Self::ID
            || self.state.with_inner(|state| {
                state.registry.has(id) || state.cache.is_pinned(id)
            })
    }

    /// Replaces the entry for `id`.
    ///
    /// Definitions and callables replace the registry entry and drop any
    /// value cached for it, including one built by a compiled accessor.
    /// Anything else is stored as-is and returned by every later request,
    /// taking precedence over the registry.
    pub fn set(&self, id: impl Into<Identifier>, entry: impl Into<Entry>) {
        let id = id.into();
        let entry = entry.into();
        debug!(id = %id, "redefining entry");
        let replaced = self.state.with_inner_mut(|state| match entry {
            Entry::Value(value) => (state.cache.pin(id, value), None),
            entry => {
                let hold = state.cache.evict(&id);
                state.redefined.insert(id.clone());
                (hold, state.registry.set(id, entry))
            }
        });

        // Dropping a replaced value can run code which uses the container.
        drop(replaced);
    }

    /// The compiled unit the container consults before its registry.
    #[must_use]
    pub fn compiled_unit(&self) -> Option<&Svc<CompiledUnit>> {
        self.compiled.as_ref()
    }

    pub(crate) fn reflection(&self) -> &dyn Reflection {
        &*self.reflection
    }

    /// Builds an entry from its registry entry, or as a class if it has
    /// none.
    fn build(&self, id: &str, overrides: &Overrides) -> ContainerResult<Value> {
        let _guard = InFlightGuard::enter(&self.state, id)?;
        debug!(id, "building entry");

        let entry = self.state.with_inner(|state| state.registry.get(id).cloned());
        let result = match entry {
            None => self.instantiate(id, overrides),
            Some(Entry::Value(value)) => self.resolve_value(&value),
            Some(Entry::Callable(callable)) => self.invoke(&callable, overrides),
            Some(Entry::Definition(definition)) => {
                self.resolve_definition(Some(id), &definition, overrides)
            }
        };

        result.map_err(|error| error.wrap(id))
    }

    /// Resolves a definition. Nested definitions have no identifier of their
    /// own, so class definitions among them must name their class.
    pub(crate) fn resolve_definition(
        &self,
        id: Option<&str>,
        definition: &Definition,
        overrides: &Overrides,
    ) -> ContainerResult<Value> {
        match definition.kind() {
            DefinitionKind::Value(value) => self.resolve_value(value),
            DefinitionKind::Reference(target) => self.get(target),
            DefinitionKind::Class {
                class_name,
                parameters,
            } => {
                let class = class_name.as_deref().or(id).ok_or_else(|| {
                    ContainerError::InvalidDefinition {
                        reason: "a nested class definition must name its class"
                            .to_owned(),
                    }
                })?;
                self.instantiate(class, &parameters.merged(overrides))
            }
            DefinitionKind::Factory {
                callable,
                parameters,
            } => self.invoke(callable, &parameters.merged(overrides)),
        }
    }

    /// Resolves any definitions nested inside a value.
    pub(crate) fn resolve_value(&self, value: &Value) -> ContainerResult<Value> {
        match value {
            Value::Definition(definition) => {
                self.resolve_definition(None, definition, &Overrides::new())
            }
            Value::List(items) if value.contains_definition() => items
                .iter()
                .map(|item| self.resolve_value(item))
                .collect::<ContainerResult<_>>()
                .map(Value::List),
            Value::Map(entries) if value.contains_definition() => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.resolve_value(item)?)))
                .collect::<ContainerResult<_>>()
                .map(Value::Map),
            value => Ok(value.clone()),
        }
    }

    /// How a value built for `id` from the registry is cached.
    fn cache_policy(&self, id: &str) -> CachePolicy {
        self.state.with_inner(|state| match state.registry.get(id) {
            Some(Entry::Definition(definition)) => definition.cache_policy(),
            Some(Entry::Value(_)) => CachePolicy::Strong,
            Some(Entry::Callable(_)) | None => CachePolicy::Weak,
        })
    }

    /// The compiled unit to build `id` with, unless `id` was redefined after
    /// the container was built.
    fn compiled_unit_for(&self, id: &str) -> Option<Svc<CompiledUnit>> {
        let unit = self.compiled.as_ref()?;
        if self.state.with_inner(|state| state.redefined.contains(id)) {
            trace!(id, "skipping compiled accessor of redefined entry");
            return None;
        }

        Some(unit.clone())
    }

    /// Re-reads the registry for a factory the compiler deferred to runtime.
    pub(crate) fn resolve_factory(
        &self,
        id: &str,
        overrides: &Overrides,
    ) -> ContainerResult<Value> {
        let definition = self
            .state
            .with_inner(|state| state.registry.definition(id).cloned());
        match definition.as_deref().map(Definition::kind) {
            Some(DefinitionKind::Factory {
                callable,
                parameters,
            }) => self.invoke(callable, &parameters.merged(overrides)),
            _ => {
                warn!(id, "compiled factory no longer matches the registry");
                Err(ContainerError::NotAFactory { id: id.to_owned() })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight_len(&self) -> usize {
        self.state.with_inner(|state| state.in_flight.len())
    }
}
