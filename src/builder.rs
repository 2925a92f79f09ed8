use crate::{
    compile, ArgumentResolver, ClassTable, CompiledUnit, Container,
    ContainerResult, DefaultArgumentResolver, Entry, Identifier, Reflection,
    Registry, Svc,
};
use std::path::PathBuf;
use tracing::debug;

/// A builder for a [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    registry: Registry,
    reflection: Option<Svc<dyn Reflection>>,
    resolver: Option<Svc<dyn ArgumentResolver>>,
    compile: bool,
    unit_name: Option<String>,
    listing_path: Option<PathBuf>,
    compiled: Option<Svc<CompiledUnit>>,
}

impl ContainerBuilder {
    /// Adds every entry of `registry`. Entries already defined with the same
    /// identifier are replaced.
    #[must_use]
    pub fn definitions(mut self, registry: Registry) -> Self {
        for (id, entry) in registry.iter() {
            self.registry.set(id, entry.clone());
        }
        self
    }

    /// Adds a single entry.
    #[must_use]
    pub fn define(
        mut self,
        id: impl Into<Identifier>,
        entry: impl Into<Entry>,
    ) -> Self {
        self.registry.set(id, entry);
        self
    }

    /// Sets the table describing the classes and functions the container
    /// can construct and invoke. Defaults to an empty [`ClassTable`].
    #[must_use]
    pub fn reflection(mut self, reflection: impl Reflection) -> Self {
        self.reflection = Some(Svc::new(reflection));
        self
    }

    /// Replaces the [`DefaultArgumentResolver`].
    #[must_use]
    pub fn argument_resolver(mut self, resolver: impl ArgumentResolver) -> Self {
        self.resolver = Some(Svc::new(resolver));
        self
    }

    /// Compiles the registry when the container is built. Compilation
    /// failures are returned from [`ContainerBuilder::build`].
    #[must_use]
    pub fn enable_compiling(mut self) -> Self {
        self.compile = true;
        self
    }

    /// Names the compiled unit. By default the name is derived from the
    /// compiled identifiers.
    #[must_use]
    pub fn compiled_unit_name(mut self, name: impl Into<String>) -> Self {
        self.unit_name = Some(name.into());
        self
    }

    /// Writes the listing of the compiled unit to `path` when the container
    /// is built. Implies [`ContainerBuilder::enable_compiling`].
    #[must_use]
    pub fn write_compiled_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.compile = true;
        self.listing_path = Some(path.into());
        self
    }

    /// Uses a previously compiled unit instead of compiling the registry.
    #[must_use]
    pub fn compiled_unit(mut self, unit: Svc<CompiledUnit>) -> Self {
        self.compiled = Some(unit);
        self
    }

    /// Builds the container.
    pub fn build(self) -> ContainerResult<Container> {
        let reflection: Svc<dyn Reflection> = match self.reflection {
            Some(reflection) => reflection,
            None => Svc::new(ClassTable::new()),
        };
        let resolver: Svc<dyn ArgumentResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Svc::new(DefaultArgumentResolver),
        };

        let compiled = match self.compiled {
            Some(unit) => Some(unit),
            None if self.compile => {
                let mut unit = compile(&self.registry, &*reflection, &*resolver)?;
                if let Some(name) = self.unit_name {
                    unit = unit.with_name(name);
                }
                if let Some(path) = &self.listing_path {
                    unit.write_listing(path)?;
                }
                Some(Svc::new(unit))
            }
            None => None,
        };

        debug!(
            entries = self.registry.len(),
            compiled = compiled.is_some(),
            "built container"
        );
        Ok(Container::new(self.registry, reflection, resolver, compiled))
    }
}
