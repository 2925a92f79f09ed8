use crate::{
    CachePolicy, Container, ContainerError, ContainerResult, Identifier, Plan,
    Value,
};
use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
    io::Write,
    path::Path,
};
use tempfile::NamedTempFile;
use tracing::debug;

/// One generated accessor of a [`CompiledUnit`].
#[derive(Clone, Debug)]
pub struct Accessor {
    pub(crate) name: String,
    pub(crate) entry: Option<Identifier>,
    pub(crate) plan: Plan,
    pub(crate) policy: CachePolicy,
}

impl Accessor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registry entry this accessor builds. Accessors for definitions
    /// nested inside other values have none.
    #[must_use]
    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// How [`Container::get`] caches the value this accessor builds.
    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub(crate) fn evaluate(
        &self,
        unit: &CompiledUnit,
        container: &Container,
    ) -> ContainerResult<Value> {
        self.plan.evaluate(unit, container)
    }
}

/// The output of compiling a [`Registry`](crate::Registry): one accessor per
/// compiled definition and a table from identifier to accessor.
///
/// The unit is immutable once compiled. Its [`Display`] implementation
/// renders a listing of every accessor, which can be persisted with
/// [`CompiledUnit::write_listing`].
#[derive(Clone, Debug)]
pub struct CompiledUnit {
    name: String,
    accessors: Vec<Accessor>,
    entries: HashMap<Identifier, usize>,
}

impl CompiledUnit {
    pub(crate) fn new(
        accessors: Vec<Accessor>,
        entries: HashMap<Identifier, usize>,
    ) -> Self {
        let mut hasher = DefaultHasher::new();
        for id in accessors.iter().filter_map(Accessor::entry) {
            id.hash(&mut hasher);
        }

        CompiledUnit {
            name: format!("HbCompiledContainer{:016x}", hasher.finish()),
            accessors,
            entries,
        }
    }

    /// Renames the unit.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The accessor compiled for a registry entry.
    #[must_use]
    pub fn accessor(&self, id: &str) -> Option<&Accessor> {
        self.entries
            .get(id)
            .and_then(|index| self.accessors.get(*index))
    }

    pub(crate) fn accessor_at(&self, index: usize) -> Option<&Accessor> {
        self.accessors.get(index)
    }

    pub(crate) fn accessor_name(index: usize) -> String {
        format!("get{index}")
    }

    /// Whether `id` has a compiled accessor.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// The compiled registry entries, in compilation order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.accessors.iter().filter_map(Accessor::entry)
    }

    /// Every accessor, including those of nested definitions.
    pub fn accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Writes the listing to `path`. The listing is written to a temporary
    /// file in the same directory first and then renamed over `path`, so
    /// readers never observe a partial listing.
    pub fn write_listing(&self, path: impl AsRef<Path>) -> ContainerResult<()> {
        let path = path.as_ref();
        let persist_error = |source: std::io::Error| ContainerError::Persist {
            path: path.to_owned(),
            source,
        };

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(directory).map_err(persist_error)?;
        write!(file, "{self}").map_err(persist_error)?;
        file.flush().map_err(persist_error)?;
        file.persist(path)
            .map_err(|error| persist_error(error.error))?;

        debug!(path = %path.display(), unit = %self.name, "persisted compiled unit");
        Ok(())
    }
}

impl Display for CompiledUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "unit {} {{", self.name)?;
        writeln!(f, "    const ENTRIES = {{")?;
        for accessor in &self.accessors {
            if let Some(entry) = &accessor.entry {
                writeln!(f, "        {entry:?} => {},", accessor.name)?;
            }
        }
        writeln!(f, "    }};")?;

        for accessor in &self.accessors {
            writeln!(f)?;
            writeln!(f, "    fn {}() /* {} */ {{", accessor.name, accessor.policy)?;
            writeln!(f, "        return {};", accessor.plan)?;
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}
