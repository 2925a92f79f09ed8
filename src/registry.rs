use crate::{Callable, Definition, Identifier, Svc, Value};
use std::collections::HashMap;

/// Something stored in a [`Registry`].
#[derive(Clone, Debug)]
pub enum Entry {
    /// A description of how to build the entry.
    Definition(Svc<Definition>),

    /// A raw value, returned as-is. Nested definitions are resolved on use.
    /// [`Value::Null`] marks an entry that is present but unset.
    Value(Value),

    /// A bare callable, invoked with its parameters resolved each time the
    /// entry is built.
    Callable(Callable),
}

impl From<Definition> for Entry {
    fn from(definition: Definition) -> Self {
        Entry::Definition(Svc::new(definition))
    }
}

impl From<Svc<Definition>> for Entry {
    fn from(definition: Svc<Definition>) -> Self {
        Entry::Definition(definition)
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        match value {
            Value::Definition(definition) => Entry::Definition(definition),
            value => Entry::Value(value),
        }
    }
}

impl From<Callable> for Entry {
    fn from(callable: Callable) -> Self {
        Entry::Callable(callable)
    }
}

/// The entries a container builds from, keyed by identifier.
///
/// Iteration follows insertion order. Setting an identifier again replaces
/// its entry without moving it.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    order: Vec<Identifier>,
    entries: HashMap<Identifier, Entry>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Registry::default()
    }

    /// Sets the entry for an identifier, returning the entry it replaced.
    pub fn set(
        &mut self,
        id: impl Into<Identifier>,
        entry: impl Into<Entry>,
    ) -> Option<Entry> {
        let id = id.into();
        let previous = self.entries.insert(id.clone(), entry.into());
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Gets the entry for an identifier if it is a definition.
    #[must_use]
    pub fn definition(&self, id: &str) -> Option<&Svc<Definition>> {
        match self.entries.get(id) {
            Some(Entry::Definition(definition)) => Some(definition),
            _ => None,
        }
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.order.iter().filter_map(|id| {
            self.entries.get(id).map(|entry| (id.as_str(), entry))
        })
    }
}

impl<K, E> FromIterator<(K, E)> for Registry
where
    K: Into<Identifier>,
    E: Into<Entry>,
{
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for (id, entry) in iter {
            registry.set(id, entry);
        }
        registry
    }
}

/// Declares a [`Registry`] inline.
///
/// # Example
///
/// ```
/// use hb_container::{definitions, reference, resolve, value, Value};
///
/// let registry = definitions! {
///     "Mailer" => resolve().parameter("host", "localhost"),
///     "mailer" => reference("Mailer"),
///     "retries" => value(3),
///     "unset" => Value::Null,
/// };
///
/// assert_eq!(4, registry.len());
/// assert!(registry.has("unset"));
/// ```
#[macro_export]
macro_rules! definitions {
    {
        $($id:expr => $entry:expr),*
        $(,)?
    } => {
        {
            #[allow(unused_mut)]
            let mut registry = $crate::Registry::new();
            $(registry.set($id, $entry);)*
            registry
        }
    };
}
