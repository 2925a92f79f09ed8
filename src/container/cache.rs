use crate::{CachePolicy, Identifier, Value, WeakInstance};
use std::collections::HashMap;

/// A value held by the identifier keyed cache.
#[derive(Clone)]
pub(crate) enum Hold {
    /// Set explicitly through [`Container::set`](crate::Container::set).
    /// Never rebuilt and never expires.
    Pinned(Value),

    /// Kept alive by the cache.
    Strong(Value),

    /// Alive only while someone else holds the object.
    Weak(WeakInstance),
}

/// Values previously built by a container, keyed by identifier.
#[derive(Default)]
pub(crate) struct SingletonCache {
    holds: HashMap<Identifier, Hold>,
}

impl SingletonCache {
    /// Gets a cached value. A weak hold whose object was dropped is removed
    /// and reported as a miss.
    pub fn lookup(&mut self, id: &str) -> Option<Value> {
        let value = match self.holds.get(id)? {
            Hold::Pinned(value) | Hold::Strong(value) => Some(value.clone()),
            Hold::Weak(weak) => weak.upgrade().map(Value::Object),
        };
        if value.is_none() {
            self.holds.remove(id);
        }
        value
    }

    /// Gets a value set through [`SingletonCache::pin`].
    pub fn pinned(&self, id: &str) -> Option<Value> {
        match self.holds.get(id) {
            Some(Hold::Pinned(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        matches!(self.holds.get(id), Some(Hold::Pinned(_)))
    }

    /// Stores a freshly built value according to `policy`. Returns the hold
    /// it replaced.
    pub fn store(
        &mut self,
        id: &str,
        value: &Value,
        policy: CachePolicy,
    ) -> Option<Hold> {
        let hold = match (policy, value) {
            (CachePolicy::Skip, _) => return None,
            (CachePolicy::Weak, Value::Object(instance)) => {
                Hold::Weak(instance.downgrade())
            }
            (CachePolicy::Strong | CachePolicy::Weak, value) => {
                Hold::Strong(value.clone())
            }
        };
        self.holds.insert(id.to_owned(), hold)
    }

    /// Stores a value which takes precedence over every definition.
    pub fn pin(&mut self, id: Identifier, value: Value) -> Option<Hold> {
        self.holds.insert(id, Hold::Pinned(value))
    }

    /// Forgets whatever is stored for `id` and returns it.
    pub fn evict(&mut self, id: &str) -> Option<Hold> {
        self.holds.remove(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.holds.len()
    }
}
