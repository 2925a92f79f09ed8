use crate::{ContainerError, ContainerResult, Identifier, Shared, SharedEx};
use std::thread::{self, ThreadId};

use super::State;

/// Marks an entry as being built for as long as the guard lives.
///
/// Entries are tracked per thread, so two threads building the same entry
/// at once do not see each other as a cycle.
pub(crate) struct InFlightGuard<'a> {
    state: &'a Shared<State>,
    key: (ThreadId, Identifier),
}

impl<'a> InFlightGuard<'a> {
    /// Fails with [`ContainerError::CircularDependency`] if `id` is already
    /// being built further up the current thread's call stack.
    pub fn enter(state: &'a Shared<State>, id: &str) -> ContainerResult<Self> {
        let key = (thread::current().id(), id.to_owned());
        let inserted =
            state.with_inner_mut(|state| state.in_flight.insert(key.clone()));
        if !inserted {
            return Err(ContainerError::CircularDependency { id: id.to_owned() });
        }

        Ok(InFlightGuard { state, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state
            .with_inner_mut(|state| state.in_flight.remove(&self.key));
    }
}
