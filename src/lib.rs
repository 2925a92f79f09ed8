//! Definition-driven dependency injection.
//!
//! A [`Container`] resolves identifiers to values by following the entries
//! of a [`Registry`]. Each entry is either a [`Definition`] describing how
//! to build a value, a raw [`Value`], or a bare [`Callable`]. Constructor and
//! factory parameters are satisfied by explicit overrides, by resolving
//! their declared class from the container, or by their default value.
//!
//! By default, the container is thread-safe: values are held in `Arc<T>`
//! and the shared state sits behind a mutex. This can be changed by
//! disabling default features and enabling the "rc" feature:
//!
//! ```text
//! hb_container = {
//!     version = "*",
//!     default_features = false,
//!     features = ["rc"]
//! }
//! ```
//!
//! # Definitions
//!
//! There are four kinds of definitions:
//!
//! - [`value`]: An immediate value. Definitions nested inside it, including
//!   inside lists and maps, are resolved when it is used.
//! - [`reference`]: An alias of another entry. Resolving it resolves the
//!   target through the cache.
//! - [`resolve`] and [`resolve_class`]: Construct a class described by the
//!   container's [`Reflection`] table.
//! - [`factory`] and [`call_factory`]: Invoke a callable.
//!
//! # Lifetimes
//!
//! Values built by [`Container::get`] are cached under their identifier.
//! By default the cache only holds objects weakly, so an object is rebuilt
//! once nothing else holds it. Definitions marked with
//! [`Definition::as_singleton`] are held strongly for as long as the
//! container lives. Class definitions with explicit parameters describe a
//! customized instance and are rebuilt on every request unless they are
//! singletons. [`Container::make`] always builds a new value.
//!
//! # Classes
//!
//! Rust has no runtime reflection, so classes are described up front in a
//! [`ClassTable`], either by hand with [`ClassInfo`] or by implementing
//! [`Injectable`].
//!
//! # Compiling
//!
//! [`ContainerBuilder::enable_compiling`] makes the builder decide, ahead of
//! time, how every definition is resolved. Missing parameters are reported
//! by [`ContainerBuilder::build`] instead of on first use, and the container
//! skips parameter classification at request time.
//!
//! # Example
//!
//! ```
//! use hb_container::{
//!     definitions, reference, resolve, Arguments, ClassInfo, ClassTable,
//!     Container, ContainerResult, Injectable, ParameterInfo, Svc, Value,
//! };
//!
//! // Something that stores users.
//! trait UserStore: Send + Sync {
//!     fn name(&self, id: i64) -> Option<String>;
//! }
//!
//! struct MemoryStore;
//!
//! impl UserStore for MemoryStore {
//!     fn name(&self, id: i64) -> Option<String> {
//!         (id == 1).then(|| "ferris".to_owned())
//!     }
//! }
//!
//! impl Injectable for MemoryStore {
//!     const CLASS: &'static str = "MemoryStore";
//!
//!     fn parameters() -> Vec<ParameterInfo> {
//!         Vec::new()
//!     }
//!
//!     fn construct(_arguments: Arguments) -> ContainerResult<Self> {
//!         Ok(MemoryStore)
//!     }
//! }
//!
//! // A service depending on whichever store is registered as `UserStore`.
//! struct Greeter {
//!     store: Svc<MemoryStore>,
//!     greeting: String,
//! }
//!
//! impl Injectable for Greeter {
//!     const CLASS: &'static str = "Greeter";
//!
//!     fn parameters() -> Vec<ParameterInfo> {
//!         vec![
//!             ParameterInfo::new("store").typed("UserStore"),
//!             ParameterInfo::new("greeting").builtin("string").with_default("hello"),
//!         ]
//!     }
//!
//!     fn construct(arguments: Arguments) -> ContainerResult<Self> {
//!         Ok(Greeter {
//!             store: arguments.object("store")?,
//!             greeting: arguments.string("greeting")?,
//!         })
//!     }
//! }
//!
//! let mut classes = ClassTable::new();
//! classes
//!     .register::<MemoryStore>()
//!     .register::<Greeter>()
//!     .register_info(ClassInfo::interface("UserStore"));
//!
//! let container = Container::builder()
//!     .reflection(classes)
//!     .definitions(definitions! {
//!         "UserStore" => reference("MemoryStore"),
//!         "Greeter" => resolve().as_singleton(),
//!     })
//!     .build()
//!     .unwrap();
//!
//! let greeter = container.get("Greeter").unwrap().downcast::<Greeter>().unwrap();
//! assert_eq!("hello", greeter.greeting);
//! assert_eq!(Some("ferris".to_owned()), greeter.store.name(1));
//!
//! // Singletons are built once.
//! let again = container.get("Greeter").unwrap();
//! assert_eq!(Value::shared(greeter), again);
//! ```

#![forbid(unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value
)]

#[cfg(not(any(feature = "arc", feature = "rc")))]
compile_error!(
    "Either the 'arc' or 'rc' feature must be enabled (but not both)."
);

#[cfg(all(feature = "arc", feature = "rc"))]
compile_error!(
    "The 'arc' and 'rc' features are mutually exclusive and cannot be enabled together."
);

mod builder;
mod compiler;
mod container;
mod definitions;
mod reflection;
mod registry;
mod requests;
mod services;

pub use builder::*;
pub use compiler::*;
pub use container::*;
pub use definitions::*;
pub use reflection::*;
pub use registry::*;
pub use requests::*;
pub use services::*;

#[cfg(test)]
mod tests;
