use crate::{Arguments, ContainerResult, Value};

/// Access to state shared between clones of a container. The lock is never
/// held while user code runs.
pub(crate) trait SharedEx<T> {
    fn new(value: T) -> Self;
    fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R;
    fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R;
}

#[cfg(feature = "arc")]
mod types {
    use super::SharedEx;
    use crate::{Arguments, ContainerResult, Value};
    use std::{
        any::Any,
        sync::{Arc, Mutex, PoisonError, Weak},
    };

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Arc<T>;

    /// A reference-counted service pointer holding an instance of `dyn Any`.
    pub type DynSvc = Arc<dyn Any + Send + Sync>;

    /// A weak service pointer holding an instance of `dyn Any`.
    pub type WeakDynSvc = Weak<dyn Any + Send + Sync>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: Any + Send + Sync {}
    impl<T: ?Sized + Any + Send + Sync> Service for T {}

    /// Implemented automatically on closures usable as a factory body.
    pub trait FactoryFn:
        Fn(Arguments) -> ContainerResult<Value> + Send + Sync
    {
    }
    impl<F> FactoryFn for F where
        F: Fn(Arguments) -> ContainerResult<Value> + Send + Sync
    {
    }

    /// Implemented automatically on closures usable as a method body. The
    /// first argument is the receiver ([`Value::Null`] for static methods).
    pub trait MethodFn:
        Fn(&Value, Arguments) -> ContainerResult<Value> + Send + Sync
    {
    }
    impl<F> MethodFn for F where
        F: Fn(&Value, Arguments) -> ContainerResult<Value> + Send + Sync
    {
    }

    pub(crate) type Shared<T> = Arc<Mutex<T>>;

    impl<T> SharedEx<T> for Shared<T> {
        fn new(value: T) -> Self {
            Arc::new(Mutex::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.lock().unwrap_or_else(PoisonError::into_inner))
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }
}

#[cfg(feature = "rc")]
mod types {
    use super::SharedEx;
    use crate::{Arguments, ContainerResult, Value};
    use std::{
        any::Any,
        cell::RefCell,
        rc::{Rc, Weak},
    };

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Rc<T>;

    /// A reference-counted service pointer holding an instance of `dyn Any`.
    pub type DynSvc = Rc<dyn Any>;

    /// A weak service pointer holding an instance of `dyn Any`.
    pub type WeakDynSvc = Weak<dyn Any>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: Any {}
    impl<T: ?Sized + Any> Service for T {}

    /// Implemented automatically on closures usable as a factory body.
    pub trait FactoryFn: Fn(Arguments) -> ContainerResult<Value> {}
    impl<F> FactoryFn for F where F: Fn(Arguments) -> ContainerResult<Value> {}

    /// Implemented automatically on closures usable as a method body. The
    /// first argument is the receiver ([`Value::Null`] for static methods).
    pub trait MethodFn: Fn(&Value, Arguments) -> ContainerResult<Value> {}
    impl<F> MethodFn for F where
        F: Fn(&Value, Arguments) -> ContainerResult<Value>
    {
    }

    pub(crate) type Shared<T> = Rc<RefCell<T>>;

    impl<T> SharedEx<T> for Shared<T> {
        fn new(value: T) -> Self {
            Rc::new(RefCell::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.borrow())
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.borrow_mut())
        }
    }
}

#[allow(clippy::wildcard_imports)]
pub use types::*;

/// An identifier naming an entry in the container. Usually a class name, but
/// any string key is valid.
pub type Identifier = String;

/// A plain function usable as a factory body. Functions carry no captured
/// state, which lets the compiler inline them into a compiled unit.
pub type FactoryFnPtr = fn(Arguments) -> ContainerResult<Value>;
