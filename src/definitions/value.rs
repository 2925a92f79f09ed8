use crate::{Definition, DynSvc, Identifier, Service, Svc, WeakDynSvc};
use std::{
    any::type_name,
    fmt::{Debug, Display, Formatter},
};

/// A value produced by, or stored in, the container.
///
/// Values are cheap to clone: strings and collections are copied, objects and
/// nested definitions are shared.
#[derive(Clone)]
pub enum Value {
    /// An explicit "present but unset" value.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// An ordered associative list of values.
    Map(Vec<(String, Value)>),
    /// A shared object.
    Object(Instance),
    /// A definition which is resolved when the value is used.
    Definition(Svc<Definition>),
}

impl Value {
    /// Moves `value` into a new shared object.
    pub fn object<T: Service>(value: T) -> Self {
        Value::Object(Instance::new(value))
    }

    /// Wraps an already shared object.
    pub fn shared<T: Service>(value: Svc<T>) -> Self {
        Value::Object(Instance::from_svc(value))
    }

    /// Moves `value` into a new shared object that can be shallow-copied when
    /// it is used as the receiver of [`Container::call`](crate::Container::call).
    pub fn cloneable<T: Service + Clone>(value: T) -> Self {
        let mut instance = Instance::new(value);
        instance.copy = Some(shallow_copy::<T>);
        Value::Object(instance)
    }

    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Gets the boolean held by this value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Gets the integer held by this value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Gets the number held by this value. Integers are widened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Gets the string held by this value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Gets the items of a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Gets the object held by this value.
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Tries to get the object held by this value as a concrete type.
    #[must_use]
    pub fn downcast<T: Service>(&self) -> Option<Svc<T>> {
        self.as_instance().and_then(Instance::downcast)
    }

    /// Whether this value or anything nested inside of it is a definition.
    #[must_use]
    pub fn contains_definition(&self) -> bool {
        match self {
            Value::Definition(_) => true,
            Value::List(items) => items.iter().any(Value::contains_definition),
            Value::Map(entries) => {
                entries.iter().any(|(_, value)| value.contains_definition())
            }
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Definition(a), Value::Definition(b)) => Svc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(value) => write!(f, "Bool({value})"),
            Value::Int(value) => write!(f, "Int({value})"),
            Value::Float(value) => write!(f, "Float({value:?})"),
            Value::Str(value) => write!(f, "Str({value:?})"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(key, value)| (key, value)))
                .finish(),
            Value::Object(instance) => write!(f, "{instance:?}"),
            Value::Definition(definition) => {
                write!(f, "Definition({definition:?})")
            }
        }
    }
}

/// Renders the value as a literal. Objects and definitions cannot be written
/// as literals, so they are rendered as a placeholder naming their type.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value:?}"),
            Value::Str(value) => write!(f, "{value:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Object(instance) => {
                write!(f, "<object {}>", instance.class_name())
            }
            Value::Definition(_) => write!(f, "<definition>"),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_scalar!(
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Str,
    &str => Str,
);

impl From<Definition> for Value {
    fn from(definition: Definition) -> Self {
        Value::Definition(Svc::new(definition))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A type-erased shared object.
#[derive(Clone)]
pub struct Instance {
    class: Option<Identifier>,
    type_name: &'static str,
    inner: DynSvc,
    copy: Option<fn(&DynSvc) -> Option<DynSvc>>,
}

impl Instance {
    /// Moves `value` into a new shared object.
    pub fn new<T: Service>(value: T) -> Self {
        Instance::from_svc(Svc::new(value))
    }

    /// Wraps an already shared object.
    pub fn from_svc<T: Service>(value: Svc<T>) -> Self {
        let inner: DynSvc = value;
        Instance {
            class: None,
            type_name: type_name::<T>(),
            inner,
            copy: None,
        }
    }

    /// Tags this object with the class it was built as.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<Identifier>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// The class this object was built as, if the container built it.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// The class this object was built as, falling back to its Rust type.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class.as_deref().unwrap_or(self.type_name)
    }

    /// The Rust type name of the object.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Tries to get the object as a concrete type.
    #[must_use]
    pub fn downcast<T: Service>(&self) -> Option<Svc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Whether both instances point to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Svc::ptr_eq(&self.inner, &other.inner)
    }

    /// Creates a shallow copy of the object if it was created with
    /// [`Value::cloneable`], otherwise shares the same object.
    #[must_use]
    pub fn shallow_copy(&self) -> Instance {
        let copied = self.copy.and_then(|copy| copy(&self.inner));
        match copied {
            Some(inner) => Instance {
                inner,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakInstance {
        WeakInstance {
            class: self.class.clone(),
            type_name: self.type_name,
            handle: Svc::downgrade(&self.inner),
            copy: self.copy,
        }
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A weak hold on an [`Instance`]. The object may be dropped while this is
/// held; [`WeakInstance::upgrade`] then returns `None`.
#[derive(Clone)]
pub(crate) struct WeakInstance {
    class: Option<Identifier>,
    type_name: &'static str,
    handle: WeakDynSvc,
    copy: Option<fn(&DynSvc) -> Option<DynSvc>>,
}

impl WeakInstance {
    pub fn upgrade(&self) -> Option<Instance> {
        self.handle.upgrade().map(|inner| Instance {
            class: self.class.clone(),
            type_name: self.type_name,
            inner,
            copy: self.copy,
        })
    }
}

fn shallow_copy<T: Service + Clone>(inner: &DynSvc) -> Option<DynSvc> {
    let value = inner.clone().downcast::<T>().ok()?;
    let copy: DynSvc = Svc::new(T::clone(&value));
    Some(copy)
}
