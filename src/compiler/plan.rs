use crate::{
    container::tag_class, Arguments, Callable, CompiledUnit, Container,
    ContainerError, ContainerResult, Identifier, Overrides, Value,
};
use std::fmt::{Display, Formatter};

/// A resolution strategy decided ahead of time for one value.
#[derive(Clone, Debug)]
pub enum Plan {
    /// A value used as-is.
    Literal(Value),

    /// A list whose items are planned separately.
    List(Vec<Plan>),

    /// An associative list whose values are planned separately.
    Map(Vec<(String, Plan)>),

    /// Resolve an entry through [`Container::get`].
    Get(Identifier),

    /// Resolve a typed parameter through [`Container::get`]. A failure is
    /// reported against the parameter and the entity declaring it.
    Dependency {
        id: Identifier,
        parameter: String,
        entity: Option<Identifier>,
    },

    /// Run another accessor of the same unit directly, without caching.
    Accessor(usize),

    /// Construct a class with pre-planned constructor arguments.
    Construct {
        class: Identifier,
        constructor: Callable,
        arguments: Vec<(String, Plan)>,
    },

    /// Run a function body with pre-planned arguments.
    Invoke {
        callable: Callable,
        arguments: Vec<(String, Plan)>,
    },

    /// Invoke a closure through the container. The planned arguments are
    /// passed as overrides and anything missing is resolved at runtime.
    Call {
        callable: Callable,
        arguments: Vec<(String, Plan)>,
    },

    /// Look up the current definition of an entry at runtime and invoke it
    /// if it is still a factory.
    ResolveFactory {
        id: Identifier,
        arguments: Vec<(String, Plan)>,
    },
}

impl Plan {
    pub(crate) fn evaluate(
        &self,
        unit: &CompiledUnit,
        container: &Container,
    ) -> ContainerResult<Value> {
        match self {
            Plan::Literal(value) => Ok(value.clone()),
            Plan::List(items) => items
                .iter()
                .map(|item| item.evaluate(unit, container))
                .collect::<ContainerResult<_>>()
                .map(Value::List),
            Plan::Map(entries) => evaluate_all(entries, unit, container).map(Value::Map),
            Plan::Get(id) => container.get(id),
            Plan::Dependency {
                id,
                parameter,
                entity,
            } => container.get(id).map_err(|source| {
                ContainerError::UnresolvedDependency {
                    parameter: parameter.clone(),
                    entity: entity.clone(),
                    source: Box::new(source),
                }
            }),
            Plan::Accessor(index) => unit
                .accessor_at(*index)
                .ok_or_else(|| ContainerError::InvalidDefinition {
                    reason: format!("compiled unit {} has no accessor {index}", unit.name()),
                })?
                .evaluate(unit, container),
            Plan::Construct {
                class,
                constructor,
                arguments,
            } => {
                let arguments = Arguments::new(
                    constructor.signature().entity.clone(),
                    evaluate_all(arguments, unit, container)?,
                );
                let value = constructor.invoke(arguments)?;
                Ok(tag_class(value, class))
            }
            Plan::Invoke {
                callable,
                arguments,
            } => callable.invoke(Arguments::new(
                callable.signature().entity.clone(),
                evaluate_all(arguments, unit, container)?,
            )),
            Plan::Call {
                callable,
                arguments,
            } => {
                let overrides = evaluate_all(arguments, unit, container)?
                    .into_iter()
                    .collect::<Overrides>();
                container.invoke(callable, &overrides)
            }
            Plan::ResolveFactory { id, arguments } => {
                let overrides = evaluate_all(arguments, unit, container)?
                    .into_iter()
                    .collect::<Overrides>();
                container.resolve_factory(id, &overrides)
            }
        }
    }
}

fn evaluate_all(
    plans: &[(String, Plan)],
    unit: &CompiledUnit,
    container: &Container,
) -> ContainerResult<Vec<(String, Value)>> {
    plans
        .iter()
        .map(|(name, plan)| Ok((name.clone(), plan.evaluate(unit, container)?)))
        .collect()
}

/// Renders the plan as an expression of the unit's listing.
impl Display for Plan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Plan::Literal(value) => write!(f, "{value}"),
            Plan::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Plan::Map(entries) => {
                write!(f, "{{")?;
                for (index, (key, plan)) in entries.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {plan}")?;
                }
                write!(f, "}}")
            }
            Plan::Get(id) | Plan::Dependency { id, .. } => {
                write!(f, "self.get({id:?})")
            }
            Plan::Accessor(index) => {
                write!(f, "self.{}()", CompiledUnit::accessor_name(*index))
            }
            Plan::Construct {
                class, arguments, ..
            } => {
                write!(f, "new {class}(")?;
                write_arguments(f, arguments)?;
                write!(f, ")")
            }
            Plan::Invoke {
                callable,
                arguments,
            } => {
                let entity = callable.signature().entity.as_deref();
                write!(f, "{}(", entity.unwrap_or("fn"))?;
                write_arguments(f, arguments)?;
                write!(f, ")")
            }
            Plan::Call { arguments, .. } => {
                write!(f, "self.call(<closure>, {{")?;
                write_arguments(f, arguments)?;
                write!(f, "}})")
            }
            Plan::ResolveFactory { id, arguments } => {
                write!(f, "self.resolve_factory({id:?}, {{")?;
                write_arguments(f, arguments)?;
                write!(f, "}})")
            }
        }
    }
}

fn write_arguments(
    f: &mut Formatter<'_>,
    arguments: &[(String, Plan)],
) -> std::fmt::Result {
    for (index, (name, plan)) in arguments.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{name}: {plan}")?;
    }
    Ok(())
}
