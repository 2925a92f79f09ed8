mod plan;
mod unit;

pub use plan::*;
pub use unit::*;

use crate::{
    ArgumentResolver, CachePolicy, Container, ContainerError, ContainerResult,
    Definition, DefinitionKind, Entry, Identifier, Overrides, Reflection,
    Registry, Resolution, Signature, Value,
};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Compiles every definition of a registry into a [`CompiledUnit`].
///
/// The compiler makes the same decisions the container makes at runtime,
/// once, ahead of time. Parameters that cannot be satisfied are reported
/// here instead of on first use, with the exception of factories with
/// captured state, which always defer to the live registry.
pub fn compile(
    registry: &Registry,
    reflection: &dyn Reflection,
    resolver: &dyn ArgumentResolver,
) -> ContainerResult<CompiledUnit> {
    let mut compiler = Compiler {
        registry,
        reflection,
        resolver,
        accessors: Vec::new(),
        entries: HashMap::new(),
        queue: VecDeque::new(),
    };

    for (id, entry) in registry.iter() {
        if let Entry::Definition(_) = entry {
            compiler.queue.push_back(id.to_owned());
        }
    }

    while let Some(id) = compiler.queue.pop_front() {
        if compiler.entries.contains_key(&id) {
            continue;
        }

        // Reference targets without a definition stay with the runtime.
        if let Some(definition) = registry.definition(&id) {
            compiler
                .compile_definition(Some(&id), definition)
                .map_err(|error| error.wrap(&id))?;
        }
    }

    let unit = CompiledUnit::new(compiler.accessors, compiler.entries);
    debug!(unit = unit.name(), accessors = unit.len(), "compiled registry");
    Ok(unit)
}

struct Compiler<'a> {
    registry: &'a Registry,
    reflection: &'a dyn Reflection,
    resolver: &'a dyn ArgumentResolver,
    accessors: Vec<Accessor>,
    entries: HashMap<Identifier, usize>,
    queue: VecDeque<Identifier>,
}

impl Compiler<'_> {
    /// Compiles a definition into an accessor and returns its index. Each
    /// registry entry compiles to exactly one accessor.
    fn compile_definition(
        &mut self,
        id: Option<&str>,
        definition: &Definition,
    ) -> ContainerResult<usize> {
        if let Some(index) = id.and_then(|id| self.entries.get(id)) {
            return Ok(*index);
        }

        let index = self.accessors.len();
        self.accessors.push(Accessor {
            name: CompiledUnit::accessor_name(index),
            entry: id.map(ToOwned::to_owned),
            plan: Plan::Literal(Value::Null),
            policy: if id.is_some() {
                definition.cache_policy()
            } else {
                CachePolicy::Skip
            },
        });
        if let Some(id) = id {
            self.entries.insert(id.to_owned(), index);
        }

        let plan = self.plan_definition(id, definition)?;
        debug!(accessor = index, entry = id, "compiled accessor");
        self.accessors[index].plan = plan;
        Ok(index)
    }

    fn plan_definition(
        &mut self,
        id: Option<&str>,
        definition: &Definition,
    ) -> ContainerResult<Plan> {
        match definition.kind() {
            DefinitionKind::Value(value) => self.plan_value(value),
            DefinitionKind::Reference(target) => {
                self.schedule(target);
                Ok(Plan::Get(target.clone()))
            }
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
                let info = self.reflection.class_info(class).ok_or_else(|| {
                    ContainerError::NotFound {
                        id: class.to_owned(),
                    }
                })?;
                if !info.is_instantiable() {
                    return Err(ContainerError::StructuralInstantiation {
                        id: class.to_owned(),
                        kind: info.kind,
                    });
                }
                let constructor = info.constructor.clone().ok_or_else(|| {
                    ContainerError::InvalidDefinition {
                        reason: format!("class {class} has no constructor"),
                    }
                })?;

                let arguments =
                    self.plan_arguments(constructor.signature(), parameters)?;
                Ok(Plan::Construct {
                    class: class.to_owned(),
                    constructor,
                    arguments,
                })
            }
            DefinitionKind::Factory {
                callable,
                parameters,
            } if callable.captures_state() => {
                // Captured state cannot be inlined. Whatever can be planned
                // now is passed along and the rest is resolved at runtime.
                let arguments = self
                    .plan_arguments(callable.signature(), parameters)
                    .unwrap_or_default();
                Ok(match id {
                    Some(id) => Plan::ResolveFactory {
                        id: id.to_owned(),
                        arguments,
                    },
                    None => Plan::Call {
                        callable: callable.clone(),
                        arguments,
                    },
                })
            }
            DefinitionKind::Factory {
                callable,
                parameters,
            } => {
                let arguments =
                    self.plan_arguments(callable.signature(), parameters)?;
                Ok(Plan::Invoke {
                    callable: callable.clone(),
                    arguments,
                })
            }
        }
    }

    fn plan_arguments(
        &mut self,
        signature: &Signature,
        parameters: &Overrides,
    ) -> ContainerResult<Vec<(String, Plan)>> {
        let descriptors = self.resolver.resolve(signature, parameters);
        let mut arguments = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let plan = match descriptor.resolution() {
                Resolution::Explicit(value) => self.plan_value(value)?,
                Resolution::ByType(class) if self.is_buildable(class) => {
                    self.schedule(class);
                    Plan::Dependency {
                        id: class.to_owned(),
                        parameter: descriptor.name.clone(),
                        entity: descriptor.declaring_entity.clone(),
                    }
                }
                Resolution::ByType(_) | Resolution::Unresolved => {
                    match &descriptor.default_value {
                        Some(default) if descriptor.is_optional => {
                            Plan::Literal(default.clone())
                        }
                        _ => {
                            return Err(ContainerError::UnresolvedParameter {
                                parameter: descriptor.name,
                                entity: descriptor.declaring_entity,
                            })
                        }
                    }
                }
                Resolution::Default(default) => Plan::Literal(default.clone()),
            };
            arguments.push((descriptor.name, plan));
        }

        Ok(arguments)
    }

    fn plan_value(&mut self, value: &Value) -> ContainerResult<Plan> {
        match value {
            Value::Definition(definition) => {
                let index = self.compile_definition(None, definition)?;
                Ok(Plan::Accessor(index))
            }
            Value::List(items) if value.contains_definition() => items
                .iter()
                .map(|item| self.plan_value(item))
                .collect::<ContainerResult<_>>()
                .map(Plan::List),
            Value::Map(entries) if value.contains_definition() => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.plan_value(item)?)))
                .collect::<ContainerResult<_>>()
                .map(Plan::Map),
            value => Ok(Plan::Literal(value.clone())),
        }
    }

    /// Whether a dependency declared as `class` exists as a compile target
    /// or can be constructed directly.
    fn is_buildable(&self, class: &str) -> bool {
        class == Container::ID
            || self.registry.has(class)
            || self
                .reflection
                .class_info(class)
                .map_or(false, |info| info.is_instantiable())
    }

    fn schedule(&mut self, id: &str) {
        if !self.entries.contains_key(id) && self.registry.definition(id).is_some() {
            self.queue.push_back(id.to_owned());
        }
    }
}
