use crate::{Overrides, ParameterDescriptor, Service, Signature};

/// Classifies every parameter of a signature for one invocation.
///
/// Resolvers never fail. A parameter that nothing can satisfy is still
/// returned, and the consumer reports it when it tries to use it.
pub trait ArgumentResolver: Service {
    /// Returns one descriptor per parameter, in declaration order.
    fn resolve(
        &self,
        signature: &Signature,
        overrides: &Overrides,
    ) -> Vec<ParameterDescriptor>;
}

/// Resolves parameters from overrides, then declared classes, then defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultArgumentResolver;

impl ArgumentResolver for DefaultArgumentResolver {
    fn resolve(
        &self,
        signature: &Signature,
        overrides: &Overrides,
    ) -> Vec<ParameterDescriptor> {
        let entity = signature.entity.as_deref();
        signature
            .parameters
            .iter()
            .map(|parameter| {
                let mut descriptor = ParameterDescriptor::of(parameter, entity);
                if let Some(value) = overrides.get(&parameter.name) {
                    descriptor.resolved = Some(value.clone());
                } else if let Some(class) = parameter.class_hint() {
                    descriptor.declared_type = Some(class.to_owned());
                }
                descriptor
            })
            .collect()
    }
}
