use std::{any::Any, sync::Arc};

use tracing::{debug, trace};

use crate::{
    BindError, Instance, Value,
    constructor::{Arguments, DefaultValue},
    naming::KeyContext,
    parser::{Parser, ValueParser},
    plan::{BindingPlan, PlanCache},
    registry::ParserRegistry,
    schema::{Bindable, TypeHandle, TypeInfo},
    source::{KeySource, ProcessEnv},
};

/// What happens to a member whose key is absent when the member is neither
/// required nor nullable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AbsentMemberPolicy {
    /// Fail with [`BindError::MissingRequiredVariable`].
    #[default]
    Fail,
    /// Leave the member at the value the constructor gave it.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    /// Placed between the prefix and the member name. `None` concatenates.
    pub separator: Option<String>,
    pub absent_members: AbsentMemberPolicy,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            separator: Some("_".to_owned()),
            absent_members: AbsentMemberPolicy::default(),
        }
    }
}

/// Binds key-source values into [`Bindable`] types.
///
/// A binder owns its parser registry and plan cache, so independent binders
/// never observe each other's registrations. It is `Send + Sync` and meant to
/// be shared.
pub struct Binder {
    registry: ParserRegistry,
    plans: PlanCache,
    source: Box<dyn KeySource>,
    config: BinderConfig,
}

#[derive(Default)]
pub struct BinderBuilder {
    registry: Option<ParserRegistry>,
    source: Option<Box<dyn KeySource>>,
    config: BinderConfig,
}

impl BinderBuilder {
    pub fn separator(mut self, separator: Option<&str>) -> Self {
        self.config.separator = separator.map(ToOwned::to_owned);
        self
    }

    pub fn absent_members(mut self, policy: AbsentMemberPolicy) -> Self {
        self.config.absent_members = policy;
        self
    }

    pub fn config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Reads values from `source` instead of the process environment.
    pub fn source(mut self, source: impl KeySource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Starts from `registry` instead of the built-in parsers.
    pub fn registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Binder {
        Binder {
            registry: self.registry.unwrap_or_default(),
            plans: PlanCache::new(),
            source: self.source.unwrap_or_else(|| Box::new(ProcessEnv)),
            config: self.config,
        }
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// A binder over the process environment with the built-in parsers.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> BinderBuilder {
        BinderBuilder::default()
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn plans(&self) -> &PlanCache {
        &self.plans
    }

    pub fn register_parser(&self, parser: Arc<dyn ValueParser>) -> bool {
        self.registry.register(parser)
    }

    pub fn register_fn<T, P>(&self, parser: P) -> bool
    where
        T: Any + Send,
        P: Parser<T> + 'static,
    {
        self.registry.register_fn(parser)
    }

    pub fn can_parse(&self, ty: &TypeInfo) -> bool {
        ty.is_string() || self.registry.can_parse(ty)
    }

    pub fn keys(&self, prefix: Option<&str>) -> KeyContext {
        KeyContext::new(prefix, self.config.separator.as_deref())
    }

    /// Reads the value of `name` under `prefix`, named the way members are.
    pub fn lookup(&self, prefix: Option<&str>, name: &str) -> Option<String> {
        self.source.get(&self.keys(prefix).full_name(name))
    }

    /// Writes `value` under `prefix` and `name`, named the way members are.
    /// `None` removes the key.
    pub fn store(&self, prefix: Option<&str>, name: &str, value: Option<&str>) {
        let key = self.keys(prefix).full_name(name);
        trace!(%key, set = value.is_some(), "storing key");
        self.source.set(&key, value);
    }

    pub fn plan<T: Bindable>(&self) -> Result<Arc<BindingPlan>, BindError> {
        self.plans
            .get_or_build(&TypeHandle::of::<T>(), &self.registry)
    }

    pub fn bind<T: Bindable>(&self, prefix: Option<&str>) -> Result<T, BindError> {
        let instance = self.bind_type(&TypeHandle::of::<T>(), prefix)?;

        instance
            .downcast::<T>()
            .map(|instance| *instance)
            .map_err(|_| BindError::TypeMismatch {
                key: prefix.unwrap_or_default().to_owned(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Binds the type behind `handle` without naming it statically.
    pub fn bind_type(
        &self,
        handle: &TypeHandle,
        prefix: Option<&str>,
    ) -> Result<Instance, BindError> {
        let plan = self.plans.get_or_build(handle, &self.registry)?;
        let keys = self.keys(prefix);
        debug!(ty = %plan.ty(), prefix = keys.prefix(), "binding");

        let mut instance = self.construct(&plan, &keys)?;
        self.populate(&plan, &keys, &mut instance)?;

        Ok(instance)
    }

    /// Lists the keys `T` is bound from as `KEY=default` lines, constructor
    /// parameters first.
    pub fn requirements<T: Bindable>(&self, prefix: Option<&str>) -> Result<String, BindError> {
        let plan = self.plan::<T>()?;
        let keys = self.keys(prefix);
        let mut requirements = String::new();

        for param in plan.constructor().params() {
            let default = match param.default() {
                Some(DefaultValue::Raw(raw)) => raw.as_ref(),
                Some(DefaultValue::Computed(_)) | None => "",
            };
            requirements.push_str(&format!("{}={default}\n", keys.full_name(param.name())));
        }
        for member in plan.members() {
            requirements.push_str(&format!("{}=\n", keys.full_name(member.name())));
        }

        Ok(requirements)
    }

    fn construct(&self, plan: &BindingPlan, keys: &KeyContext) -> Result<Instance, BindError> {
        let ctor = plan.constructor();
        let mut args = Arguments::with_capacity(ctor.params().len());

        for param in ctor.params() {
            let key = keys.full_name(param.name());
            let ty = param.ty();

            let value = match self.source.get(&key) {
                Some(raw) => {
                    trace!(%key, %ty, "parameter set");
                    self.parse(&key, &raw, &ty, param.parser())?
                }
                None if param.is_optional() => {
                    trace!(%key, %ty, "parameter defaulted");
                    match param.default() {
                        Some(DefaultValue::Raw(raw)) => self.parse(&key, raw, &ty, param.parser())?,
                        Some(DefaultValue::Computed(default)) => Some(default()),
                        None => None,
                    }
                }
                None => return Err(BindError::missing(key)),
            };

            if value.is_none() && !param.is_nullable() {
                return Err(BindError::missing(key));
            }
            args.push(key, value);
        }

        ctor.invoke(&mut args)
    }

    fn populate(
        &self,
        plan: &BindingPlan,
        keys: &KeyContext,
        instance: &mut Instance,
    ) -> Result<(), BindError> {
        for member in plan.members() {
            let key = keys.full_name(member.name());
            let ty = member.ty();

            let Some(raw) = self.source.get(&key) else {
                if member.is_required() {
                    return Err(BindError::missing(key));
                }
                if member.is_nullable() {
                    trace!(%key, %ty, "nullable member unset");
                    continue;
                }
                match self.config.absent_members {
                    AbsentMemberPolicy::Fail => return Err(BindError::missing(key)),
                    AbsentMemberPolicy::Skip => {
                        trace!(%key, %ty, "member unset");
                        continue;
                    }
                }
            };

            match self.parse(&key, &raw, &ty, member.parser())? {
                Some(value) => {
                    member
                        .set(&mut **instance, value)
                        .map_err(|mismatch| BindError::TypeMismatch {
                            key,
                            expected: mismatch.expected,
                        })?;
                }
                None if member.is_nullable() => {}
                None => return Err(BindError::missing(key)),
            }
        }

        Ok(())
    }

    /// Explicit parser first, then `String` pass-through, then the registry.
    /// An explicit parser that can't produce `ty` is an error, never skipped.
    fn parse(
        &self,
        key: &str,
        raw: &str,
        ty: &TypeInfo,
        explicit: Option<&Arc<dyn ValueParser>>,
    ) -> Result<Option<Value>, BindError> {
        let parser = match explicit {
            Some(parser) if parser.can_parse_into(ty) => Arc::clone(parser),
            Some(parser) => {
                debug!(%key, %ty, target = %parser.target(), "explicit parser can't produce type");
                return Err(BindError::NoParserAvailable {
                    type_name: ty.name(),
                });
            }
            None if ty.is_string() => return Ok(Some(Box::new(raw.to_owned()))),
            None => self
                .registry
                .resolve(ty)
                .ok_or(BindError::NoParserAvailable {
                    type_name: ty.name(),
                })?,
        };

        parser
            .parse(raw, ty)
            .map_err(|source| BindError::ParseFailure {
                key: key.to_owned(),
                value: raw.to_owned(),
                type_name: ty.name(),
                source,
            })
    }
}
