use std::{any::Any, borrow::Cow, fmt, sync::Arc};

use tracing::trace;

use crate::{
    BindError, Instance, Value, parser::ValueParser, registry::ParserRegistry, schema::TypeInfo,
};

type Factory = Arc<dyn Fn(&mut Arguments) -> Result<Instance, BindError> + Send + Sync>;

/// Value a constructor parameter takes when its key is absent.
#[derive(Clone)]
pub enum DefaultValue {
    /// Parsed exactly like a value read from the key source.
    Raw(Cow<'static, str>),
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
            Self::Computed(_) => f.write_str("Computed"),
        }
    }
}

pub struct ParamDescriptor {
    name: &'static str,
    ty: TypeInfo,
    nullable: bool,
    required: bool,
    default: Option<DefaultValue>,
    parser: Option<Arc<dyn ValueParser>>,
}

impl ParamDescriptor {
    pub fn new<V: Any>(name: &'static str) -> Self {
        Self {
            name,
            ty: TypeInfo::of::<V>(),
            nullable: false,
            required: false,
            default: None,
            parser: None,
        }
    }

    /// A parameter of type `Option<V>`; absent keys bind `None`.
    pub fn nullable<V: Any>(name: &'static str) -> Self {
        Self {
            nullable: true,
            ..Self::new::<V>(name)
        }
    }

    pub fn default_raw(mut self, raw: impl Into<Cow<'static, str>>) -> Self {
        self.default = Some(DefaultValue::Raw(raw.into()));
        self
    }

    pub fn default_with<V, F>(mut self, f: F) -> Self
    where
        V: Any + Send,
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Computed(Arc::new(move || {
            Box::new(f()) as Value
        })));
        self
    }

    /// Requires the key to be present even if a default is declared.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ValueParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_optional(&self) -> bool {
        !self.required && (self.default.is_some() || self.nullable)
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn parser(&self) -> Option<&Arc<dyn ValueParser>> {
        self.parser.as_ref()
    }
}

impl fmt::Debug for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("nullable", &self.nullable)
            .field("required", &self.required)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

struct Slot {
    key: String,
    value: Option<Value>,
}

/// Resolved constructor arguments, in parameter order.
pub struct Arguments {
    slots: Vec<Slot>,
}

impl Arguments {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, key: String, value: Option<Value>) {
        self.slots.push(Slot { key, value });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Moves the argument at `index` out as a `V`.
    pub fn take<V: Any>(&mut self, index: usize) -> Result<V, BindError> {
        self.take_nullable(index)?
            .ok_or_else(|| BindError::missing(self.key(index)))
    }

    pub fn take_nullable<V: Any>(&mut self, index: usize) -> Result<Option<V>, BindError> {
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(BindError::missing(format!("<argument {index}>")));
        };
        let Some(value) = slot.value.take() else {
            return Ok(None);
        };

        value
            .downcast::<V>()
            .map(|value| Some(*value))
            .map_err(|_| BindError::TypeMismatch {
                key: slot.key.clone(),
                expected: std::any::type_name::<V>(),
            })
    }

    fn key(&self, index: usize) -> String {
        self.slots
            .get(index)
            .map(|slot| slot.key.clone())
            .unwrap_or_else(|| format!("<argument {index}>"))
    }
}

/// A way of creating an instance of a type from resolved arguments.
pub struct ConstructorDescriptor {
    params: Vec<ParamDescriptor>,
    factory: Factory,
}

impl ConstructorDescriptor {
    pub fn parameterless<T, F>(f: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            factory: Arc::new(move |_: &mut Arguments| Ok(Box::new(f()) as Instance)),
        }
    }

    pub fn new<T, F>(params: Vec<ParamDescriptor>, f: F) -> Self
    where
        T: Any + Send,
        F: Fn(&mut Arguments) -> Result<T, BindError> + Send + Sync + 'static,
    {
        Self {
            params,
            factory: Arc::new(move |args: &mut Arguments| Ok(Box::new(f(args)?) as Instance)),
        }
    }

    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn is_parameterless(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn invoke(&self, args: &mut Arguments) -> Result<Instance, BindError> {
        (self.factory)(args)
    }

    fn qualifies(&self, registry: &ParserRegistry) -> bool {
        self.params
            .iter()
            .filter(|param| !param.is_optional())
            .all(|param| param.ty.is_string() || registry.can_parse(&param.ty))
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Picks the constructor a plan instantiates its type with.
///
/// A parameterless constructor always wins. Otherwise the first constructor,
/// in declaration order, whose non-optional parameters can all be parsed is
/// selected.
pub(crate) fn resolve(
    ty: TypeInfo,
    mut constructors: Vec<ConstructorDescriptor>,
    registry: &ParserRegistry,
) -> Result<ConstructorDescriptor, BindError> {
    registry.union(
        constructors
            .iter()
            .flat_map(|ctor| ctor.params.iter())
            .filter_map(|param| param.parser.clone()),
    );

    if let Some(index) = constructors.iter().position(|c| c.is_parameterless()) {
        trace!(%ty, "selected parameterless constructor");
        return Ok(constructors.swap_remove(index));
    }

    match constructors.iter().position(|c| c.qualifies(registry)) {
        Some(index) => {
            trace!(%ty, index, "selected constructor");
            Ok(constructors.swap_remove(index))
        }
        None => Err(BindError::NoSuitableConstructor {
            type_name: ty.name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Endpoint {
        host: String,
        port: u16,
    }

    struct Unparsable;

    fn endpoint(host: &str, port: u16) -> Endpoint {
        Endpoint {
            host: host.to_owned(),
            port,
        }
    }

    fn with_host_and_port() -> ConstructorDescriptor {
        ConstructorDescriptor::new(
            vec![
                ParamDescriptor::new::<String>("host"),
                ParamDescriptor::new::<u16>("port"),
            ],
            |args| Ok(Endpoint {
                host: args.take(0)?,
                port: args.take(1)?,
            }),
        )
    }

    fn with_unparsable() -> ConstructorDescriptor {
        ConstructorDescriptor::new(
            vec![ParamDescriptor::new::<Unparsable>("inner")],
            |args| {
                let _: Unparsable = args.take(0)?;
                Ok(endpoint("unparsable", 0))
            },
        )
    }

    fn invoke(ctor: &ConstructorDescriptor, args: &mut Arguments) -> Endpoint {
        *ctor.invoke(args).unwrap().downcast::<Endpoint>().unwrap()
    }

    #[test]
    fn parameterless_wins_regardless_of_order() {
        let registry = ParserRegistry::with_builtins();
        let constructors = vec![
            with_host_and_port(),
            ConstructorDescriptor::parameterless(|| endpoint("default", 1)),
        ];

        let selected = resolve(TypeInfo::of::<Endpoint>(), constructors, &registry).unwrap();

        assert!(selected.is_parameterless());
        let endpoint = invoke(&selected, &mut Arguments::with_capacity(0));
        assert_eq!(endpoint.host, "default");
    }

    #[test]
    fn first_qualifying_constructor_in_declaration_order() {
        let registry = ParserRegistry::with_builtins();
        let constructors = vec![with_unparsable(), with_host_and_port()];

        let selected = resolve(TypeInfo::of::<Endpoint>(), constructors, &registry).unwrap();

        assert_eq!(selected.params().len(), 2);
        assert_eq!(selected.params()[0].name(), "host");
    }

    #[test]
    fn optional_parameters_do_not_need_parsers() {
        let registry = ParserRegistry::with_builtins();
        let constructors = vec![ConstructorDescriptor::new(
            vec![ParamDescriptor::nullable::<Unparsable>("inner")],
            |args| {
                let _: Option<Unparsable> = args.take_nullable(0)?;
                Ok(endpoint("nullable", 0))
            },
        )];

        let selected = resolve(TypeInfo::of::<Endpoint>(), constructors, &registry).unwrap();

        assert!(selected.params()[0].is_optional());
    }

    #[test]
    fn no_constructor_is_an_error() {
        let registry = ParserRegistry::with_builtins();

        let err = resolve(TypeInfo::of::<Endpoint>(), vec![], &registry).unwrap_err();
        assert!(matches!(err, BindError::NoSuitableConstructor { .. }));

        let err = resolve(TypeInfo::of::<Endpoint>(), vec![with_unparsable()], &registry)
            .unwrap_err();
        assert!(matches!(err, BindError::NoSuitableConstructor { .. }));
    }

    #[test]
    fn arguments_report_missing_and_mismatched_values() {
        let ctor = with_host_and_port();
        let mut args = Arguments::with_capacity(2);
        args.push("HOST".to_owned(), Some(Box::new("localhost".to_owned())));
        args.push("PORT".to_owned(), Some(Box::new(8080u32)));

        let err = ctor.invoke(&mut args).unwrap_err();
        assert!(matches!(
            err,
            BindError::TypeMismatch { ref key, expected: "u16" } if key == "PORT"
        ));

        let mut args = Arguments::with_capacity(2);
        args.push("HOST".to_owned(), Some(Box::new("localhost".to_owned())));
        args.push("PORT".to_owned(), None);

        let err = ctor.invoke(&mut args).unwrap_err();
        assert_eq!(err.key(), Some("PORT"));

        let mut args = Arguments::with_capacity(2);
        args.push("HOST".to_owned(), Some(Box::new("localhost".to_owned())));
        args.push("PORT".to_owned(), Some(Box::new(8080u16)));

        let endpoint = invoke(&ctor, &mut args);
        assert_eq!((endpoint.host.as_str(), endpoint.port), ("localhost", 8080));
    }
}
