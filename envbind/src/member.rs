use std::{any::Any, fmt, sync::Arc};

use crate::{Value, parser::ValueParser, schema::TypeInfo};

type FieldGetter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
type PropertyGetter = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), MismatchedType> + Send + Sync>;

/// Raised by a setter handed an instance or a value of the wrong type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MismatchedType {
    pub expected: &'static str,
}

/// The current value of a member as read through its getter.
pub enum MemberValue<'a> {
    Borrowed(&'a dyn Any),
    Owned(Value),
}

impl MemberValue<'_> {
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        match self {
            Self::Borrowed(value) => value.downcast_ref(),
            Self::Owned(value) => value.downcast_ref(),
        }
    }
}

struct MemberMeta {
    name: &'static str,
    ty: TypeInfo,
    nullable: bool,
    required: bool,
    opted_in: bool,
    opted_out: bool,
    parser: Option<Arc<dyn ValueParser>>,
}

impl MemberMeta {
    fn new(name: &'static str, ty: TypeInfo, nullable: bool) -> Self {
        Self {
            name,
            ty,
            nullable,
            required: false,
            opted_in: false,
            opted_out: false,
            parser: None,
        }
    }
}

/// A member assigned directly through a field reference.
pub struct Field {
    meta: MemberMeta,
    get: FieldGetter,
    set: Setter,
}

/// A member assigned through accessor functions. The setter may be missing,
/// which makes the property unusable for binding.
pub struct Property {
    meta: MemberMeta,
    get: Option<PropertyGetter>,
    set: Option<Setter>,
}

/// A bindable member of a type.
pub enum MemberDescriptor {
    Property(Property),
    Field(Field),
}

fn field_getter<F>(f: F) -> FieldGetter
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn property_getter<T, V, G>(getter: G) -> PropertyGetter
where
    T: Any,
    V: Any + Send,
    G: Fn(&T) -> V + Send + Sync + 'static,
{
    Arc::new(move |target: &dyn Any| {
        target
            .downcast_ref::<T>()
            .map(|t| Box::new(getter(t)) as Value)
    })
}

fn setter<T, V, S>(set: S) -> Setter
where
    T: Any,
    V: Any,
    S: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |target: &mut dyn Any, value: Value| {
        let target = target.downcast_mut::<T>().ok_or(MismatchedType {
            expected: std::any::type_name::<T>(),
        })?;
        let value = value.downcast::<V>().map_err(|_| MismatchedType {
            expected: std::any::type_name::<V>(),
        })?;
        set(target, *value);
        Ok(())
    })
}

impl MemberDescriptor {
    /// A field of type `V` on `T`.
    pub fn field<T, V, G, S>(name: &'static str, getter: G, set: S) -> Self
    where
        T: Any,
        V: Any,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::Field(Field {
            meta: MemberMeta::new(name, TypeInfo::of::<V>(), false),
            get: field_getter(move |target| {
                target.downcast_ref::<T>().map(|t| getter(t) as &dyn Any)
            }),
            set: setter(set),
        })
    }

    /// An `Option<V>` field on `T`. The member's declared type is `V`, and
    /// the setter wraps the parsed value in `Some`.
    pub fn nullable_field<T, V, G, S>(name: &'static str, getter: G, set: S) -> Self
    where
        T: Any,
        V: Any,
        G: Fn(&T) -> &Option<V> + Send + Sync + 'static,
        S: Fn(&mut T, Option<V>) + Send + Sync + 'static,
    {
        Self::Field(Field {
            meta: MemberMeta::new(name, TypeInfo::of::<V>(), true),
            get: field_getter(move |target| {
                target.downcast_ref::<T>().map(|t| getter(t) as &dyn Any)
            }),
            set: setter(move |target: &mut T, value: V| set(target, Some(value))),
        })
    }

    /// A property read and written through accessor functions.
    pub fn property<T, V, G, S>(name: &'static str, getter: G, set: S) -> Self
    where
        T: Any,
        V: Any + Send,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self::Property(Property {
            meta: MemberMeta::new(name, TypeInfo::of::<V>(), false),
            get: Some(property_getter(getter)),
            set: Some(setter(set)),
        })
    }

    /// A property over an `Option<V>`. Like [`nullable_field`], the declared
    /// type is `V` and the setter receives `Some`.
    ///
    /// [`nullable_field`]: MemberDescriptor::nullable_field
    pub fn nullable_property<T, V, G, S>(name: &'static str, getter: G, set: S) -> Self
    where
        T: Any,
        V: Any + Send,
        G: Fn(&T) -> Option<V> + Send + Sync + 'static,
        S: Fn(&mut T, Option<V>) + Send + Sync + 'static,
    {
        Self::Property(Property {
            meta: MemberMeta::new(name, TypeInfo::of::<V>(), true),
            get: Some(property_getter(getter)),
            set: Some(setter(move |target: &mut T, value: V| set(target, Some(value)))),
        })
    }

    /// A property without a setter. Plans refuse to bind it.
    pub fn read_only_property<T, V, G>(name: &'static str, getter: G) -> Self
    where
        T: Any,
        V: Any + Send,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self::Property(Property {
            meta: MemberMeta::new(name, TypeInfo::of::<V>(), false),
            get: Some(property_getter(getter)),
            set: None,
        })
    }

    /// Marks the member as required regardless of its nullability.
    pub fn required(mut self) -> Self {
        self.meta_mut().required = true;
        self
    }

    /// Selects the member under [`Discovery::OptIn`](crate::Discovery::OptIn).
    pub fn include(mut self) -> Self {
        self.meta_mut().opted_in = true;
        self
    }

    /// Excludes the member under [`Discovery::OptOut`](crate::Discovery::OptOut).
    pub fn skip(mut self) -> Self {
        self.meta_mut().opted_out = true;
        self
    }

    /// Parses this member with `parser` instead of the registry's choice.
    pub fn with_parser(mut self, parser: Arc<dyn ValueParser>) -> Self {
        self.meta_mut().parser = Some(parser);
        self
    }

    pub fn name(&self) -> &'static str {
        self.meta().name
    }

    pub fn ty(&self) -> TypeInfo {
        self.meta().ty
    }

    pub fn is_required(&self) -> bool {
        self.meta().required
    }

    pub fn is_nullable(&self) -> bool {
        self.meta().nullable
    }

    pub fn is_opted_in(&self) -> bool {
        self.meta().opted_in
    }

    pub fn is_opted_out(&self) -> bool {
        self.meta().opted_out
    }

    pub fn parser(&self) -> Option<&Arc<dyn ValueParser>> {
        self.meta().parser.as_ref()
    }

    pub fn has_setter(&self) -> bool {
        match self {
            Self::Property(p) => p.set.is_some(),
            Self::Field(_) => true,
        }
    }

    pub fn get<'a>(&self, target: &'a dyn Any) -> Option<MemberValue<'a>> {
        match self {
            Self::Property(p) => {
                let get = p.get.as_ref()?;
                get(target).map(MemberValue::Owned)
            }
            Self::Field(f) => (f.get)(target).map(MemberValue::Borrowed),
        }
    }

    /// Assigns `value` to the member of `target`. Properties without a setter
    /// never reach this point since plans reject them.
    pub fn set(&self, target: &mut dyn Any, value: Value) -> Result<(), MismatchedType> {
        match self {
            Self::Property(Property { set: Some(set), .. }) | Self::Field(Field { set, .. }) => {
                set(target, value)
            }
            Self::Property(Property { set: None, meta, .. }) => Err(MismatchedType {
                expected: meta.ty.name(),
            }),
        }
    }

    fn meta(&self) -> &MemberMeta {
        match self {
            Self::Property(p) => &p.meta,
            Self::Field(f) => &f.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut MemberMeta {
        match self {
            Self::Property(p) => &mut p.meta,
            Self::Field(f) => &mut f.meta,
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Property(_) => "Property",
            Self::Field(_) => "Field",
        };
        f.debug_struct(kind)
            .field("name", &self.name())
            .field("ty", &self.ty())
            .field("required", &self.is_required())
            .field("nullable", &self.is_nullable())
            .finish_non_exhaustive()
    }
}
