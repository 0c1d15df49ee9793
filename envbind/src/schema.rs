use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

use crate::{constructor::ConstructorDescriptor, member::MemberDescriptor};

/// Identity of a type taking part in binding.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub(crate) fn is_string(&self) -> bool {
        self.is::<String>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Member selection rule of a type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Every member is bound unless it is marked as skipped.
    #[default]
    OptOut,
    /// Only members marked as included are bound.
    OptIn,
}

/// Everything the binder needs to know about a type: how it can be
/// constructed and which members can be assigned afterwards.
pub struct TypeSchema {
    ty: TypeInfo,
    discovery: Discovery,
    constructors: Vec<ConstructorDescriptor>,
    members: Vec<MemberDescriptor>,
}

impl TypeSchema {
    pub fn builder<T: Any>() -> TypeSchemaBuilder {
        TypeSchemaBuilder {
            schema: TypeSchema {
                ty: TypeInfo::of::<T>(),
                discovery: Discovery::default(),
                constructors: Vec::new(),
                members: Vec::new(),
            },
        }
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    pub fn discovery(&self) -> Discovery {
        self.discovery
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub(crate) fn into_parts(self) -> (Vec<ConstructorDescriptor>, Vec<MemberDescriptor>) {
        (self.constructors, self.members)
    }
}

pub struct TypeSchemaBuilder {
    schema: TypeSchema,
}

impl TypeSchemaBuilder {
    pub fn discovery(mut self, discovery: Discovery) -> Self {
        self.schema.discovery = discovery;
        self
    }

    /// Declares a constructor. Declaration order is the tie-break used when
    /// no parameterless constructor exists.
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.schema.constructors.push(constructor);
        self
    }

    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.schema.members.push(member);
        self
    }

    pub fn build(self) -> TypeSchema {
        self.schema
    }
}

/// Types that describe themselves to the binder.
///
/// Usually implemented with `#[derive(Bind)]`.
pub trait Bindable: Any + Send + Sized {
    fn schema() -> TypeSchema;
}

/// A type-erased handle to a [`Bindable`] type, for binding without naming
/// the type statically.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    ty: TypeInfo,
    schema: fn() -> TypeSchema,
}

impl TypeHandle {
    pub fn of<T: Bindable>() -> Self {
        Self {
            ty: TypeInfo::of::<T>(),
            schema: T::schema,
        }
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    pub(crate) fn schema(&self) -> TypeSchema {
        (self.schema)()
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.ty).finish()
    }
}
