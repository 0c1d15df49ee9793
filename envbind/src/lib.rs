mod binder;
mod constructor;
mod discovery;
mod error;
mod member;
mod naming;
mod parser;
mod plan;
mod registry;
mod schema;
mod source;

#[doc(hidden)]
#[path = "private.rs"]
pub mod __private;

use std::{any::Any, sync::Arc};

use once_cell::sync::Lazy;

pub use binder::{AbsentMemberPolicy, Binder, BinderBuilder, BinderConfig};
pub use constructor::{Arguments, ConstructorDescriptor, DefaultValue, ParamDescriptor};
pub use envbind_derive::Bind;
pub use error::BindError;
pub use member::{Field, MemberDescriptor, MemberValue, MismatchedType, Property};
pub use naming::KeyContext;
pub use parser::{FnParser, ParseResult, Parser, ValueParser, from_str, into};
pub use plan::{BindingPlan, PlanCache};
pub use registry::ParserRegistry;
pub use schema::{Bindable, Discovery, TypeHandle, TypeInfo, TypeSchema, TypeSchemaBuilder};
pub use source::{KeySource, MapSource, ProcessEnv};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A parsed value before it is assigned to its member or parameter.
pub type Value = Box<dyn Any + Send>;

/// A constructed instance of a bound type.
pub type Instance = Box<dyn Any + Send>;

static GLOBAL: Lazy<Binder> = Lazy::new(Binder::new);

/// The process-wide binder behind the free functions of this crate. It reads
/// the process environment and uses `_` as the prefix separator.
pub fn global() -> &'static Binder {
    &GLOBAL
}

/// Binds `T` from the process environment.
///
/// ```no_run
/// use envbind::Bind;
///
/// #[derive(Bind)]
/// pub struct Database {
///     url: String,
///     #[bind(default = "5")]
///     pool_size: u32,
/// }
///
/// // Reads DATABASE_URL and DATABASE_POOL_SIZE.
/// let db: Database = envbind::bind(Some("database")).unwrap();
/// ```
pub fn bind<T: Bindable>(prefix: Option<&str>) -> Result<T, BindError> {
    GLOBAL.bind(prefix)
}

pub fn bind_type(handle: &TypeHandle, prefix: Option<&str>) -> Result<Instance, BindError> {
    GLOBAL.bind_type(handle, prefix)
}

pub fn register_parser(parser: Arc<dyn ValueParser>) -> bool {
    GLOBAL.register_parser(parser)
}

pub fn register_fn<T, P>(parser: P) -> bool
where
    T: Any + Send,
    P: Parser<T> + 'static,
{
    GLOBAL.register_fn(parser)
}

pub fn can_parse(ty: &TypeInfo) -> bool {
    GLOBAL.can_parse(ty)
}

pub fn requirements<T: Bindable>(prefix: Option<&str>) -> Result<String, BindError> {
    GLOBAL.requirements::<T>(prefix)
}
