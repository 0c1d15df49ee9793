//! Items used by the code `#[derive(Bind)]` generates.
//!
//! These are not meant to be used directly by users of the library.
pub use crate::constructor::{Arguments, ConstructorDescriptor, ParamDescriptor};
pub use crate::error::BindError;
pub use crate::member::MemberDescriptor;
pub use crate::parser::{FnParser, from_str, into};
pub use crate::schema::{Bindable, Discovery, TypeSchema};
