use std::{any::Any, sync::Arc};

use parking_lot::RwLock;
use tracing::trace;

use crate::{
    parser::{self, FnParser, Parser, ValueParser},
    schema::TypeInfo,
};

/// Append-only set of value parsers, resolved in registration order.
pub struct ParserRegistry {
    parsers: RwLock<Vec<Arc<dyn ValueParser>>>,
}

impl ParserRegistry {
    /// A registry without any parsers. Only `String` members can be bound.
    pub fn empty() -> Self {
        Self {
            parsers: RwLock::new(Vec::new()),
        }
    }

    /// A registry seeded with parsers for `bool`, every integer width, `f32`,
    /// `f64` and [`rust_decimal::Decimal`].
    pub fn with_builtins() -> Self {
        Self {
            parsers: RwLock::new(parser::builtins()),
        }
    }

    /// Adds `parser` unless a parser for the same target is already
    /// registered. Returns whether it was added.
    pub fn register(&self, parser: Arc<dyn ValueParser>) -> bool {
        let mut parsers = self.parsers.write();
        Self::insert(&mut parsers, parser)
    }

    pub fn register_fn<T, P>(&self, parser: P) -> bool
    where
        T: Any + Send,
        P: Parser<T> + 'static,
    {
        self.register(FnParser::<T>::shared(parser))
    }

    /// Registers every parser, skipping those whose target is already covered.
    pub fn union(&self, parsers: impl IntoIterator<Item = Arc<dyn ValueParser>>) {
        let mut parsers = parsers.into_iter().peekable();
        if parsers.peek().is_none() {
            return;
        }

        let mut registered = self.parsers.write();
        for parser in parsers {
            Self::insert(&mut registered, parser);
        }
    }

    pub fn can_parse(&self, ty: &TypeInfo) -> bool {
        self.parsers.read().iter().any(|p| p.can_parse_into(ty))
    }

    /// The first registered parser able to produce `ty`.
    pub fn resolve(&self, ty: &TypeInfo) -> Option<Arc<dyn ValueParser>> {
        self.parsers
            .read()
            .iter()
            .find(|p| p.can_parse_into(ty))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.parsers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.read().is_empty()
    }

    fn insert(parsers: &mut Vec<Arc<dyn ValueParser>>, parser: Arc<dyn ValueParser>) -> bool {
        let target = parser.target();
        if parsers.iter().any(|p| p.target() == target) {
            trace!(%target, "parser already registered");
            return false;
        }

        trace!(%target, "registered parser");
        parsers.push(parser);
        true
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
