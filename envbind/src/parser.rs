use std::{any::Any, borrow::Cow, fmt, marker::PhantomData, str::FromStr, sync::Arc};

use rust_decimal::Decimal;

use crate::{BoxError, Value, schema::TypeInfo};

/// Return type for functions that can be used with the `with` attribute or
/// registered through [`Binder::register_fn`](crate::Binder::register_fn).
pub type ParseResult<T> = Result<T, BoxError>;

/// A typed conversion from a string.
///
/// Implemented for every `Fn(&str) -> ParseResult<T>`, so plain functions can
/// be used wherever a parser is expected.
pub trait Parser<T>: Send + Sync {
    fn parse(&self, s: &str) -> ParseResult<T>;
}

impl<T, F> Parser<T> for F
where
    F: for<'a> Fn(&'a str) -> ParseResult<T> + Send + Sync,
{
    fn parse(&self, s: &str) -> ParseResult<T> {
        (self)(s)
    }
}

pub fn from_str<T>(s: &str) -> ParseResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse::<T>().map_err(|e| e.into())
}

pub fn into<T>(s: &str) -> ParseResult<T>
where
    T: From<String>,
{
    Ok(s.to_owned().into())
}

/// A type-erased parser as stored in the [`ParserRegistry`](crate::ParserRegistry).
///
/// Parsers are compared by capability: two parsers with the same
/// [`target`](ValueParser::target) are considered equal, and the registry
/// keeps whichever was registered first.
pub trait ValueParser: Send + Sync {
    /// The type this parser produces.
    fn target(&self) -> TypeInfo;

    /// Capability test used for resolution. Defaults to an exact match on
    /// [`target`](ValueParser::target).
    fn can_parse_into(&self, ty: &TypeInfo) -> bool {
        self.target() == *ty
    }

    /// Converts `value` into `ty`. `Ok(None)` means the parser ran but did
    /// not produce a usable value.
    fn parse(&self, value: &str, ty: &TypeInfo) -> ParseResult<Option<Value>>;
}

/// Adapts a typed [`Parser`] into a [`ValueParser`] producing `T`.
pub struct FnParser<T> {
    inner: Box<dyn Parser<T>>,
    _target: PhantomData<fn() -> T>,
}

impl<T> FnParser<T>
where
    T: Any + Send,
{
    pub fn new<P>(parser: P) -> Self
    where
        P: Parser<T> + 'static,
    {
        Self {
            inner: Box::new(parser),
            _target: PhantomData,
        }
    }

    pub fn shared<P>(parser: P) -> Arc<dyn ValueParser>
    where
        P: Parser<T> + 'static,
    {
        Arc::new(Self::new(parser))
    }
}

impl<T> ValueParser for FnParser<T>
where
    T: Any + Send,
{
    fn target(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn parse(&self, value: &str, _ty: &TypeInfo) -> ParseResult<Option<Value>> {
        let parsed = self.inner.parse(value)?;
        Ok(Some(Box::new(parsed)))
    }
}

impl<T> fmt::Debug for FnParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnParser")
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

#[derive(Debug)]
struct InvalidNumber(&'static str);

impl fmt::Display for InvalidNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for InvalidNumber {}

/// Strips surrounding whitespace and `,` thousands separators from the
/// integral part of a number. The decimal point is always `.`.
fn normalize_number(s: &str) -> ParseResult<Cow<'_, str>> {
    let s = s.trim();
    if !s.contains(',') {
        return Ok(Cow::Borrowed(s));
    }

    let unsigned = s.trim_start_matches(['+', '-']);
    let sign = &s[..s.len() - unsigned.len()];
    let integral_end = unsigned
        .find(['.', 'e', 'E'])
        .unwrap_or(unsigned.len());
    let (integral, rest) = unsigned.split_at(integral_end);

    if rest.contains(',') {
        return Err(InvalidNumber("thousands separator after the integral part").into());
    }
    if integral.starts_with(',') || integral.ends_with(',') {
        return Err(InvalidNumber("misplaced thousands separator").into());
    }

    let mut normalized = String::with_capacity(s.len());
    normalized.push_str(sign);
    normalized.extend(integral.chars().filter(|c| *c != ','));
    normalized.push_str(rest);

    Ok(Cow::Owned(normalized))
}

fn parse_number<T>(s: &str) -> ParseResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    from_str(&normalize_number(s)?)
}

fn parse_decimal(s: &str) -> ParseResult<Decimal> {
    let normalized = normalize_number(s)?;
    if normalized.contains(['e', 'E']) {
        Ok(Decimal::from_scientific(&normalized)?)
    } else {
        Ok(Decimal::from_str(&normalized)?)
    }
}

fn parse_bool(s: &str) -> ParseResult<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("expected `true` or `false`, found \"{s}\"").into())
    }
}

macro_rules! number_parsers {
    ($($ty:ty),* $(,)?) => {
        [$(FnParser::<$ty>::shared(parse_number::<$ty>)),*]
    };
}

/// Parsers every registry starts with, in resolution order.
pub(crate) fn builtins() -> Vec<Arc<dyn ValueParser>> {
    let mut parsers = vec![FnParser::<bool>::shared(parse_bool)];
    parsers.extend(number_parsers![
        i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize, f32, f64,
    ]);
    parsers.push(FnParser::<Decimal>::shared(parse_decimal));
    parsers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with<T: Any + Send + Copy>(parsers: &[Arc<dyn ValueParser>], raw: &str) -> T {
        let ty = TypeInfo::of::<T>();
        let parser = parsers
            .iter()
            .find(|p| p.can_parse_into(&ty))
            .expect("builtin parser");
        let value = parser.parse(raw, &ty).unwrap().unwrap();
        *value.downcast::<T>().unwrap()
    }

    #[test]
    fn thousands_separators_for_every_integer_width() {
        let parsers = builtins();

        assert_eq!(parse_with::<i16>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<u16>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<i32>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<u32>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<i64>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<u64>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<i128>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<u128>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<isize>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<usize>(&parsers, "1,234"), 1234);
        assert_eq!(parse_with::<i8>(&parsers, "1,2"), 12);
        assert_eq!(parse_with::<u8>(&parsers, "2,55"), 255);
    }

    #[test]
    fn signs_whitespace_and_fractions() {
        let parsers = builtins();

        assert_eq!(parse_with::<i32>(&parsers, "  -1,000,000 "), -1_000_000);
        assert_eq!(parse_with::<u32>(&parsers, "+42"), 42);
        assert_eq!(parse_with::<f64>(&parsers, "1,234.5"), 1234.5);
        assert_eq!(parse_with::<f32>(&parsers, "2.5e3"), 2500.0);
        assert_eq!(
            parse_with::<Decimal>(&parsers, "12,345.678"),
            Decimal::from_str("12345.678").unwrap()
        );
        assert_eq!(
            parse_with::<Decimal>(&parsers, "1.5e2"),
            Decimal::from_str("150").unwrap()
        );
    }

    #[test]
    fn rejects_misplaced_separators() {
        assert!(normalize_number(",123").is_err());
        assert!(normalize_number("123,").is_err());
        assert!(normalize_number("1.2,3").is_err());
        assert!(parse_number::<u8>("-1").is_err());
        assert!(parse_number::<i32>("1.5").is_err());
    }

    #[test]
    fn booleans_are_case_insensitive() {
        let parsers = builtins();

        assert!(parse_with::<bool>(&parsers, "TRUE"));
        assert!(parse_with::<bool>(&parsers, " true "));
        assert!(!parse_with::<bool>(&parsers, "False"));
        assert!(parse_bool("yes").is_err());
    }
}
