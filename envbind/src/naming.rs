/// Derives external keys from member names: an optional prefix and the name,
/// each in SCREAMING_SNAKE_CASE, joined by a separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyContext {
    prefix: Option<String>,
    separator: Option<String>,
}

impl KeyContext {
    pub fn new(prefix: Option<&str>, separator: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(screaming_snake_case).filter(|p| !p.is_empty()),
            separator: separator.map(ToOwned::to_owned),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The key a member named `name` is read from.
    ///
    /// ```
    /// use envbind::KeyContext;
    ///
    /// let ctx = KeyContext::new(Some("App"), Some("_"));
    /// assert_eq!(ctx.full_name("databaseUrl"), "APP_DATABASE_URL");
    ///
    /// let ctx = KeyContext::new(Some("app"), None);
    /// assert_eq!(ctx.full_name("port"), "APPPORT");
    /// ```
    pub fn full_name(&self, name: &str) -> String {
        let name = screaming_snake_case(name);
        match (&self.prefix, &self.separator) {
            (Some(prefix), Some(separator)) => format!("{prefix}{separator}{name}"),
            (Some(prefix), None) => format!("{prefix}{name}"),
            (None, _) => name,
        }
    }
}

/// Splits `s` into words at case changes and non-alphanumeric characters and
/// joins them upper-cased with `_`.
pub(crate) fn screaming_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }

        out.extend(c.to_uppercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}
