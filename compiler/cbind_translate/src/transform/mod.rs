//! Named identifier transforms.
//!
//! Built-ins are fixed; naming conventions beyond them are plugins registered by
//! name in a [`TransformRegistry`].

use rustc_hash::FxHashMap;

use crate::ConfigError;

/// An identifier transform loadable by name.
pub trait NamingConvention: Send + Sync {
    fn apply(&self, ident: &str) -> String;
}

impl<F> NamingConvention for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn apply(&self, ident: &str) -> String {
        self(ident)
    }
}

/// Transforms every configuration can use without registering anything.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Lower,
    Upper,
    /// Upper-case the first letter of every `_`-separated word.
    Title,
    /// Strip leading underscores and upper-case the first letter.
    Export,
    /// Strip leading underscores and lower-case the first letter.
    Unexport,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "lower" => Builtin::Lower,
            "upper" => Builtin::Upper,
            "title" => Builtin::Title,
            "export" => Builtin::Export,
            "unexport" => Builtin::Unexport,
            _ => return None,
        })
    }

    pub fn apply(self, ident: &str) -> String {
        match self {
            Builtin::Lower => ident.to_lowercase(),
            Builtin::Upper => ident.to_uppercase(),
            Builtin::Title => ident
                .split('_')
                .map(upper_first)
                .collect::<Vec<_>>()
                .join("_"),
            Builtin::Export => upper_first(ident.trim_start_matches('_')),
            Builtin::Unexport => lower_first(ident.trim_start_matches('_')),
        }
    }
}

/// A transform resolved against a registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Transform {
    Builtin(Builtin),
    /// Index into the registry's plugins.
    Plugin(usize),
}

/// Plugin transforms by name.
pub struct TransformRegistry {
    names: FxHashMap<String, usize>,
    plugins: Vec<Box<dyn NamingConvention>>,
}

impl TransformRegistry {
    /// A registry with no plugins.
    pub fn empty() -> Self {
        TransformRegistry {
            names: FxHashMap::default(),
            plugins: Vec::new(),
        }
    }

    /// Register `convention` under `name`, replacing an earlier registration.
    pub fn register(&mut self, name: impl Into<String>, convention: impl NamingConvention + 'static) {
        let name = name.into();
        if let Some(&index) = self.names.get(&name) {
            self.plugins[index] = Box::new(convention);
        } else {
            self.names.insert(name, self.plugins.len());
            self.plugins.push(Box::new(convention));
        }
    }

    /// Resolve a transform name: built-ins first, then plugins.
    pub fn lookup(&self, name: &str) -> Result<Transform, ConfigError> {
        if let Some(builtin) = Builtin::from_name(name) {
            return Ok(Transform::Builtin(builtin));
        }
        self.names
            .get(name)
            .map(|&index| Transform::Plugin(index))
            .ok_or_else(|| ConfigError::UnknownTransform(name.to_string()))
    }

    pub fn apply(&self, transform: Transform, ident: &str) -> String {
        match transform {
            Transform::Builtin(builtin) => builtin.apply(ident),
            Transform::Plugin(index) => match self.plugins.get(index) {
                Some(plugin) => plugin.apply(ident),
                None => ident.to_string(),
            },
        }
    }
}

impl Default for TransformRegistry {
    /// Registry with the bundled `snakecase`, `camelcase` and `pascalcase` plugins.
    fn default() -> Self {
        let mut registry = TransformRegistry::empty();
        registry.register("snakecase", snake_case);
        registry.register("camelcase", camel_case);
        registry.register("pascalcase", pascal_case);
        registry
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TransformRegistry")
            .field("plugins", &names)
            .finish()
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split an identifier into words at `_`, `-` and case boundaries.
///
/// `HTTPServer_port2` splits into `HTTP`, `Server`, `port2`.
pub fn split_words(ident: &str) -> Vec<String> {
    let chars: Vec<char> = ident.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `fooBar_baz` to `foo_bar_baz`.
pub fn snake_case(ident: &str) -> String {
    split_words(ident)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `foo_bar_baz` to `fooBarBaz`.
pub fn camel_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, word) in split_words(ident).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            out.push_str(&upper_first(&lower));
        }
    }
    out
}

/// `foo_bar_baz` to `FooBarBaz`.
pub fn pascal_case(ident: &str) -> String {
    split_words(ident)
        .iter()
        .map(|w| upper_first(&w.to_lowercase()))
        .collect()
}
