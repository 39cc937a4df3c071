//! Identifier pattern matching.

use std::fmt;

use regex::Regex;

use crate::ConfigError;

/// Matches raw identifiers and rewrites the matched parts.
pub trait NameMatcher: fmt::Debug + Send + Sync {
    fn matches(&self, candidate: &str) -> bool;

    /// Replace every match in `candidate`.
    ///
    /// Each match is replaced by the expansion of `to` (or by the matched text when
    /// `to` is absent), passed through `piece` first. Text between matches is kept.
    fn rewrite(&self, candidate: &str, to: Option<&str>, piece: &dyn Fn(String) -> String)
        -> String;
}

/// Regex-backed matcher; the default for configured patterns.
#[derive(Clone, Debug)]
pub struct RegexMatcher {
    re: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(pattern).map_err(|source| ConfigError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(RegexMatcher { re })
    }

    pub fn as_str(&self) -> &str {
        self.re.as_str()
    }
}

impl NameMatcher for RegexMatcher {
    #[inline]
    fn matches(&self, candidate: &str) -> bool {
        self.re.is_match(candidate)
    }

    fn rewrite(
        &self,
        candidate: &str,
        to: Option<&str>,
        piece: &dyn Fn(String) -> String,
    ) -> String {
        let mut out = String::with_capacity(candidate.len());
        let mut last = 0;
        for caps in self.re.captures_iter(candidate) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&candidate[last..whole.start()]);
            let mut replaced = String::new();
            match to {
                Some(template) => caps.expand(template, &mut replaced),
                None => replaced.push_str(whole.as_str()),
            }
            out.push_str(&piece(replaced));
            last = whole.end();
        }
        out.push_str(&candidate[last..]);
        out
    }
}

/// Matches one exact identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiteralMatcher {
    name: String,
}

impl LiteralMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        LiteralMatcher { name: name.into() }
    }
}

impl NameMatcher for LiteralMatcher {
    #[inline]
    fn matches(&self, candidate: &str) -> bool {
        candidate == self.name
    }

    fn rewrite(
        &self,
        candidate: &str,
        to: Option<&str>,
        piece: &dyn Fn(String) -> String,
    ) -> String {
        if self.matches(candidate) {
            piece(to.unwrap_or(candidate).to_string())
        } else {
            candidate.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests can panic")]

    use super::*;

    #[test]
    fn regex_rewrite_expands_captures() {
        let m = RegexMatcher::new("^foo_([a-z]+)$").unwrap();
        let out = m.rewrite("foo_bar", Some("${1}_t"), &|s| s);
        assert_eq!(out, "bar_t");
    }

    #[test]
    fn regex_rewrite_transforms_only_the_pieces() {
        let m = RegexMatcher::new("_[a-z]").unwrap();
        let out = m.rewrite("foo_bar_baz", None, &|s| s.to_uppercase());
        assert_eq!(out, "foo_Bar_Baz");
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let err = RegexMatcher::new("(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn literal_matcher_is_exact() {
        let m = LiteralMatcher::new("foo");
        assert!(m.matches("foo"));
        assert!(!m.matches("foobar"));
        assert_eq!(m.rewrite("foo", Some("bar"), &|s| s), "bar");
        assert_eq!(m.rewrite("foobar", Some("bar"), &|s| s), "foobar");
    }
}
