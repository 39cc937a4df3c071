//! Preprocessor directive classification.

/// Target of an `#include`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum IncludeTarget<'a> {
    /// `#include "foo.h"`
    Quoted(&'a str),
    /// `#include <foo.h>`
    System(&'a str),
}

/// A classified directive line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Directive<'a> {
    /// Object-like macro. `body` is untrimmed of comments and may be empty.
    Define { name: &'a str, body: &'a str },
    /// `#define NAME(args) ...`
    FunctionMacro { name: &'a str },
    Include(IncludeTarget<'a>),
    /// Anything else (`#if`, `#pragma`, ...), by directive name.
    Other(&'a str),
}

/// Classify the full text of a directive token (leading `#` included).
pub(crate) fn classify(text: &str) -> Directive<'_> {
    let rest = text.strip_prefix('#').unwrap_or(text).trim_start();
    let (name, body) = split_ident(rest);
    match name {
        "define" => {
            let (macro_name, after) = split_ident(body.trim_start());
            if macro_name.is_empty() {
                Directive::Other(name)
            } else if after.starts_with('(') {
                Directive::FunctionMacro { name: macro_name }
            } else {
                Directive::Define {
                    name: macro_name,
                    body: after.trim(),
                }
            }
        }
        "include" | "include_next" => {
            let body = body.trim();
            if let Some(quoted) = body.strip_prefix('"') {
                match quoted.find('"') {
                    Some(end) => Directive::Include(IncludeTarget::Quoted(&quoted[..end])),
                    None => Directive::Other(name),
                }
            } else if let Some(system) = body.strip_prefix('<') {
                match system.find('>') {
                    Some(end) => Directive::Include(IncludeTarget::System(&system[..end])),
                    None => Directive::Other(name),
                }
            } else {
                Directive::Other(name)
            }
        }
        other => Directive::Other(other),
    }
}

fn split_ident(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    s.split_at(end)
}
