//! Placeholder interpolation for titles and descriptions.
//!
//! Tokens look like `{0}`, `{name}` or `{category.name}`. Path captures and
//! caller context win over object attributes and are humanized on the way in
//! (hyphens become spaces, words are title-cased) since they come straight
//! from URL segments. Object attributes are tried with a language suffix
//! first (`name_en`), then plain, and dotted tokens traverse nested
//! relations. Interpolation is idempotent: a string without tokens passes
//! through untouched.

use crate::errors::{SeoError, SeoResult};
use crate::models::domain::{AttrValue, SeoObject};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"\{\s*([^{}\s]+)\s*\}").unwrap();
}

/// Everything a single interpolation run can draw values from.
pub struct Interpolation<'a> {
    pub object: Option<&'a dyn SeoObject>,
    pub lang_code: &'a str,
    /// Positional path captures, addressed by `{0}`, `{1}`, …
    pub captures: &'a [String],
    /// Named path captures merged with the caller-supplied context.
    pub context: &'a HashMap<String, String>,
    /// In strict mode an unresolvable token is an error; otherwise the
    /// literal placeholder is left in place.
    pub strict: bool,
}

/// Substitute every token in `input` from `ctx`.
pub fn interpolate(input: &str, ctx: &Interpolation<'_>) -> SeoResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut last_end = 0;

    for caps in TOKEN_RE.captures_iter(input) {
        let (Some(whole), Some(token)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let token = token.as_str();
        out.push_str(&input[last_end..whole.start()]);

        match resolve_token(token, ctx)? {
            Some(value) => out.push_str(&value),
            None if ctx.strict => {
                return Err(SeoError::MissingPlaceholder(token.to_string()));
            }
            None => out.push_str(whole.as_str()),
        }
        last_end = whole.end();
    }

    out.push_str(&input[last_end..]);
    Ok(out)
}

/// Turn a URL segment into display text: `red-shoes` becomes `Red Shoes`.
pub fn humanize(segment: &str) -> String {
    segment
        .replace('-', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_token(token: &str, ctx: &Interpolation<'_>) -> SeoResult<Option<String>> {
    // Tier 1: positional captures and named context, humanized.
    if let Ok(index) = token.parse::<usize>() {
        if let Some(segment) = ctx.captures.get(index) {
            return Ok(Some(humanize(segment)));
        }
    }
    if let Some(value) = ctx.context.get(token) {
        return Ok(Some(humanize(value)));
    }

    // Tier 2: object attributes, language-suffixed first.
    if let Some(object) = ctx.object {
        if token.contains('.') {
            // Dotted traversal substitutes empty when any hop is absent.
            return Ok(Some(traverse(object, token, ctx.lang_code)));
        }
        if let Some(value) = lookup(object, token, ctx.lang_code) {
            return Ok(Some(value_text(value)));
        }
    }

    Ok(None)
}

/// Single-segment attribute lookup with language preference.
fn lookup<'a>(object: &'a dyn SeoObject, name: &str, lang: &str) -> Option<AttrValue<'a>> {
    let suffixed = format!("{}_{}", name, lang);
    object
        .attribute(&suffixed)
        .or_else(|| object.attribute(name))
}

fn value_text(value: AttrValue<'_>) -> String {
    match value {
        AttrValue::Text(text) => text,
        AttrValue::Nested(_) => String::new(),
    }
}

/// Walk `a.b.c` through nested relations; any absent hop yields "".
fn traverse(object: &dyn SeoObject, token: &str, lang: &str) -> String {
    let mut current = object;
    let mut segments = token.split('.').peekable();

    while let Some(segment) = segments.next() {
        match lookup(current, segment, lang) {
            Some(AttrValue::Nested(next)) if segments.peek().is_some() => current = next,
            Some(value) if segments.peek().is_none() => return value_text(value),
            _ => return String::new(),
        }
    }
    String::new()
}
