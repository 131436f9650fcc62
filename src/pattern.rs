//! Templated-path matching.
//!
//! A template is an absolute path whose segments may contain placeholders of
//! the form `{0}`, `{1}`, … (positional) or `{slug}` (named). Compilation
//! turns the template into an anchored regex where each placeholder captures
//! one run of word characters or hyphens; matching a concrete path yields the
//! captured segments in order. Several templates matching the same path is
//! expected; picking one is the resolver's job, not this module's.

use crate::errors::{SeoError, SeoResult};
use regex::Regex;
use std::collections::HashMap;

/// True when `path` uses placeholder syntax and therefore cannot be matched
/// literally. Unbalanced braces count too; they are rejected later, at
/// compile time.
pub fn has_parameters(path: &str) -> bool {
    path.contains('{') || path.contains('}')
}

/// A compiled path template.
#[derive(Debug)]
pub struct PathTemplate {
    regex: Regex,
    tokens: Vec<String>,
}

/// The outcome of matching a concrete path against a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// Captured segments in placeholder order.
    pub segments: Vec<String>,
    /// Captured segments keyed by placeholder name, for named placeholders.
    pub named: HashMap<String, String>,
}

impl PathTemplate {
    /// Compile `template` into an anchored matcher.
    ///
    /// Returns `MalformedTemplate` for unbalanced braces, empty placeholders
    /// or tokens that are neither an integer nor an identifier.
    pub fn compile(template: &str) -> SeoResult<Self> {
        let mut pattern = String::from("^");
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices();

        while let Some((idx, ch)) = chars.next() {
            match ch {
                '{' => {
                    let close = template[idx + 1..].find(['{', '}']).map(|off| idx + 1 + off);
                    match close {
                        Some(close) if template[close..].starts_with('}') => {
                            let token = template[idx + 1..close].trim();
                            validate_token(template, token)?;
                            pattern.push_str(&regex::escape(&literal));
                            literal.clear();
                            pattern.push_str(r"([\w\-]+)");
                            tokens.push(token.to_string());
                            // skip ahead to the closing brace
                            while let Some((i, _)) = chars.next() {
                                if i == close {
                                    break;
                                }
                            }
                        }
                        _ => {
                            return Err(malformed(template, "unmatched `{`"));
                        }
                    }
                }
                '}' => {
                    return Err(malformed(template, "unmatched `}`"));
                }
                other => literal.push(other),
            }
        }

        pattern.push_str(&regex::escape(literal.trim_end_matches('/')));
        pattern.push_str("/?$");

        let regex = Regex::new(&pattern)
            .map_err(|err| malformed(template, &format!("invalid pattern: {}", err)))?;

        Ok(Self { regex, tokens })
    }

    /// Test `path` against this template, returning the captures on success.
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let segments: Vec<String> = (1..caps.len())
            .filter_map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();

        let mut named = HashMap::new();
        for (token, segment) in self.tokens.iter().zip(&segments) {
            if !token.chars().all(|c| c.is_ascii_digit()) {
                named.insert(token.clone(), segment.clone());
            }
        }

        Some(PathMatch { segments, named })
    }
}

fn validate_token(template: &str, token: &str) -> SeoResult<()> {
    if token.is_empty() {
        return Err(malformed(template, "empty placeholder"));
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(malformed(
            template,
            &format!("placeholder `{{{}}}` is neither an index nor an identifier", token),
        ));
    }
    Ok(())
}

fn malformed(template: &str, reason: &str) -> SeoError {
    SeoError::MalformedTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_have_no_parameters() {
        assert!(!has_parameters("/pages/5/"));
        assert!(has_parameters("/items/{0}/detail"));
        assert!(has_parameters("/broken/{oops"));
    }

    #[test]
    fn positional_template_captures_segments() {
        let tpl = PathTemplate::compile("/items/{0}/detail").unwrap();
        let m = tpl.matches("/items/red-shoes/detail").unwrap();
        assert_eq!(m.segments, vec!["red-shoes"]);
        assert!(m.named.is_empty());
    }

    #[test]
    fn trailing_slash_is_optional() {
        let tpl = PathTemplate::compile("/items/{0}/").unwrap();
        assert!(tpl.matches("/items/red-shoes").is_some());
        assert!(tpl.matches("/items/red-shoes/").is_some());
        assert!(tpl.matches("/items/red-shoes/extra").is_none());
    }

    #[test]
    fn named_template_produces_named_captures() {
        let tpl = PathTemplate::compile("/shop/{category}/{0}").unwrap();
        let m = tpl.matches("/shop/boots/item-1").unwrap();
        assert_eq!(m.segments, vec!["boots", "item-1"]);
        assert_eq!(m.named.get("category").map(String::as_str), Some("boots"));
        assert!(!m.named.contains_key("0"));
    }

    #[test]
    fn segments_do_not_span_slashes() {
        let tpl = PathTemplate::compile("/items/{0}/detail").unwrap();
        assert!(tpl.matches("/items/a/b/detail").is_none());
    }

    #[test]
    fn malformed_templates_fail_compilation() {
        for bad in ["/items/{0", "/items/0}", "/items/{}", "/items/{a b}", "/items/{a{b}}"] {
            let err = PathTemplate::compile(bad).unwrap_err();
            assert!(matches!(err, SeoError::MalformedTemplate { .. }), "{}", bad);
        }
    }

    #[test]
    fn template_without_placeholders_matches_itself() {
        let tpl = PathTemplate::compile("/about/").unwrap();
        let m = tpl.matches("/about").unwrap();
        assert!(m.segments.is_empty());
    }
}
