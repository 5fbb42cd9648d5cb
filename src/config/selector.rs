//! Scope selector expressions
//!
//! A selector is a list of alternatives separated by `|` or `,`. Each
//! alternative is a whitespace-separated list of scope names, all of which
//! must match; a name prefixed with `-` must not match. Scope names match on
//! whole dot-separated segments, so `text.html` matches `text.html.basic`
//! but not `text.htmlx`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{ConnectorError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Alternative {
    include: Vec<String>,
    exclude: Vec<String>,
}

/// A parsed scope selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Alternative>,
}

impl Selector {
    /// Parse a selector expression
    pub fn parse(expr: &str) -> Result<Self> {
        let mut alternatives = Vec::new();

        for part in expr.split(['|', ',']) {
            let mut include = Vec::new();
            let mut exclude = Vec::new();
            for term in part.split_whitespace() {
                match term.strip_prefix('-') {
                    Some("") => {
                        return Err(ConnectorError::InvalidConfig(format!(
                            "dangling '-' in selector '{}'",
                            expr
                        )));
                    }
                    Some(name) => exclude.push(name.to_string()),
                    None => include.push(term.to_string()),
                }
            }
            if include.is_empty() && exclude.is_empty() {
                continue;
            }
            alternatives.push(Alternative { include, exclude });
        }

        Ok(Self {
            source: expr.trim().to_string(),
            alternatives,
        })
    }

    /// A selector matching any one of `scopes`
    pub fn any_of(scopes: &[&str]) -> Self {
        Self {
            source: scopes.join(" | "),
            alternatives: scopes
                .iter()
                .map(|scope| Alternative {
                    include: vec![scope.to_string()],
                    exclude: Vec::new(),
                })
                .collect(),
        }
    }

    /// The expression this selector was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the selector has no alternatives and so matches nothing
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Check a scope stack (space-separated scope names) against the selector
    pub fn matches(&self, scope: &str) -> bool {
        let stack: Vec<&str> = scope.split_whitespace().collect();
        let hit = |name: &str| stack.iter().any(|s| scope_matches(name, s));

        self.alternatives.iter().any(|alt| {
            alt.include.iter().all(|name| hit(name)) && !alt.exclude.iter().any(|name| hit(name))
        })
    }
}

/// `name` matches `scope` when it equals it or is a prefix ending on a dot boundary
fn scope_matches(name: &str, scope: &str) -> bool {
    match scope.strip_prefix(name) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

impl FromStr for Selector {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let expr = String::deserialize(deserializer)?;
        Selector::parse(&expr).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternatives() {
        let selector = Selector::parse("source.markdown | text.html | source.json").unwrap();
        assert!(selector.matches("source.markdown"));
        assert!(selector.matches("text.html"));
        assert!(selector.matches("source.json"));
        assert!(!selector.matches("source.python"));
    }

    #[test]
    fn test_segment_prefix() {
        let selector = Selector::parse("text.html").unwrap();
        assert!(selector.matches("text.html.basic"));
        assert!(!selector.matches("text.htmlx"));
        assert!(!selector.matches("text"));
    }

    #[test]
    fn test_scope_stack() {
        let selector = Selector::parse("source.markdown").unwrap();
        assert!(selector.matches("text.html.markdown source.markdown"));
    }

    #[test]
    fn test_conjunction_and_exclusion() {
        let selector = Selector::parse("text.html -text.html.markdown").unwrap();
        assert!(selector.matches("text.html.basic"));
        assert!(!selector.matches("text.html.markdown"));

        let both = Selector::parse("text.html source.js").unwrap();
        assert!(both.matches("text.html.basic source.js.embedded"));
        assert!(!both.matches("text.html.basic"));
    }

    #[test]
    fn test_comma_separator_and_empty_parts() {
        let selector = Selector::parse("source.json, ,source.yaml |").unwrap();
        assert!(selector.matches("source.yaml"));
        assert!(selector.matches("source.json"));
    }

    #[test]
    fn test_empty_selector_matches_nothing() {
        let selector = Selector::parse("   ").unwrap();
        assert!(selector.is_empty());
        assert!(!selector.matches("source.markdown"));
    }

    #[test]
    fn test_any_of_equals_parsed() {
        let built = Selector::any_of(&["source.markdown", "text.html"]);
        assert_eq!(built, Selector::parse("source.markdown | text.html").unwrap());
    }

    #[test]
    fn test_dangling_minus_rejected() {
        assert!(Selector::parse("source.json - ").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let selector: Selector = serde_json::from_str(r#""source.json""#).unwrap();
        assert_eq!(selector.as_str(), "source.json");
        assert_eq!(serde_json::to_string(&selector).unwrap(), r#""source.json""#);
    }
}
