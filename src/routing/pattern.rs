//! Path pattern compilation.
//!
//! # Pattern Syntax
//! - Literal text is matched exactly (case-sensitive)
//! - `{name}` captures one non-empty path segment (excludes `/`)
//! - `{name:*}` captures the non-empty rest of the path (includes `/`)
//! - `{name:REGEX}` captures text matching `REGEX`
//!
//! # Design Decisions
//! - Patterns compile to one anchored regex; parameter-free patterns skip
//!   the regex entirely and compare strings
//! - Compiled regex size is capped to keep hostile route tables bounded

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::error::RoutingError;

/// Path parameters captured by a match.
pub type PathParams = BTreeMap<String, String>;

const MAX_REGEX_SIZE: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    shape: String,
    regex: Option<Regex>,
    param_names: Vec<String>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: String| RoutingError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut regex_src = String::from("^");
        let mut shape = String::from("^");
        let mut param_names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    regex_src.push_str(&regex::escape(&literal));
                    shape.push_str(&regex::escape(&literal));
                    literal.clear();

                    let mut depth = 1;
                    let mut body = String::new();
                    for c in chars.by_ref() {
                        match c {
                            '{' => depth += 1,
                            '}' => depth -= 1,
                            _ => {}
                        }
                        if depth == 0 {
                            break;
                        }
                        body.push(c);
                    }
                    if depth != 0 {
                        return Err(invalid("unclosed `{`".into()));
                    }

                    let (name, constraint) = match body.split_once(':') {
                        Some((name, constraint)) => (name.trim(), Some(constraint.trim())),
                        None => (body.trim(), None),
                    };
                    if !is_identifier(name) {
                        return Err(invalid(format!("`{}` is not a valid parameter name", name)));
                    }
                    if param_names.iter().any(|n| n == name) {
                        return Err(invalid(format!("parameter `{}` appears twice", name)));
                    }

                    let capture = match constraint {
                        None => "[^/]+",
                        Some("*") => ".+",
                        Some("") => return Err(invalid(format!("empty constraint for `{}`", name))),
                        Some(regex) => regex,
                    };
                    regex_src.push_str(&format!("(?P<{}>{})", name, capture));
                    shape.push_str(&format!("(?:{})", capture));
                    param_names.push(name.to_string());
                }
                '}' => return Err(invalid("unmatched `}`".into())),
                c => literal.push(c),
            }
        }
        regex_src.push_str(&regex::escape(&literal));
        regex_src.push('$');
        shape.push_str(&regex::escape(&literal));
        shape.push('$');

        let regex = if param_names.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&regex_src)
                    .size_limit(MAX_REGEX_SIZE)
                    .build()
                    .map_err(|e| invalid(e.to_string()))?,
            )
        };

        Ok(Self {
            source: pattern.to_string(),
            shape,
            regex,
            param_names,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The pattern with parameter names erased.
    ///
    /// Two patterns with the same shape match exactly the same paths.
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn is_static(&self) -> bool {
        self.regex.is_none()
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Match `path`, returning the captured parameters.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let Some(regex) = &self.regex else {
            return (self.source == path).then(PathParams::new);
        };
        let caps = regex.captures(path)?;
        let params = self
            .param_names
            .iter()
            .filter_map(|name| caps.name(name).map(|m| (name.clone(), m.as_str().to_string())))
            .collect();
        Some(params)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_pattern() {
        let pattern = PathPattern::parse("/about.html").unwrap();
        assert!(pattern.is_static());
        assert_eq!(pattern.captures("/about.html"), Some(PathParams::new()));
        assert_eq!(pattern.captures("/aboutxhtml"), None);
        assert_eq!(pattern.captures("/about.html/"), None);
    }

    #[test]
    fn test_segment_parameter() {
        let pattern = PathPattern::parse("/users/{id}").unwrap();
        let params = pattern.captures("/users/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert!(pattern.captures("/users/42/posts").is_none());
        assert!(pattern.captures("/users/").is_none());
    }

    #[test]
    fn test_wildcard_parameter() {
        let pattern = PathPattern::parse("/static/{path:*}").unwrap();
        let params = pattern.captures("/static/css/site.css").unwrap();
        assert_eq!(params["path"], "css/site.css");
    }

    #[test]
    fn test_regex_constraint() {
        let pattern = PathPattern::parse("/posts/{year:\\d{4}}/{slug}").unwrap();
        let params = pattern.captures("/posts/2024/hello-world").unwrap();
        assert_eq!(params["year"], "2024");
        assert_eq!(params["slug"], "hello-world");
        assert!(pattern.captures("/posts/24/hello").is_none());
    }

    #[test]
    fn test_shape_ignores_parameter_names() {
        let shape = |p: &str| PathPattern::parse(p).unwrap().shape().to_string();
        assert_eq!(shape("/users/{id}"), shape("/users/{uid}"));
        assert_eq!(shape("/files/{path:*}"), shape("/files/{rest:*}"));
        assert_eq!(shape("/y/{year:\\d{4}}"), shape("/y/{n:\\d{4}}"));
        assert_ne!(shape("/users/{id}"), shape("/users/{id:[0-9]+}"));
        assert_ne!(shape("/users/{id}"), shape("/users/{id}/posts"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(PathPattern::parse("/users/{id").is_err());
        assert!(PathPattern::parse("/users/id}").is_err());
        assert!(PathPattern::parse("/users/{1id}").is_err());
        assert!(PathPattern::parse("/a/{id}/b/{id}").is_err());
        assert!(PathPattern::parse("/a/{id:(}").is_err());
    }
}
