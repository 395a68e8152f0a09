//! Route pattern matching.
//!
//! # Responsibilities
//! - Compile route patterns once at startup
//! - Match request paths segment by segment
//!
//! # Design Decisions
//! - Literal segments are case-sensitive
//! - `{name}` matches exactly one non-empty segment
//! - `{*name}` is only allowed last and matches any remainder
//! - A trailing slash is significant ("/blog/" does not match "/blog")
//! - No regex to guarantee O(n) matching

use std::fmt;

/// Error produced when a route pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    #[error("invalid parameter '{0}'")]
    InvalidParam(String),
    #[error("wildcard must be the last segment")]
    WildcardNotLast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Wildcard,
}

/// A compiled path pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern such as `/blog/{slug}/` or `/static/{*path}`.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let rest = source
            .strip_prefix('/')
            .ok_or(PatternError::MissingLeadingSlash)?;

        let raw: Vec<&str> = rest.split('/').collect();
        let last = raw.len() - 1;
        let mut segments = Vec::with_capacity(raw.len());

        for (i, part) in raw.iter().enumerate() {
            let segment = if part.is_empty() {
                // Only "/" itself or a trailing slash may produce an empty segment.
                if i != last {
                    return Err(PatternError::EmptySegment(i));
                }
                Segment::Literal(String::new())
            } else if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                match inner.strip_prefix('*') {
                    Some(name) => {
                        check_param(name, part)?;
                        if i != last {
                            return Err(PatternError::WildcardNotLast);
                        }
                        Segment::Wildcard
                    }
                    None => {
                        check_param(inner, part)?;
                        Segment::Param
                    }
                }
            } else if part.contains(['{', '}']) {
                return Err(PatternError::InvalidParam(part.to_string()));
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Returns true if `path` matches this pattern.
    ///
    /// `path` must already start with '/'.
    pub fn matches(&self, path: &str) -> bool {
        let rest = path.strip_prefix('/').unwrap_or(path);
        let mut parts = rest.split('/');

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return true,
                Segment::Param => match parts.next() {
                    Some(p) if !p.is_empty() => {}
                    _ => return false,
                },
                Segment::Literal(lit) => match parts.next() {
                    Some(p) if p == lit.as_str() => {}
                    _ => return false,
                },
            }
        }

        parts.next().is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

fn check_param(name: &str, part: &str) -> Result<(), PatternError> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PatternError::InvalidParam(part.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_pattern() {
        let p = Pattern::parse("/").unwrap();
        assert!(p.matches("/"));
        assert!(!p.matches("/about/"));
    }

    #[test]
    fn test_param_and_trailing_slash() {
        let p = Pattern::parse("/{slug}/").unwrap();
        assert!(p.matches("/about/"));
        assert!(!p.matches("/about"));
        assert!(!p.matches("//"));
        assert!(!p.matches("/about/team/"));
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let p = Pattern::parse("/blog/{id}").unwrap();
        assert!(p.matches("/blog/42"));
        assert!(!p.matches("/Blog/42"));
    }

    #[test]
    fn test_wildcard() {
        let p = Pattern::parse("/static/{*path}").unwrap();
        assert!(p.matches("/static/"));
        assert!(p.matches("/static/css/site.css"));
        assert!(!p.matches("/statics/a"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Pattern::parse("blog"), Err(PatternError::MissingLeadingSlash));
        assert_eq!(Pattern::parse("/a//b"), Err(PatternError::EmptySegment(1)));
        assert_eq!(Pattern::parse("/{*rest}/x"), Err(PatternError::WildcardNotLast));
        assert!(matches!(Pattern::parse("/{}"), Err(PatternError::InvalidParam(_))));
        assert!(matches!(Pattern::parse("/a{b}"), Err(PatternError::InvalidParam(_))));
    }
}
