//! Segment-based path pattern matching.
//!
//! A pattern is a `/`-delimited sequence of literal segments and `{name}`
//! placeholders. Matching is strict:
//!
//! - the request must have exactly as many segments as the pattern
//! - literal segments compare byte-for-byte (no normalisation, no trailing
//!   slash leniency)
//! - a placeholder matches one non-empty segment and binds the raw,
//!   still percent-encoded text
//!
//! If a placeholder name repeats, the last occurrence wins on lookup.

use crate::error::RouteError;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated path parameter storage.
///
/// Names are `Arc<str>` shared with the compiled pattern, so binding a
/// parameter is an atomic increment plus the value copy.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(Arc<str>),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern such as `/users/{id}/posts/{post_id}`.
    ///
    /// Only whole segments of the form `{name}` are placeholders; `v{n}` is a
    /// literal segment.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::NotAbsolute {
                pattern: pattern.to_string(),
            });
        }

        let mut segments = Vec::with_capacity(pattern.matches('/').count() + 1);
        for segment in pattern.split('/') {
            if segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}') {
                let name = &segment[1..segment.len() - 1];
                if name.is_empty() {
                    return Err(RouteError::EmptyPlaceholder {
                        pattern: pattern.to_string(),
                    });
                }
                segments.push(Segment::Param(Arc::from(name)));
            } else {
                segments.push(Segment::Literal(segment.to_string()));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern text as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains at least one placeholder.
    #[must_use]
    pub fn has_params(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Param(_)))
    }

    /// Names of the placeholders, in pattern order.
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_ref()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Match a request path, returning the bound placeholders.
    ///
    /// Returns `None` when segment counts differ, a literal differs, or a
    /// placeholder would bind an empty segment.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        if path.split('/').count() != self.segments.len() {
            return None;
        }

        let mut params = ParamVec::new();
        for (segment, part) in self.segments.iter().zip(path.split('/')) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push((Arc::clone(name), part.to_string()));
                }
            }
        }
        Some(params)
    }
}

/// Match `path` against an uncompiled `pattern`.
///
/// Convenience over [`PathPattern`]; an invalid pattern never matches.
///
/// ```
/// use laneway::router::matches;
///
/// let params = matches("/a/{x}/{y}", "/a/1/2").unwrap();
/// assert_eq!(params["x"], "1");
/// assert_eq!(params["y"], "2");
/// assert!(matches("/users/{id}", "/users").is_none());
/// ```
#[must_use]
pub fn matches(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let compiled = PathPattern::parse(pattern).ok()?;
    compiled
        .match_path(path)
        .map(|params| params.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}
