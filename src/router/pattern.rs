//! Route pattern validation and segment parsing.
//!
//! Patterns are absolute, `/`-separated and case-sensitive. Each segment is one of:
//!
//! | Form          | Kind                                            |
//! |---------------|-------------------------------------------------|
//! | `literal`     | static, matched exactly                         |
//! | `:name`       | parameter, captures one segment                 |
//! | `{name}`      | parameter (brace spelling)                      |
//! | `:name(expr)` | parameter constrained by a regular expression   |
//! | `{name:expr}` | same as above, brace spelling                   |
//! | `*name`       | trailing wildcard, captures the rest of the path|

use regex::Regex;

use super::error::RouteError;

/// One parsed pattern segment, ready to be inserted into the tree
#[derive(Debug, Clone)]
pub(crate) enum Segment {
    Static(String),
    Param {
        name: String,
    },
    Regex {
        name: String,
        expr: String,
        regex: Regex,
    },
    Wildcard {
        name: String,
    },
}

/// A validated route pattern split into parsed segments
#[derive(Debug, Clone)]
pub(crate) struct ParsedPattern {
    /// Normalized pattern (trailing `/` removed)
    pub normalized: String,
    /// Parsed segments paired with their literal spelling; empty for `/`
    pub segments: Vec<(String, Segment)>,
}

/// Validate a route pattern and strip its trailing slash.
///
/// `/` is returned unchanged; every other pattern loses one trailing `/`.
pub(crate) fn normalize(pattern: &str) -> Result<&str, RouteError> {
    if pattern.is_empty() {
        return Err(RouteError::invalid(pattern, "pattern is empty"));
    }
    if !pattern.starts_with('/') {
        return Err(RouteError::invalid(pattern, "pattern must start with '/'"));
    }
    if pattern.contains("//") {
        return Err(RouteError::invalid(
            pattern,
            "pattern contains an empty segment ('//')",
        ));
    }
    if pattern == "/" {
        return Ok(pattern);
    }
    Ok(pattern.strip_suffix('/').unwrap_or(pattern))
}

/// Join a group prefix and a route pattern into one pattern.
///
/// An empty prefix or `/` leaves the pattern as is.
pub(crate) fn join(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return pattern.to_string();
    }
    if pattern == "/" || pattern.is_empty() {
        return prefix.to_string();
    }
    let mut joined = String::with_capacity(prefix.len() + pattern.len() + 1);
    joined.push_str(prefix);
    if !pattern.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(pattern);
    joined
}

/// Parse and validate a full pattern.
///
/// All segments are parsed (and regexes compiled) before anything touches the
/// tree, so a malformed pattern never leaves partial state behind.
pub(crate) fn parse(pattern: &str) -> Result<ParsedPattern, RouteError> {
    let normalized = normalize(pattern)?;
    if normalized == "/" {
        return Ok(ParsedPattern {
            normalized: normalized.to_string(),
            segments: Vec::new(),
        });
    }

    let raw_segments: Vec<&str> = normalized[1..].split('/').collect();
    let last = raw_segments.len() - 1;
    let mut segments = Vec::with_capacity(raw_segments.len());
    for (i, raw) in raw_segments.iter().enumerate() {
        let segment = parse_segment(normalized, raw)?;
        if matches!(segment, Segment::Wildcard { .. }) && i != last {
            return Err(RouteError::malformed(
                normalized,
                raw,
                "wildcard must be the last segment",
            ));
        }
        segments.push(((*raw).to_string(), segment));
    }

    Ok(ParsedPattern {
        normalized: normalized.to_string(),
        segments,
    })
}

fn parse_segment(pattern: &str, raw: &str) -> Result<Segment, RouteError> {
    if let Some(name) = raw.strip_prefix('*') {
        check_name(pattern, raw, name)?;
        return Ok(Segment::Wildcard {
            name: name.to_string(),
        });
    }

    if let Some(spec) = raw.strip_prefix(':') {
        return match spec.split_once('(') {
            Some((name, rest)) => {
                let expr = rest.strip_suffix(')').ok_or_else(|| {
                    RouteError::malformed(pattern, raw, "missing closing ')' for expression")
                })?;
                regex_segment(pattern, raw, name, expr)
            }
            None => {
                check_name(pattern, raw, spec)?;
                Ok(Segment::Param {
                    name: spec.to_string(),
                })
            }
        };
    }

    if let Some(inner) = raw.strip_prefix('{') {
        let inner = inner
            .strip_suffix('}')
            .ok_or_else(|| RouteError::malformed(pattern, raw, "missing closing '}'"))?;
        return match inner.split_once(':') {
            Some((name, expr)) => regex_segment(pattern, raw, name, expr),
            None => {
                check_name(pattern, raw, inner)?;
                Ok(Segment::Param {
                    name: inner.to_string(),
                })
            }
        };
    }

    Ok(Segment::Static(raw.to_string()))
}

fn regex_segment(pattern: &str, raw: &str, name: &str, expr: &str) -> Result<Segment, RouteError> {
    check_name(pattern, raw, name)?;
    if expr.is_empty() {
        return Err(RouteError::malformed(pattern, raw, "expression is empty"));
    }
    // Anchored: the expression has to describe the whole segment.
    let regex = Regex::new(&format!("^(?:{expr})$"))
        .map_err(|e| RouteError::malformed(pattern, raw, e.to_string()))?;
    Ok(Segment::Regex {
        name: name.to_string(),
        expr: expr.to_string(),
        regex,
    })
}

fn check_name(pattern: &str, raw: &str, name: &str) -> Result<(), RouteError> {
    if name.is_empty() {
        return Err(RouteError::malformed(pattern, raw, "parameter name is empty"));
    }
    if name.contains(['(', ')', '{', '}', ':', '*']) {
        return Err(RouteError::malformed(
            pattern,
            raw,
            "parameter name contains a reserved character",
        ));
    }
    Ok(())
}
