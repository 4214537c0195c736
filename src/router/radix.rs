//! Per-method segment trie for route registration and matching
//!
//! Every HTTP method owns one root node. A node represents one path segment and
//! has:
//!
//! - any number of **static** children, keyed by their literal text
//! - at most one **dynamic** child, which is a parameter (`:id`), a
//!   regex-constrained parameter (`:id([0-9]+)` / `{id:[0-9]+}`) or a trailing
//!   wildcard (`*path`)
//!
//! Holding the dynamic child in a single slot makes the "only one of
//! param/regex/wildcard per node" rule structural; registration only has to
//! decide whether a new dynamic segment is the *same* as the one already there.
//!
//! ## Matching
//!
//! Matching walks the path one segment at a time with a fixed precedence and
//! no backtracking:
//!
//! 1. exact static child
//! 2. regex child, if the expression matches the whole segment
//! 3. parameter child (any segment, including an empty one)
//! 4. wildcard child, which consumes the rest of the path and stops the walk
//!
//! Lookup is therefore O(segments) regardless of how many routes overlap.
//! Overlapping patterns that would need backtracking (e.g. `/a/b/c` plus
//! `/a/:x/d` looked up as `/a/b/d`) do not match.
//!
//! Middleware bound to nodes is collected while descending, so the resolved
//! chain is root→leaf without any parent links.

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::{ParamVec, RouteMatch, RouteMeta};
use super::error::RouteError;
use super::pattern::{ParsedPattern, Segment};
use crate::dispatcher::HandlerRef;
use crate::middleware::{extend_unique, MiddlewareVec};

/// Matching variant of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Static,
    Param,
    Regex,
    Wildcard,
}

impl NodeKind {
    fn describe(self) -> &'static str {
        match self {
            NodeKind::Static => "static segment",
            NodeKind::Param => "parameter",
            NodeKind::Regex => "regex parameter",
            NodeKind::Wildcard => "wildcard",
        }
    }
}

/// One path segment in the routing tree
struct Node {
    /// Segment text as written in the pattern
    segment: String,
    kind: NodeKind,
    /// Static children keyed by literal segment text
    children: HashMap<String, Node>,
    /// The single param/regex/wildcard child
    dynamic: Option<Box<Node>>,
    /// Captured variable name (dynamic kinds only)
    param_name: Option<Arc<str>>,
    /// Regex source as written (regex kind only)
    expr: Option<String>,
    /// Compiled, anchored expression (regex kind only)
    regex: Option<regex::Regex>,
    /// Route terminating at this node, set exactly once
    route: Option<Arc<RouteMeta>>,
    /// Middleware bound when the terminating route was registered
    middleware: MiddlewareVec,
}

impl Node {
    fn root() -> Self {
        Self::new(String::new(), NodeKind::Static)
    }

    fn new(segment: String, kind: NodeKind) -> Self {
        Self {
            segment,
            kind,
            children: HashMap::new(),
            dynamic: None,
            param_name: None,
            expr: None,
            regex: None,
            route: None,
            middleware: MiddlewareVec::new(),
        }
    }

    fn from_segment(raw: &str, segment: &Segment) -> Self {
        match segment {
            Segment::Static(text) => Self::new(text.clone(), NodeKind::Static),
            Segment::Param { name } => {
                let mut node = Self::new(raw.to_string(), NodeKind::Param);
                node.param_name = Some(Arc::from(name.as_str()));
                node
            }
            Segment::Regex { name, expr, regex } => {
                let mut node = Self::new(raw.to_string(), NodeKind::Regex);
                node.param_name = Some(Arc::from(name.as_str()));
                node.expr = Some(expr.clone());
                node.regex = Some(regex.clone());
                node
            }
            Segment::Wildcard { name } => {
                let mut node = Self::new(raw.to_string(), NodeKind::Wildcard);
                node.param_name = Some(Arc::from(name.as_str()));
                node
            }
        }
    }

    /// Whether an existing dynamic child can be reused for `segment`.
    ///
    /// `Err` carries a human-readable conflict description.
    fn accepts(&self, raw: &str, segment: &Segment) -> Result<(), String> {
        let name = self.param_name.as_deref().unwrap_or_default();
        let same = match (self.kind, segment) {
            (NodeKind::Param, Segment::Param { .. }) => self.segment == raw,
            (NodeKind::Regex, Segment::Regex { name: n, expr, .. }) => {
                name == n && self.expr.as_deref() == Some(expr.as_str())
            }
            (NodeKind::Wildcard, Segment::Wildcard { name: n }) => name == n,
            _ => false,
        };
        if same {
            return Ok(());
        }
        Err(format!(
            "{} '{}' conflicts with existing {} '{}' at the same position",
            segment_kind(segment).describe(),
            raw,
            self.kind.describe(),
            self.segment
        ))
    }
}

fn segment_kind(segment: &Segment) -> NodeKind {
    match segment {
        Segment::Static(_) => NodeKind::Static,
        Segment::Param { .. } => NodeKind::Param,
        Segment::Regex { .. } => NodeKind::Regex,
        Segment::Wildcard { .. } => NodeKind::Wildcard,
    }
}

/// Routing tree: one root node per HTTP method.
///
/// Built during startup through `&mut self`, then only read. Reads need no
/// synchronization; the type is `Send + Sync` and is shared behind the router.
#[derive(Default)]
pub(crate) struct RouteTree {
    roots: HashMap<Method, Node>,
}

impl RouteTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a route.
    ///
    /// The tree is probed read-only first, so a conflicting registration leaves
    /// no half-built branch behind.
    pub(crate) fn insert(
        &mut self,
        method: Method,
        pattern: &ParsedPattern,
        handler: HandlerRef,
        middleware: MiddlewareVec,
    ) -> Result<Arc<RouteMeta>, RouteError> {
        if let Some(root) = self.roots.get(&method) {
            Self::probe(root, &method, pattern)?;
        }

        let mut node = self.roots.entry(method.clone()).or_insert_with(Node::root);
        for (raw, segment) in &pattern.segments {
            node = match segment {
                Segment::Static(text) => node
                    .children
                    .entry(text.clone())
                    .or_insert_with(|| Node::from_segment(raw, segment)),
                _ => node
                    .dynamic
                    .get_or_insert_with(|| Box::new(Node::from_segment(raw, segment)))
                    .as_mut(),
            };
        }

        let meta = Arc::new(RouteMeta {
            method,
            path_pattern: pattern.normalized.clone(),
            handler_name: handler.name().to_string(),
            handler,
        });
        node.route = Some(Arc::clone(&meta));
        node.middleware = middleware;
        Ok(meta)
    }

    /// Check `pattern` against the existing tree without modifying it
    fn probe(root: &Node, method: &Method, pattern: &ParsedPattern) -> Result<(), RouteError> {
        let mut node = root;
        for (raw, segment) in &pattern.segments {
            let next = match segment {
                Segment::Static(text) => node.children.get(text),
                _ => match node.dynamic.as_deref() {
                    Some(existing) => {
                        existing.accepts(raw, segment).map_err(|reason| {
                            RouteError::conflict(method, &pattern.normalized, reason)
                        })?;
                        Some(existing)
                    }
                    None => None,
                },
            };
            match next {
                Some(n) => node = n,
                // The rest of the branch is new; nothing below can conflict.
                None => return Ok(()),
            }
        }

        if let Some(existing) = &node.route {
            return Err(RouteError::conflict(
                method,
                &pattern.normalized,
                format!(
                    "handler '{}' already registered for '{}'",
                    existing.handler_name, existing.path_pattern
                ),
            ));
        }
        Ok(())
    }

    /// Resolve `path` for `method`.
    ///
    /// `path` is expected to be decoded and free of a query string. A single
    /// trailing `/` is ignored, mirroring registration, except that `//` is the
    /// two empty segments rather than the root.
    pub(crate) fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let root = self.roots.get(method)?;
        let mut chain = MiddlewareVec::new();
        extend_unique(&mut chain, &root.middleware);
        let mut params = ParamVec::new();

        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = match trimmed.strip_suffix('/') {
            Some(rest) if !rest.is_empty() => rest,
            _ => trimmed,
        };

        let mut node = root;
        if !trimmed.is_empty() {
            let mut offset = 0;
            for segment in trimmed.split('/') {
                let remaining = &trimmed[offset..];
                offset += segment.len() + 1;

                if let Some(child) = node.children.get(segment) {
                    node = child;
                    extend_unique(&mut chain, &node.middleware);
                    continue;
                }

                let child = node.dynamic.as_deref()?;
                let name = child.param_name.as_ref()?;
                match child.kind {
                    NodeKind::Regex => {
                        let matched = child.regex.as_ref().is_some_and(|re| re.is_match(segment));
                        if !matched {
                            return None;
                        }
                        params.push((Arc::clone(name), segment.to_string()));
                    }
                    NodeKind::Param => {
                        params.push((Arc::clone(name), segment.to_string()));
                    }
                    NodeKind::Wildcard => {
                        params.push((Arc::clone(name), remaining.to_string()));
                        node = child;
                        extend_unique(&mut chain, &node.middleware);
                        break;
                    }
                    NodeKind::Static => return None,
                }
                node = child;
                extend_unique(&mut chain, &node.middleware);
            }
        }

        let route = node.route.as_ref()?;
        Some(RouteMatch {
            route: Arc::clone(route),
            path_params: params,
            middleware: chain,
        })
    }
}
