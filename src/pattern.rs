//! Path pattern parsing and segment matching
//!
//! A pattern such as `/users/<<id>>/files/*` is split on the configured
//! delimiter into typed [`Segment`]s:
//!
//! - **Literal**: must equal the request piece exactly (`users`)
//! - **Variable**: bounded by the variable markers, binds one non-empty
//!   piece under its name (`<<id>>`)
//! - **Wildcard**: the wildcard token, only legal as the last segment,
//!   captures every remaining piece (`*`)
//!
//! Route nodes keep only their own declared segments. The pattern a request
//! is matched against is the root-first [`PatternChain`] of a node and its
//! ancestors, each link consuming its share of the split path and handing the
//! offset to the next one.

use crate::config::MuxConfig;
use crate::error::{PatternError, ReverseError};
use crate::handler::{Handler, Resolver};
use crate::params::Variables;
use std::fmt;
use std::sync::Arc;

/// Split a path into pieces after trimming leading and trailing delimiters.
///
/// An empty or delimiter-only path yields no pieces at all.
///
/// # Example
///
/// ```
/// use route_mux::split_path;
///
/// assert_eq!(split_path("/hello/world/", "/"), ["hello", "world"]);
/// assert!(split_path("/", "/").is_empty());
/// assert_eq!(split_path("/a//b", "/"), ["a", "", "b"]);
/// ```
pub fn split_path<'a>(path: &'a str, delimiter: &str) -> Vec<&'a str> {
    let trimmed = trim_delimiter(path, delimiter);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split(delimiter).collect()
}

pub(crate) fn trim_delimiter<'a>(mut path: &'a str, delimiter: &str) -> &'a str {
    if delimiter.is_empty() {
        return path;
    }
    while let Some(rest) = path.strip_prefix(delimiter) {
        path = rest;
    }
    while let Some(rest) = path.strip_suffix(delimiter) {
        path = rest;
    }
    path
}

// ============================================================================
// Segment
// ============================================================================

/// Semantic type of a pattern segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Literal,
    Variable,
    Wildcard,
}

/// One delimiter-separated unit of a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    kind: SegmentKind,
    text: String,
}

impl Segment {
    /// Literal segment matching `text` exactly
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Literal,
            text: text.into(),
        }
    }

    /// Variable segment binding one piece under `name`
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Variable,
            text: name.into(),
        }
    }

    /// Wildcard segment; `token` is also the key captures are stored under
    pub fn wildcard(token: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Wildcard,
            text: token.into(),
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Literal text, variable name, or wildcard token
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_variable(&self) -> bool {
        self.kind == SegmentKind::Variable
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == SegmentKind::Wildcard
    }

    /// Render the segment back into pattern syntax
    pub fn render(&self, config: &MuxConfig) -> String {
        match self.kind {
            SegmentKind::Variable => {
                format!("{}{}{}", config.variable_open, self.text, config.variable_close)
            }
            SegmentKind::Literal | SegmentKind::Wildcard => self.text.clone(),
        }
    }

    fn parse(piece: &str, config: &MuxConfig) -> Result<Self, EmptyName> {
        if piece == config.wildcard {
            return Ok(Self::wildcard(piece));
        }

        let marker_len = config.variable_open.len() + config.variable_close.len();
        if piece.len() >= marker_len
            && piece.starts_with(config.variable_open.as_str())
            && piece.ends_with(config.variable_close.as_str())
        {
            let name = &piece[config.variable_open.len()..piece.len() - config.variable_close.len()];
            if name.is_empty() {
                return Err(EmptyName);
            }
            return Ok(Self::variable(name));
        }

        Ok(Self::literal(piece))
    }
}

struct EmptyName;

// ============================================================================
// Pattern
// ============================================================================

/// Outcome of one pattern consuming its segments of a split path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStep {
    /// The pattern consumed the rest of the path (or delegated it to a resolver)
    Full,
    /// The pattern matched but pieces remain, starting at this offset
    Partial(usize),
    /// No match along this branch
    Fail,
}

/// A parsed path pattern
///
/// # Example
///
/// ```
/// use route_mux::{split_path, MuxConfig, Pattern};
///
/// let config = MuxConfig::default();
/// let pattern = Pattern::parse("/hello/world/<<name>>", &config).unwrap();
///
/// let vars = pattern.matches(&split_path("/hello/world/john", "/")).unwrap();
/// assert_eq!(vars.get("name"), "john");
/// assert!(pattern.matches(&split_path("/hello/world", "/")).is_none());
/// ```
#[derive(Clone, Default)]
pub struct Pattern {
    segments: Vec<Segment>,
    wildcard: bool,
    resolver: Option<Arc<dyn Resolver>>,
}

impl Pattern {
    /// Parse a pattern string
    pub fn parse(pattern: &str, config: &MuxConfig) -> Result<Self, PatternError> {
        Self::parse_for(pattern, config, None)
    }

    /// Parse a pattern string on behalf of the handler that will own it.
    ///
    /// If the pattern ends in a wildcard and the owner exposes a resolver,
    /// that resolver takes over everything past the wildcard.
    pub fn parse_for(
        pattern: &str,
        config: &MuxConfig,
        owner: Option<&dyn Handler>,
    ) -> Result<Self, PatternError> {
        let pieces = split_path(pattern, &config.delimiter);
        let mut segments = Vec::with_capacity(pieces.len());

        for (index, piece) in pieces.iter().enumerate() {
            let segment = Segment::parse(piece, config).map_err(|EmptyName| {
                PatternError::EmptyVariableName {
                    pattern: pattern.to_string(),
                }
            })?;
            if segment.is_wildcard() && index + 1 != pieces.len() {
                return Err(PatternError::WildcardNotLast {
                    pattern: pattern.to_string(),
                });
            }
            segments.push(segment);
        }

        let wildcard = segments.last().is_some_and(Segment::is_wildcard);
        let resolver = if wildcard {
            owner.and_then(|handler| handler.resolver())
        } else {
            None
        };

        Ok(Self {
            segments,
            wildcard,
            resolver,
        })
    }

    /// Pattern with no segments; matches only the empty path
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check if the pattern ends in a wildcard
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolver attached to the wildcard, if any
    pub fn resolver(&self) -> Option<&Arc<dyn Resolver>> {
        self.resolver.as_ref()
    }

    /// Number of variable segments
    pub fn variable_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_variable()).count()
    }

    /// Render this pattern's own segments, starting with the delimiter
    pub fn render(&self, config: &MuxConfig) -> String {
        render_segments(self.segments.iter(), config)
    }

    /// Consume this pattern's segments from `path[from..]`.
    ///
    /// Captured values are appended to `vars`. On [`MatchStep::Fail`] the
    /// contents of `vars` are unspecified and should be discarded.
    pub fn match_at(&self, path: &[&str], from: usize, vars: &mut Variables) -> MatchStep {
        let last = self.segments.len().saturating_sub(1);
        let mut i = from;

        for (index, segment) in self.segments.iter().enumerate() {
            if segment.is_wildcard() {
                if index != last {
                    return MatchStep::Fail;
                }
                let rest = path.get(i..).unwrap_or_default();
                if let Some(resolver) = &self.resolver {
                    return match resolver.resolve(vars, rest) {
                        Some(resolved) => {
                            vars.merge(resolved);
                            MatchStep::Full
                        }
                        None => MatchStep::Fail,
                    };
                }
                vars.extend(segment.text(), rest.iter().copied());
                return MatchStep::Full;
            }

            let Some(piece) = path.get(i) else {
                return MatchStep::Fail;
            };
            match segment.kind() {
                SegmentKind::Variable => {
                    if piece.is_empty() {
                        return MatchStep::Fail;
                    }
                    vars.push(segment.text(), *piece);
                }
                _ => {
                    if *piece != segment.text() {
                        return MatchStep::Fail;
                    }
                }
            }
            i += 1;
        }

        if i >= path.len() {
            MatchStep::Full
        } else {
            MatchStep::Partial(i)
        }
    }

    /// Match the whole split path against this pattern alone
    pub fn matches(&self, path: &[&str]) -> Option<Variables> {
        PatternChain::single(self).matches(path)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("segments", &self.segments)
            .field("wildcard", &self.wildcard)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

fn render_segments<'a, I>(segments: I, config: &MuxConfig) -> String
where
    I: IntoIterator<Item = &'a Segment>,
{
    let rendered: Vec<String> = segments
        .into_iter()
        .map(|segment| segment.render(config))
        .collect();
    format!("{}{}", config.delimiter, rendered.join(config.delimiter.as_str()))
}

// ============================================================================
// PatternChain
// ============================================================================

/// Root-first sequence of patterns forming a node's effective pattern
#[derive(Debug, Clone, Default)]
pub struct PatternChain<'a> {
    links: Vec<&'a Pattern>,
}

impl<'a> PatternChain<'a> {
    pub fn new(links: Vec<&'a Pattern>) -> Self {
        Self { links }
    }

    /// Chain made of a single pattern
    pub fn single(pattern: &'a Pattern) -> Self {
        Self {
            links: vec![pattern],
        }
    }

    pub fn links(&self) -> &[&'a Pattern] {
        &self.links
    }

    /// Last pattern of the chain
    pub fn terminal(&self) -> Option<&'a Pattern> {
        self.links.last().copied()
    }

    /// Check if the chain ends in a wildcard
    pub fn is_wildcard(&self) -> bool {
        self.terminal().is_some_and(Pattern::is_wildcard)
    }

    /// Every segment of the chain, root first
    pub fn segments(&self) -> impl Iterator<Item = &'a Segment> + '_ {
        self.links.iter().copied().flat_map(Pattern::segments)
    }

    /// Render the full pattern, e.g. `/hello/<<name>>/*`
    pub fn render(&self, config: &MuxConfig) -> String {
        render_segments(self.segments(), config)
    }

    /// Match the whole split path against the chain.
    ///
    /// Each link starts where the previous one stopped; once the path is
    /// exhausted the remaining links must match at its end.
    pub fn matches(&self, path: &[&str]) -> Option<Variables> {
        let mut vars = Variables::new();
        let mut step = if path.is_empty() {
            MatchStep::Full
        } else {
            MatchStep::Partial(0)
        };

        for pattern in &self.links {
            let from = match step {
                MatchStep::Partial(offset) => offset,
                _ => path.len(),
            };
            step = pattern.match_at(path, from, &mut vars);
            if step == MatchStep::Fail {
                return None;
            }
        }

        (step == MatchStep::Full).then_some(vars)
    }

    /// Build a concrete path from positional values
    pub fn reverse(&self, values: &[String], config: &MuxConfig) -> Result<String, ReverseError> {
        crate::reverse::reverse_chain(self, values, config)
    }
}

// ============================================================================
// Tests
// ============================================================================
