//! Reverse routing: building a concrete path from a route and values
//!
//! Values are consumed positionally while walking the chain root first.
//! The output always starts with the delimiter and never ends with one:
//!
//! | pattern          | values          | output        |
//! |------------------|-----------------|---------------|
//! | `/a/<<b>>`       | `["x"]`         | `/a/x`        |
//! | `/files/*`       | `["css", "x"]`  | `/files/css/x`|
//! | `/files/*`       | `[]`            | `/files`      |
//! | `/*`             | `[]`            | `/`           |
//!
//! A resolver attached to the terminal wildcard receives the prefix rendered
//! so far in that same form, together with every unconsumed value, and
//! returns the complete path.
//!
//! Values are inserted verbatim unless `percent_decode` is enabled, in which
//! case each one is percent-encoded so the dispatcher decodes it back into a
//! single piece. Without it, a value containing the delimiter spreads over
//! several pieces and an empty value leaves an empty piece, so such paths do
//! not match the route they were built from.

use crate::config::MuxConfig;
use crate::error::ReverseError;
use crate::pattern::{PatternChain, SegmentKind};
use std::borrow::Cow;

/// Render `chain` with `values` substituted for its variables and wildcard
pub fn reverse_chain(
    chain: &PatternChain<'_>,
    values: &[String],
    config: &MuxConfig,
) -> Result<String, ReverseError> {
    let mut rendered: Vec<Cow<'_, str>> = Vec::new();
    let mut next = 0;

    for pattern in chain.links() {
        for segment in pattern.segments() {
            match segment.kind() {
                SegmentKind::Literal => rendered.push(Cow::Borrowed(segment.text())),
                SegmentKind::Variable => {
                    let value = values.get(next).ok_or(ReverseError::NotEnoughVariables)?;
                    rendered.push(encode(value, config));
                    next += 1;
                }
                SegmentKind::Wildcard => {
                    let rest = values.get(next..).unwrap_or_default();
                    if let Some(resolver) = pattern.resolver() {
                        return resolver.reverse(&join(&rendered, config), rest);
                    }
                    rendered.extend(rest.iter().map(|value| encode(value, config)));
                    next = values.len();
                }
            }
        }
    }

    if next < values.len() && !chain.is_wildcard() {
        return Err(ReverseError::TooManyVariables);
    }

    Ok(join(&rendered, config))
}

fn encode<'v>(value: &'v str, config: &MuxConfig) -> Cow<'v, str> {
    if config.percent_decode {
        urlencoding::encode(value)
    } else {
        Cow::Borrowed(value)
    }
}

fn join(rendered: &[Cow<'_, str>], config: &MuxConfig) -> String {
    format!("{}{}", config.delimiter, rendered.join(config.delimiter.as_str()))
}
