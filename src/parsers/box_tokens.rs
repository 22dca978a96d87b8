//! Box-token annotation for assistant action text.
//!
//! Grounding models trained on the UI-TARS action format expect coordinate
//! literals in prior assistant turns to be fenced by box tokens:
//!
//! ```text
//! Action: click(start_box='(120,340)')
//! Action: click(start_box='<|box_start|>(120,340)<|box_end|>')
//! ```

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const ACTION_MARKER: &str = "Action: ";
const START_BOX_MARKER: &str = "start_box=";
const SEGMENT_SEPARATOR: &str = "\n\n";

pub const DEFAULT_BOX_START: &str = "<|box_start|>";
pub const DEFAULT_BOX_END: &str = "<|box_end|>";

// Horizontal whitespace only: segments are rejoined with newlines, and a
// literal split across that join must not match on a later pass.
static BOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(start_box|end_box)='(\(\d+,[ \t]*\d+\))'").unwrap());

/// The delimiter pair wrapped around coordinate literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxTokens {
    pub start: String,
    pub end: String,
}

impl Default for BoxTokens {
    fn default() -> Self {
        Self::new(DEFAULT_BOX_START, DEFAULT_BOX_END)
    }
}

impl BoxTokens {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Wrap every bare `start_box='(x,y)'` / `end_box='(x,y)'` literal.
    ///
    /// Only text containing both `"Action: "` and `"start_box="` is touched.
    /// Text after the first marker is split into action segments, each
    /// trimmed and rewritten, then rejoined with a blank line; text before the
    /// first marker is kept verbatim. When no literal needs wrapping the input
    /// is returned as-is, which makes the rewrite idempotent.
    ///
    /// Negative or fractional coordinates do not match and are left alone.
    pub fn annotate<'a>(&self, input: &'a str) -> Cow<'a, str> {
        if !(input.contains(ACTION_MARKER) && input.contains(START_BOX_MARKER)) {
            return Cow::Borrowed(input);
        }

        let mut pieces = input.split(ACTION_MARKER);
        let prefix = pieces.next().unwrap_or_default();

        let mut wrapped_any = false;
        let segments: Vec<Cow<'a, str>> = pieces
            .map(|segment| {
                let rewritten = BOX_RE.replace_all(segment.trim(), |caps: &Captures| {
                    format!("{}='{}{}{}'", &caps[1], self.start, &caps[2], self.end)
                });
                wrapped_any |= matches!(rewritten, Cow::Owned(_));
                rewritten
            })
            .collect();

        if !wrapped_any {
            return Cow::Borrowed(input);
        }

        Cow::Owned(format!(
            "{prefix}{ACTION_MARKER}{}",
            segments.join(SEGMENT_SEPARATOR)
        ))
    }
}

/// [`BoxTokens::annotate`] with the default `<|box_start|>` / `<|box_end|>` pair.
pub fn add_box_tokens(input: &str) -> Cow<'_, str> {
    BoxTokens::default().annotate(input)
}
