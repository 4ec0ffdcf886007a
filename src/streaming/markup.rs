//! Markup embedded in the narration stream.
//!
//! Two constructs are recognised:
//! - `<anything>`: image trigger, matched non-greedily up to the nearest `>` on the same line
//! - `[break]`: page boundary, case-insensitive

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

// Both patterns are literals checked by the tests below.
#[allow(clippy::unwrap_used)]
static IMAGE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(.*?)>").unwrap());

#[allow(clippy::unwrap_used)]
static BREAK_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[break\]").unwrap());

/// The earliest complete markup construct in a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// Image tag covering `span`, with the text between the delimiters.
    Image { span: Range<usize>, prompt: String },
    /// Break marker covering `span`.
    Break { span: Range<usize> },
}

impl Markup {
    /// Finds the construct that starts first in `text`.
    ///
    /// When both start at the same offset the break marker wins.
    pub fn earliest(text: &str) -> Option<Self> {
        let image = IMAGE_TAG.captures(text).and_then(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some(Markup::Image {
                span: whole.range(),
                prompt: inner.as_str().to_string(),
            })
        });
        let brk = BREAK_MARKER
            .find(text)
            .map(|m| Markup::Break { span: m.range() });

        choose(image, brk)
    }

    /// Byte offset where the construct begins.
    pub fn start(&self) -> usize {
        self.span().start
    }

    pub fn span(&self) -> &Range<usize> {
        match self {
            Markup::Image { span, .. } | Markup::Break { span } => span,
        }
    }
}

/// Picks the earlier of an image match and a break match, break first on ties.
fn choose(image: Option<Markup>, brk: Option<Markup>) -> Option<Markup> {
    match (image, brk) {
        (None, None) => None,
        (Some(image), None) => Some(image),
        (None, Some(brk)) => Some(brk),
        (Some(image), Some(brk)) => {
            if brk.start() <= image.start() {
                Some(brk)
            } else {
                Some(image)
            }
        }
    }
}

/// Byte offset of an image tag opening that has no closing `>` yet.
///
/// Only looks after the last complete tag, so closed tags are never reported.
pub fn unterminated_tag_start(text: &str) -> Option<usize> {
    let open = text.rfind('<')?;
    if text[open..].contains('>') {
        None
    } else {
        Some(open)
    }
}

/// Collapses newlines to spaces and trims surrounding whitespace.
pub fn normalize_page(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markup() {
        assert_eq!(Markup::earliest("Once upon a time"), None);
        assert_eq!(Markup::earliest(""), None);
    }

    #[test]
    fn test_image_tag_is_non_greedy() {
        let found = Markup::earliest("a <fox> and <owl>").unwrap();
        assert_eq!(
            found,
            Markup::Image {
                span: 2..7,
                prompt: "fox".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_image_tag() {
        let found = Markup::earliest("<>").unwrap();
        assert_eq!(
            found,
            Markup::Image {
                span: 0..2,
                prompt: String::new(),
            }
        );
    }

    #[test]
    fn test_image_tag_does_not_span_lines() {
        assert_eq!(Markup::earliest("a <fox\nin snow> b"), None);
    }

    #[test]
    fn test_break_marker_case_insensitive() {
        for marker in ["[break]", "[Break]", "[BREAK]", "[bReAk]"] {
            let text = format!("The end.{}", marker);
            assert_eq!(
                Markup::earliest(&text),
                Some(Markup::Break { span: 8..15 }),
                "marker {} not recognised",
                marker
            );
        }
    }

    #[test]
    fn test_earliest_construct_wins() {
        let image_first = Markup::earliest("<fox> story [break]").unwrap();
        assert!(matches!(image_first, Markup::Image { .. }));

        let break_first = Markup::earliest("story [break] <fox>").unwrap();
        assert!(matches!(break_first, Markup::Break { .. }));
    }

    #[test]
    fn test_tie_prefers_break() {
        let image = Markup::Image {
            span: 4..9,
            prompt: "fox".to_string(),
        };
        let brk = Markup::Break { span: 4..11 };

        assert_eq!(choose(Some(image), Some(brk.clone())), Some(brk));
    }

    #[test]
    fn test_tag_wrapping_break_starts_first() {
        let found = Markup::earliest("<[break]>").unwrap();
        assert!(matches!(found, Markup::Image { .. }));
        assert_eq!(found.start(), 0);
    }

    #[test]
    fn test_partial_break_does_not_match() {
        assert_eq!(Markup::earliest("The end. [brea"), None);
        assert_eq!(Markup::earliest("[ break ]"), None);
    }

    #[test]
    fn test_unterminated_tag_start() {
        assert_eq!(unterminated_tag_start("story <a castle"), Some(6));
        assert_eq!(unterminated_tag_start("story <done> more"), None);
        assert_eq!(unterminated_tag_start("<done> then <open"), Some(12));
        assert_eq!(unterminated_tag_start("no tags"), None);
    }

    #[test]
    fn test_normalize_page() {
        assert_eq!(
            normalize_page("  The fox\nran far.\n\n"),
            "The fox ran far."
        );
        assert_eq!(normalize_page("\n \n"), "");
    }
}
