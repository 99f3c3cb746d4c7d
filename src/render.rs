//! Render - What a clamped element actually shows.
//!
//! The manual path rewrites an element's text, so any renderer that wraps
//! it sees the truncation for free. The native path leaves the full text
//! in place and expects the renderer to honor `line-clamp`; this module
//! is that honoring, shared by the demo and the tests.

use unicode_segmentation::UnicodeSegmentation;

use crate::clamp::ELLIPSIS;
use crate::dom::{self, NodeId};
use crate::layout::{content_width, grapheme_width, wrap_word};

/// The lines an element presents after clamping, wrapped to its content
/// width.
///
/// When the element carries `display: block-clamp` and a `line-clamp`
/// count, output is cut to that many lines with an ellipsis worked into
/// the last one. Otherwise the wrapped text comes back as-is.
pub fn visible_lines(node: NodeId) -> Vec<String> {
    let width = content_width(node);
    let mut lines = wrap_word(&dom::text(node), width);

    let native_clamped = dom::style(node, "display").as_deref() == Some("block-clamp");
    let limit = dom::style(node, "line-clamp").and_then(|v| v.trim().parse::<usize>().ok());

    if native_clamped {
        if let Some(limit) = limit {
            if limit > 0 && lines.len() > limit {
                lines.truncate(limit);
                if let Some(last) = lines.last_mut() {
                    *last = fit_with_ellipsis(last, width);
                }
            }
        }
    }

    lines
}

/// Work an ellipsis into `line`, dropping trailing graphemes until the
/// result fits in `width` cells.
fn fit_with_ellipsis(line: &str, width: u16) -> String {
    let width = width as usize;
    if width == 0 {
        return ELLIPSIS.to_string();
    }

    let mut graphemes: Vec<&str> = line.graphemes(true).collect();
    let mut used: usize = graphemes.iter().copied().map(grapheme_width).sum();
    let room = width.saturating_sub(grapheme_width(ELLIPSIS));

    while used > room {
        match graphemes.pop() {
            Some(g) => used -= grapheme_width(g),
            None => break,
        }
    }

    let kept = graphemes.concat();
    format!("{}{ELLIPSIS}", kept.trim_end())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{append_child, create_element, reset_document, root, set_style, set_text};
    use crate::layout::string_width;
    use crate::viewport::{reset_viewport, set_size};

    fn setup() {
        reset_document();
        reset_viewport();
    }

    fn block(text: &str) -> crate::dom::NodeId {
        let p = create_element("p");
        append_child(root(), p);
        set_text(p, text);
        p
    }

    #[test]
    fn test_plain_text_wraps_unclamped() {
        setup();
        set_size(10, 24);
        let p = block("aaaa bbbb cccc");
        assert_eq!(visible_lines(p), vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_native_clamp_cuts_and_ellipsizes() {
        setup();
        set_size(10, 24);
        let p = block("aaaa bbbb cccc dddd eeee");
        set_style(p, "display", "block-clamp");
        set_style(p, "line-clamp", "2");

        let lines = visible_lines(p);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "aaaa bbbb");
        assert!(lines[1].ends_with(ELLIPSIS));
        assert!(string_width(&lines[1]) <= 10);
    }

    #[test]
    fn test_native_clamp_leaves_fitting_text() {
        setup();
        set_size(10, 24);
        let p = block("aaaa bbbb");
        set_style(p, "display", "block-clamp");
        set_style(p, "line-clamp", "3");

        assert_eq!(visible_lines(p), vec!["aaaa bbbb"]);
    }

    #[test]
    fn test_line_clamp_without_native_display_ignored() {
        setup();
        set_size(10, 24);
        let p = block("aaaa bbbb cccc");
        set_style(p, "line-clamp", "1");

        assert_eq!(visible_lines(p).len(), 2);
    }

    #[test]
    fn test_full_last_line_gives_up_cells_for_ellipsis() {
        setup();
        set_size(9, 24);
        let p = block("aaaa bbbb cccc dddd");
        set_style(p, "display", "block-clamp");
        set_style(p, "line-clamp", "1");

        let lines = visible_lines(p);
        assert_eq!(lines, vec!["aaaa bbb…"]);
        assert_eq!(string_width(&lines[0]), 9);
    }

    #[test]
    fn test_wide_graphemes_respected_by_ellipsis() {
        setup();
        set_size(4, 24);
        let p = block("你好世界你好");
        set_style(p, "display", "block-clamp");
        set_style(p, "line-clamp", "1");

        let lines = visible_lines(p);
        assert_eq!(lines.len(), 1);
        assert!(string_width(&lines[0]) <= 4);
        assert!(lines[0].ends_with(ELLIPSIS));
    }
}
