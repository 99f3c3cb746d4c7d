//! Node Measurement
//!
//! Taffy-backed height measurement for document nodes.
//!
//! Each call lays out a throwaway three-node flex tree: a column container
//! sized to the node's containing block, a box carrying the node's width
//! and padding, and a text leaf with a measure function. Heights come back
//! in terminal rows, border-box (padding included), which is also what the
//! clamp shrink loop compares against.

use taffy::{
    AvailableSpace, Dimension, FlexDirection, LengthPercentage, Rect, Size, Style, TaffyTree,
};

use crate::dom::{self, NodeId};
use crate::viewport;

use super::text_measure::{string_width, text_height};

// =============================================================================
// STYLE RESOLUTION
// =============================================================================

/// Parse a `width` style value: plain cells ("40"), a percentage ("50%"),
/// or anything else as auto.
fn parse_dimension(value: Option<String>) -> Dimension {
    let Some(value) = value else {
        return Dimension::Auto;
    };
    let value = value.trim();

    if let Some(percent) = value.strip_suffix('%') {
        if let Ok(p) = percent.trim().parse::<f32>() {
            return Dimension::Percent(p / 100.0);
        }
        return Dimension::Auto;
    }
    if let Ok(cells) = value.parse::<f32>() {
        return Dimension::Length(cells);
    }
    Dimension::Auto
}

/// Uniform padding in cells from the `padding` style.
fn padding_cells(node: NodeId) -> u16 {
    dom::style(node, "padding")
        .and_then(|v| v.trim().parse::<u16>().ok())
        .unwrap_or(0)
}

/// `line-height` in rows, inherited through ancestors. Defaults to 1.
fn line_height_of(node: NodeId) -> u16 {
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(value) = dom::style(id, "line-height") {
            if let Ok(lh) = value.trim().parse::<u16>() {
                return lh.max(1);
            }
        }
        current = dom::parent(id);
    }
    1
}

/// Taffy style for the node's box: its width and padding, auto height so
/// the text below drives it.
fn node_style(node: NodeId) -> Style {
    let padding = padding_cells(node) as f32;

    Style {
        flex_direction: FlexDirection::Column,
        size: Size {
            width: parse_dimension(dom::style(node, "width")),
            height: Dimension::Auto,
        },
        padding: Rect {
            top: LengthPercentage::Length(padding),
            right: LengthPercentage::Length(padding),
            bottom: LengthPercentage::Length(padding),
            left: LengthPercentage::Length(padding),
        },
        ..Default::default()
    }
}

// =============================================================================
// CONTAINING BLOCKS
// =============================================================================

/// Width in cells available to children of `node`: its resolved width
/// minus horizontal padding. The root and detached nodes resolve against
/// the viewport.
pub fn content_width(node: NodeId) -> u16 {
    let padding = padding_cells(node);
    resolved_width(node).saturating_sub(padding.saturating_mul(2))
}

fn resolved_width(node: NodeId) -> u16 {
    let Some(parent) = dom::parent(node) else {
        return viewport::width();
    };
    let containing = content_width(parent);

    match parse_dimension(dom::style(node, "width")) {
        Dimension::Length(cells) => cells.round() as u16,
        Dimension::Percent(p) => (containing as f32 * p).round() as u16,
        _ => containing,
    }
}

// =============================================================================
// HEIGHT MEASUREMENT
// =============================================================================

struct TextContext {
    text: String,
    line_height: u16,
}

fn measure_text(
    ctx: &TextContext,
    known_dimensions: Size<Option<f32>>,
    available_space: Size<AvailableSpace>,
) -> Size<f32> {
    if ctx.text.is_empty() {
        return Size::ZERO;
    }

    let wrap_width = match known_dimensions.width {
        Some(w) => w as u16,
        None => match available_space.width {
            AvailableSpace::Definite(w) => w as u16,
            AvailableSpace::MinContent => string_width(&ctx.text),
            AvailableSpace::MaxContent => u16::MAX,
        },
    };

    let rows = text_height(&ctx.text, wrap_width.max(1));
    let height = rows.saturating_mul(ctx.line_height);

    Size {
        width: known_dimensions
            .width
            .unwrap_or_else(|| string_width(&ctx.text) as f32),
        height: known_dimensions.height.unwrap_or(height as f32),
    }
}

/// Measure the rendered height of a node in terminal rows.
///
/// The node's text is wrapped at its resolved content width, each wrapped
/// line occupies its inherited `line-height`, and vertical padding counts
/// toward the total. Returns 0 for dead nodes and empty unpadded nodes.
pub fn measure_height(node: NodeId) -> u16 {
    if !dom::exists(node) {
        return 0;
    }

    let containing = match dom::parent(node) {
        Some(parent) => content_width(parent),
        None => viewport::width(),
    };

    let mut tree: TaffyTree<TextContext> = TaffyTree::new();

    let context = TextContext {
        text: dom::text(node),
        line_height: line_height_of(node),
    };
    let text_leaf = tree
        .new_leaf_with_context(Style::default(), context)
        .unwrap();

    let item = tree.new_leaf(node_style(node)).unwrap();
    tree.add_child(item, text_leaf).unwrap();

    let container = tree
        .new_leaf(Style {
            flex_direction: FlexDirection::Column,
            size: Size {
                width: Dimension::Length(containing as f32),
                height: Dimension::Auto,
            },
            ..Default::default()
        })
        .unwrap();
    tree.add_child(container, item).unwrap();

    let available = Size {
        width: AvailableSpace::Definite(containing as f32),
        height: AvailableSpace::MaxContent,
    };

    let mut measure_fn = |known_dimensions: Size<Option<f32>>,
                          available_space: Size<AvailableSpace>,
                          _node_id: taffy::NodeId,
                          context: Option<&mut TextContext>,
                          _style: &Style| {
        match context {
            Some(ctx) => measure_text(ctx, known_dimensions, available_space),
            None => Size::ZERO,
        }
    };

    let _ = tree.compute_layout_with_measure(container, available, &mut measure_fn);

    tree.layout(item)
        .map(|layout| layout.size.height.round() as u16)
        .unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{
        append_child, create_element, insert_probe, remove_probe, reset_document, root, set_style,
        set_text,
    };
    use crate::viewport::{reset_viewport, set_size};

    fn setup() {
        reset_document();
        reset_viewport();
    }

    #[test]
    fn test_empty_text_measures_zero() {
        setup();
        let p = create_element("p");
        append_child(root(), p);
        assert_eq!(measure_height(p), 0);
    }

    #[test]
    fn test_single_line() {
        setup();
        let p = create_element("p");
        append_child(root(), p);
        set_text(p, "hello");
        assert_eq!(measure_height(p), 1);
    }

    #[test]
    fn test_wraps_at_explicit_width() {
        setup();
        let p = create_element("p");
        append_child(root(), p);
        set_style(p, "width", "10");
        set_text(p, "hello wide world");
        // "hello wide" / "world"
        assert_eq!(measure_height(p), 2);
    }

    #[test]
    fn test_wraps_at_viewport_width() {
        setup();
        set_size(10, 24);
        let p = create_element("p");
        append_child(root(), p);
        set_text(p, "hello wide world");
        assert_eq!(measure_height(p), 2);
    }

    #[test]
    fn test_percent_width_resolves_against_parent() {
        setup();
        let section = create_element("section");
        let p = create_element("p");
        append_child(root(), section);
        append_child(section, p);
        set_style(section, "width", "20");
        set_style(p, "width", "50%");
        set_text(p, "aaaa bbbb cccc");
        // Content width 10: "aaaa bbbb" / "cccc"
        assert_eq!(measure_height(p), 2);
    }

    #[test]
    fn test_line_height_scales_rows() {
        setup();
        let p = create_element("p");
        append_child(root(), p);
        set_style(p, "line-height", "2");
        set_text(p, "hello");
        assert_eq!(measure_height(p), 2);
    }

    #[test]
    fn test_padding_adds_to_height_and_narrows_content() {
        setup();
        let p = create_element("p");
        append_child(root(), p);
        set_style(p, "width", "12");
        set_style(p, "padding", "1");
        set_text(p, "hello wide");
        // Content width 10 fits "hello wide" on one row, plus padding.
        assert_eq!(measure_height(p), 3);
    }

    #[test]
    fn test_probe_measures_one_line_height() {
        setup();
        let p = create_element("p");
        append_child(root(), p);
        set_text(p, "some long paragraph");

        let probe = insert_probe(p);
        assert_eq!(measure_height(probe), 1);
        remove_probe(probe);

        set_style(p, "line-height", "2");
        let probe = insert_probe(p);
        assert_eq!(measure_height(probe), 2);
        remove_probe(probe);
    }

    #[test]
    fn test_content_width_chain() {
        setup();
        let section = create_element("section");
        append_child(root(), section);
        set_style(section, "width", "40");
        set_style(section, "padding", "2");
        assert_eq!(content_width(section), 36);
    }

    #[test]
    fn test_detached_node_measures_against_viewport() {
        setup();
        set_size(8, 24);
        let p = create_element("p");
        set_text(p, "aaaa bbbb");
        assert_eq!(measure_height(p), 2);
    }
}
