//! Responsive Example - Clamping teasers across viewport widths
//!
//! This example demonstrates the clamp lifecycle:
//! - Binding a ClampSet to a selector, with a width breakpoint
//! - Simulated viewport resizes and the debounce settle
//! - Late elements being adopted from mutation batches
//! - Teardown restoring the original text
//!
//! Run with: cargo run --example responsive

use std::time::Instant;

use lineclamp::{
    clamp::ClampSet,
    dom::{self, DocumentConfig},
    options::ClampOptions,
    render::visible_lines,
    timers, viewport, DEBOUNCE_INTERVAL,
};

fn main() -> lineclamp::Result<()> {
    // Clean state, and the manual path so the shrinking is visible in the
    // text itself rather than delegated to a renderer style.
    dom::reset_document();
    dom::set_config(DocumentConfig {
        native_line_clamp: false,
    });

    println!("=== lineclamp Responsive Example ===\n");

    let article = dom::create_element("article");
    dom::append_child(dom::root(), article);

    let first = teaser(
        article,
        "The quick brown fox jumps over the lazy dog while the rain in Spain stays mainly in the plain.",
    );
    let second = teaser(
        article,
        "All work and no play makes for a rather dull paragraph that still needs cutting down to size.",
    );

    // One line normally, two once the viewport is 60 columns or wider.
    let options = ClampOptions::new().with_lines(1).with_breakpoint(60, 2);
    let set = ClampSet::new("p.teaser", Some(options))?;
    println!("bound {} teaser(s)\n", set.len());

    for width in [80u16, 50, 30] {
        resize_to(width);
        println!("viewport {width} columns:");
        show(first);
        show(second);
        println!();
    }

    // A teaser added later is adopted once mutations are delivered.
    let third = teaser(
        article,
        "Late arrivals get clamped too, as soon as the tree settles.",
    );
    dom::deliver_mutations();
    println!("adopted late teaser:");
    show(third);
    println!();

    set.destroy();
    println!("after destroy (text restored):");
    show(first);

    println!("\n=== Example Complete ===");
    Ok(())
}

fn teaser(parent: dom::NodeId, text: &str) -> dom::NodeId {
    let p = dom::create_element("p");
    dom::set_attribute(p, "class", "teaser");
    dom::set_text(p, text);
    dom::append_child(parent, p);
    p
}

/// Resize and let the debounce settle, as the shell pump would.
fn resize_to(width: u16) {
    viewport::set_size(width, 24);
    timers::run_due(Instant::now() + DEBOUNCE_INTERVAL);
}

fn show(node: dom::NodeId) {
    for line in visible_lines(node) {
        println!("  | {line}");
    }
}
