//! DOM Module - Retained element tree
//!
//! The document the clamp controllers operate on:
//!
//! - **Node** - Tag, text, attributes, styles, flags
//! - **Selector** - Parsed CSS-ish selectors for element matching
//! - **Document** - Thread-local arena, mutation records, observers
//!
//! Structural mutations (insert/remove) queue records that
//! [`deliver_mutations`] flushes to observers in batches; text, style,
//! and attribute writes are silent.

mod document;
mod node;
mod selector;

pub use document::*;
pub use node::{Node, NodeFlags, NodeId};
pub use selector::Selector;
