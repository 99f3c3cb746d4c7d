//! # lineclamp
//!
//! Responsive multi-line text clamping for terminal documents.
//!
//! ## Architecture
//!
//! lineclamp works against a retained element tree (the [`dom`] module):
//! a thread-local arena of nodes with tags, text, attributes, and styles.
//! A [`Clamp`] binds to one element, resolves how many lines it may show
//! at the current viewport width, and truncates it; a [`ClampSet`] keeps
//! controllers on every element matching a selector as the tree changes.
//!
//! ```text
//! viewport resize → debounce timer → excerpt → measure (Taffy) → shrink/style
//! ```
//!
//! Truncation takes one of two paths, decided once per document: renderers
//! that honor `line-clamp` get the full text plus a style; everything else
//! gets the text shortened word by word until its measured height fits.
//!
//! ## Modules
//!
//! - [`dom`] - Element tree, mutation records, observers, selectors
//! - [`options`] - Line counts and width breakpoints, layered resolution
//! - [`clamp`] - Controllers and selector-driven sets
//! - [`layout`] - Text width, word wrapping, Taffy-backed height measurement
//! - [`render`] - The lines a clamped element actually presents
//! - [`viewport`] / [`timers`] / [`shell`] - Resize plumbing and the event pump

pub mod clamp;
pub mod dom;
pub mod error;
pub mod layout;
pub mod options;
pub mod render;
pub mod shell;
pub mod timers;
pub mod viewport;

// Re-export commonly used items
pub use error::{Error, Result};

pub use clamp::{controller_of, Clamp, ClampSet, DEBOUNCE_INTERVAL, ELLIPSIS};

pub use dom::{DocumentConfig, MutationRecord, NodeId, ObserverHandle, Selector};

pub use options::{
    ClampOptions, ResolvedOptions, BREAKPOINTS_ATTRIBUTE, DEFAULT_LINES, LINES_ATTRIBUTE,
};

pub use layout::{content_width, measure_height, string_width, text_height, wrap_word};

pub use render::visible_lines;

pub use viewport::ResizeHandle;

pub use timers::TimerId;
