//! Layout Module - Text measurement on Taffy
//!
//! Sizing for the document tree, in terminal cells:
//!
//! - **text_measure** - Unicode-aware display width and word wrapping
//! - **measure** - Per-node height via a throwaway [Taffy](https://github.com/DioxusLabs/taffy)
//!   flex tree, honoring `width`, `padding`, and inherited `line-height`
//!   styles
//!
//! The clamp shrink loop and the probe-based line-height measurement both
//! go through [`measure_height`]; renderers wrap display text with
//! [`wrap_word`] at [`content_width`] so the two always agree.
//!
//! # Example
//!
//! ```ignore
//! use lineclamp::layout::{content_width, measure_height};
//!
//! let rows = measure_height(node);
//! let cols = content_width(node);
//! ```

mod measure;
mod text_measure;

pub use measure::{content_width, measure_height};
pub use text_measure::{grapheme_width, string_width, text_height, wrap_word};
