//! Clamp Module - Responsive text truncation
//!
//! The crate's core:
//!
//! - **controller** - [`Clamp`], the truncation lifecycle of one element
//! - **manager** - [`ClampSet`], selector-driven fleets of controllers
//!
//! Controllers clamp immediately when bound and re-clamp after viewport
//! resizes settle. A thread-local side table maps elements back to their
//! controllers, so binding twice is an error rather than a silent leak.
//!
//! # Example
//!
//! ```ignore
//! use lineclamp::clamp::ClampSet;
//! use lineclamp::options::ClampOptions;
//!
//! // Two lines by default, three once the viewport is 120 columns wide.
//! let options = ClampOptions::new().with_lines(2).with_breakpoint(120, 3);
//! let set = ClampSet::new("p.teaser", Some(options))?;
//! ```

mod controller;
mod manager;

pub use controller::{controller_of, reset_bindings, Clamp, DEBOUNCE_INTERVAL, ELLIPSIS};
pub use manager::ClampSet;
