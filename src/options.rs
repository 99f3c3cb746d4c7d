//! Clamp options - line counts and responsive breakpoints.
//!
//! Options arrive from three sources with increasing precedence: library
//! defaults, caller-supplied values, and the element's reserved attributes.
//! The partial form is [`ClampOptions`]; [`ClampOptions::resolve`] produces
//! the normalized [`ResolvedOptions`] a controller actually runs with.
//!
//! # API
//!
//! - `ClampOptions::new()` - empty partial options
//! - `with_lines` / `with_breakpoint` - chainable setters
//! - `layered(other)` - overlay another partial (present fields win)
//! - `resolve()` - normalize into `ResolvedOptions`
//! - `active_lines(width)` - allowed line count for a viewport width
//! - `from_attributes` - parse the reserved element attributes
//!
//! # Example
//!
//! ```ignore
//! use lineclamp::ClampOptions;
//!
//! let resolved = ClampOptions::new()
//!     .with_lines(2)
//!     .with_breakpoint(768, 3)
//!     .resolve();
//!
//! assert_eq!(resolved.active_lines(1024), 3);
//! assert_eq!(resolved.active_lines(500), 2);
//! ```

use std::collections::BTreeMap;

use crate::error::{Error, Result};

// =============================================================================
// DEFAULTS & ATTRIBUTE NAMES
// =============================================================================

/// Allowed line count when neither caller nor attributes supply one.
pub const DEFAULT_LINES: u16 = 1;

/// Reserved attribute overriding the allowed line count.
pub const LINES_ATTRIBUTE: &str = "clamp-lines";

/// Reserved attribute carrying a JSON breakpoint table.
pub const BREAKPOINTS_ATTRIBUTE: &str = "clamp-breakpoints";

// =============================================================================
// TYPES
// =============================================================================

/// Partial clamp options, as supplied by callers or parsed from attributes.
///
/// Absent fields fall through to the layer below during merging. Use
/// [`ClampOptions::resolve`] to obtain the normalized form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClampOptions {
    /// Allowed line count when no breakpoint matches.
    pub lines: Option<u16>,
    /// Minimum viewport width (cells) to allowed line count.
    pub breakpoints: Option<BTreeMap<u16, u16>>,
}

/// Fully normalized options a controller runs with.
///
/// Invariant: `breakpoints` always contains key `0`, equal to `lines`, so
/// tier selection matches at every viewport width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub lines: u16,
    pub breakpoints: BTreeMap<u16, u16>,
}

impl Default for ResolvedOptions {
    /// The library defaults: one line, single fallback tier.
    fn default() -> Self {
        Self {
            lines: DEFAULT_LINES,
            breakpoints: BTreeMap::from([(0, DEFAULT_LINES)]),
        }
    }
}

// =============================================================================
// MERGING
// =============================================================================

impl ClampOptions {
    /// Create empty partial options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the allowed line count.
    pub fn with_lines(mut self, lines: u16) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Add one breakpoint entry.
    pub fn with_breakpoint(mut self, min_width: u16, lines: u16) -> Self {
        self.breakpoints
            .get_or_insert_with(BTreeMap::new)
            .insert(min_width, lines);
        self
    }

    /// Replace the whole breakpoint table.
    pub fn with_breakpoints(mut self, breakpoints: BTreeMap<u16, u16>) -> Self {
        self.breakpoints = Some(breakpoints);
        self
    }

    /// Overlay `other` on top of these options.
    ///
    /// Fields present in `other` win; the breakpoint table is replaced as a
    /// whole, not merged key by key.
    pub fn layered(&self, other: &ClampOptions) -> ClampOptions {
        ClampOptions {
            lines: other.lines.or(self.lines),
            breakpoints: other
                .breakpoints
                .clone()
                .or_else(|| self.breakpoints.clone()),
        }
    }

    /// Normalize into the resolved form.
    ///
    /// - missing `lines` defaults to [`DEFAULT_LINES`]
    /// - line counts of `0` are raised to `1`
    /// - breakpoint key `0` is forced to the effective `lines` value,
    ///   regardless of caller input, so a tier always matches
    pub fn resolve(&self) -> ResolvedOptions {
        let lines = self.lines.unwrap_or(DEFAULT_LINES).max(1);

        let mut breakpoints = self.breakpoints.clone().unwrap_or_default();
        for count in breakpoints.values_mut() {
            *count = (*count).max(1);
        }
        breakpoints.insert(0, lines);

        ResolvedOptions { lines, breakpoints }
    }
}

// =============================================================================
// TIER SELECTION
// =============================================================================

impl ResolvedOptions {
    /// The active breakpoint tier for a viewport width: the largest minimum
    /// width not exceeding `width`. Key `0` guarantees a match.
    pub fn active_tier(&self, width: u16) -> u16 {
        self.breakpoints
            .range(..=width)
            .next_back()
            .map(|(&tier, _)| tier)
            .unwrap_or(0)
    }

    /// Allowed line count at the given viewport width.
    pub fn active_lines(&self, width: u16) -> u16 {
        self.breakpoints
            .range(..=width)
            .next_back()
            .map(|(_, &lines)| lines)
            .unwrap_or(self.lines)
    }
}

// =============================================================================
// ATTRIBUTE PARSING
// =============================================================================

/// Parse the `clamp-lines` attribute value.
pub fn parse_lines(value: &str) -> Result<u16> {
    let lines: u16 = value.trim().parse().map_err(|_| Error::InvalidAttribute {
        attribute: LINES_ATTRIBUTE,
        value: value.to_string(),
        reason: "expected an integer line count".to_string(),
    })?;

    if lines == 0 {
        return Err(Error::InvalidAttribute {
            attribute: LINES_ATTRIBUTE,
            value: value.to_string(),
            reason: "line count must be at least 1".to_string(),
        });
    }

    Ok(lines)
}

/// Parse the `clamp-breakpoints` attribute value.
///
/// The value is a JSON object mapping minimum viewport widths to line
/// counts, e.g. `{"0": 2, "768": 3}`.
pub fn parse_breakpoints(value: &str) -> Result<BTreeMap<u16, u16>> {
    let breakpoints: BTreeMap<u16, u16> =
        serde_json::from_str(value).map_err(|err| Error::InvalidAttribute {
            attribute: BREAKPOINTS_ATTRIBUTE,
            value: value.to_string(),
            reason: err.to_string(),
        })?;

    if breakpoints.values().any(|&lines| lines == 0) {
        return Err(Error::InvalidAttribute {
            attribute: BREAKPOINTS_ATTRIBUTE,
            value: value.to_string(),
            reason: "breakpoint line counts must be at least 1".to_string(),
        });
    }

    Ok(breakpoints)
}

/// Build partial options from the reserved attribute values.
///
/// `None` inputs mean the attribute is absent. Present-but-malformed values
/// are configuration errors, never silent fallbacks.
pub fn from_attributes(
    lines: Option<&str>,
    breakpoints: Option<&str>,
) -> Result<ClampOptions> {
    let mut options = ClampOptions::new();

    if let Some(value) = lines {
        options.lines = Some(parse_lines(value)?);
    }

    if let Some(value) = breakpoints {
        options.breakpoints = Some(parse_breakpoints(value)?);
    }

    Ok(options)
}

// =============================================================================
// TESTS
// =============================================================================
