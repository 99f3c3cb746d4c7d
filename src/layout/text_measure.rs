//! Text Measurement
//!
//! Display width and word wrapping for terminal text, in cells.
//!
//! Widths follow Unicode East Asian Width plus grapheme cluster analysis,
//! so CJK ideographs count as 2 cells, combining marks as 0, and emoji
//! ZWJ sequences as one 2-cell glyph. Wrapping breaks at word boundaries
//! (UAX #29) and force-breaks by grapheme when a single word is wider
//! than the line, which is what the `word-break: break-word` baseline
//! style asks for.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

// =============================================================================
// WIDTH
// =============================================================================

/// Display width of one grapheme cluster in terminal cells.
///
/// Single codepoints defer to East Asian Width. Multi-codepoint clusters
/// follow terminal renderer conventions: flag pairs, ZWJ sequences, skin
/// tone modifiers, and keycaps occupy 2 cells; a base character with
/// combining marks occupies the base width.
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return 0;
    };

    if grapheme.len() == first.len_utf8() {
        return first.width().unwrap_or(0);
    }

    // Regional indicator pair renders as one flag glyph.
    if (0x1F1E6..=0x1F1FF).contains(&(first as u32)) {
        return 2;
    }

    for c in chars {
        match c as u32 {
            // ZWJ sequence, VS16 emoji presentation, keycap, skin tone.
            0x200D | 0xFE0F | 0x20E3 => return 2,
            0x1F3FB..=0x1F3FF => return 2,
            _ => {}
        }
    }

    first.width().unwrap_or(0)
}

/// Display width of a string in terminal cells.
pub fn string_width(s: &str) -> u16 {
    if s.is_empty() {
        return 0;
    }

    // Fast path: printable ASCII is one cell per byte.
    if s.is_ascii() {
        let cells = s.bytes().filter(|&b| (0x20..0x7F).contains(&b)).count();
        return cells.min(u16::MAX as usize) as u16;
    }

    let cells: usize = s.graphemes(true).map(grapheme_width).sum();
    cells.min(u16::MAX as usize) as u16
}

// =============================================================================
// WRAPPING
// =============================================================================

/// Wrap text at word boundaries into lines of at most `max_width` cells.
///
/// Explicit newlines are hard breaks. Words wider than the line are
/// force-broken by grapheme. Whitespace that lands at a wrap point is
/// dropped, so no produced line starts or ends with a wrap-induced space.
///
/// Returns an empty `Vec` for empty input; `max_width` 0 yields the
/// input unwrapped.
pub fn wrap_word(text: &str, max_width: u16) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if max_width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }

    let max = max_width as usize;
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        wrap_line(raw_line, max, &mut lines);
    }

    lines
}

fn wrap_line(line: &str, max: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_width = 0usize;

    for segment in line.split_word_bounds() {
        let seg_width: usize = segment.graphemes(true).map(grapheme_width).sum();

        if current_width + seg_width > max {
            if current_width > 0 {
                lines.push(current.trim_end().to_string());
                current = String::new();
                current_width = 0;
            }

            if seg_width > max {
                break_graphemes(segment, max, lines, &mut current, &mut current_width);
                continue;
            }

            // Whitespace at the wrap point disappears.
            if segment.chars().all(char::is_whitespace) {
                continue;
            }
        }

        current.push_str(segment);
        current_width += seg_width;
    }

    lines.push(current);
}

/// Force-break an oversized segment at grapheme boundaries.
fn break_graphemes(
    segment: &str,
    max: usize,
    lines: &mut Vec<String>,
    current: &mut String,
    current_width: &mut usize,
) {
    for grapheme in segment.graphemes(true) {
        let gw = grapheme_width(grapheme);

        if *current_width + gw > max && !current.is_empty() {
            lines.push(std::mem::take(current));
            *current_width = 0;
        }

        current.push_str(grapheme);
        *current_width += gw;
    }
}

/// Number of lines `text` occupies when word-wrapped to `max_width`.
///
/// Same break rules as [`wrap_word`]; 0 for empty text.
pub fn text_height(text: &str, max_width: u16) -> u16 {
    if text.is_empty() {
        return 0;
    }
    let lines = wrap_word(text, max_width).len();
    lines.min(u16::MAX as usize) as u16
}

// =============================================================================
// TESTS
// =============================================================================
