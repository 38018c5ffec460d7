//! Display columns for block selections.
//!
//! Visual-block geometry is rectangular in screen cells, not characters:
//! a tab spans up to `tabstop` cells and wide characters span two. Width of
//! a single character comes from `unicode_width`; control characters count
//! as zero.

use unicode_width::UnicodeWidthChar;

pub fn char_width(c: char, col: usize, tabstop: usize) -> usize {
    if c == '\t' {
        let ts = tabstop.max(1);
        return ts - (col % ts);
    }
    c.width().unwrap_or(0)
}

/// Screen column where the character at `character` starts.
pub fn visual_col(line: &str, character: usize, tabstop: usize) -> usize {
    let mut col = 0;
    for c in line.chars().take(character) {
        col += char_width(c, col, tabstop);
    }
    col
}

/// Character index covering screen column `target`. Past the end of the
/// line this returns the line length.
pub fn char_at_visual_col(line: &str, target: usize, tabstop: usize) -> usize {
    let mut col = 0;
    for (i, c) in line.chars().enumerate() {
        let w = char_width(c, col, tabstop);
        if col + w > target {
            return i;
        }
        col += w;
    }
    line.chars().count()
}

/// Total display width of a line.
pub fn line_width(line: &str, tabstop: usize) -> usize {
    visual_col(line, usize::MAX, tabstop)
}
