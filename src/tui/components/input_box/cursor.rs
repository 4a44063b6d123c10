//! Cursor and horizontal scroll for the single-line input.
//!
//! `CursorState` keeps a byte offset into the buffer plus the number of
//! display columns scrolled off the left edge. The buffer itself belongs to
//! `InputBox` and is passed in explicitly.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub(super) struct CursorState {
    /// Byte offset in the buffer (0..=buffer.len()), always on a char boundary.
    pub pos: usize,
    /// Display columns hidden to the left.
    pub scroll_cols: usize,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_cols: 0,
        }
    }

    /// Put the cursor after the last character.
    pub fn move_to_end(&mut self, buffer: &str) {
        self.pos = buffer.len();
    }

    /// Display column of the cursor within the whole buffer.
    pub fn column(&self, buffer: &str) -> usize {
        buffer[..self.pos].width()
    }

    /// Adjust `scroll_cols` so the cursor stays within `visible` columns.
    pub fn keep_visible(&mut self, buffer: &str, visible: usize) {
        if visible == 0 {
            return;
        }
        let col = self.column(buffer);
        if col < self.scroll_cols {
            self.scroll_cols = col;
        } else if col >= self.scroll_cols + visible {
            self.scroll_cols = col + 1 - visible;
        }
        // Don't leave blank space on the right when text was deleted
        let total = buffer.width();
        if total < self.scroll_cols + visible {
            self.scroll_cols = (total + 1).saturating_sub(visible).min(self.scroll_cols);
        }
    }

    /// The part of `buffer` that fits in `visible` columns after scrolling.
    pub fn visible_slice<'a>(&self, buffer: &'a str, visible: usize) -> &'a str {
        let mut skipped = 0;
        let mut start = buffer.len();
        for (i, ch) in buffer.char_indices() {
            if skipped >= self.scroll_cols {
                start = i;
                break;
            }
            skipped += ch.width().unwrap_or(0);
        }
        let rest = &buffer[start..];
        let mut used = 0;
        let mut end = rest.len();
        for (i, ch) in rest.char_indices() {
            let w = ch.width().unwrap_or(0);
            if used + w > visible {
                end = i;
                break;
            }
            used += w;
        }
        &rest[..end]
    }

    pub fn left(&mut self, buffer: &str) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos = prev_char_boundary(buffer, self.pos);
        true
    }

    pub fn right(&mut self, buffer: &str) -> bool {
        if self.pos >= buffer.len() {
            return false;
        }
        self.pos = next_char_boundary(buffer, self.pos);
        true
    }

    pub fn word_left(&mut self, buffer: &str) -> bool {
        let target = word_start_before(buffer, self.pos);
        let moved = target != self.pos;
        self.pos = target;
        moved
    }

    pub fn word_right(&mut self, buffer: &str) -> bool {
        let rest = &buffer[self.pos..];
        let skip_space = rest.len() - rest.trim_start().len();
        let word = rest[skip_space..]
            .find(char::is_whitespace)
            .unwrap_or(rest.len() - skip_space);
        let target = self.pos + skip_space + word;
        let moved = target != self.pos;
        self.pos = target;
        moved
    }
}

/// Start of the word ending at `pos`, skipping whitespace first.
pub(super) fn word_start_before(buffer: &str, pos: usize) -> usize {
    let head = buffer[..pos].trim_end();
    head.rfind(char::is_whitespace)
        .map(|i| i + head[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0)
}

pub(super) fn prev_char_boundary(s: &str, pos: usize) -> usize {
    s[..pos].char_indices().next_back().map_or(0, |(i, _)| i)
}

pub(super) fn next_char_boundary(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map_or(pos, |c| pos + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_respect_multibyte_chars() {
        let s = "aé€b";
        assert_eq!(next_char_boundary(s, 0), 1);
        assert_eq!(next_char_boundary(s, 1), 3);
        assert_eq!(prev_char_boundary(s, 6), 3);
        assert_eq!(prev_char_boundary(s, 0), 0);
    }

    #[test]
    fn word_motions() {
        let s = "top five  items";
        let mut c = CursorState::new();
        c.move_to_end(s);
        assert!(c.word_left(s));
        assert_eq!(c.pos, 10);
        assert!(c.word_left(s));
        assert_eq!(c.pos, 4);
        assert!(c.word_right(s));
        assert_eq!(c.pos, 8);
        assert_eq!(word_start_before(s, 3), 0);
    }

    #[test]
    fn scrolls_to_keep_cursor_visible() {
        let s = "abcdefghij";
        let mut c = CursorState::new();
        c.move_to_end(s);
        c.keep_visible(s, 5);
        // cursor sits after 'j' in column 10: columns 6..=10 are shown
        assert_eq!(c.scroll_cols, 6);
        assert_eq!(c.visible_slice(s, 5), "ghij");

        c.pos = 0;
        c.keep_visible(s, 5);
        assert_eq!(c.scroll_cols, 0);
        assert_eq!(c.visible_slice(s, 5), "abcde");
    }

    #[test]
    fn wide_chars_count_two_columns() {
        let s = "数据分析";
        let mut c = CursorState::new();
        c.move_to_end(s);
        assert_eq!(c.column(s), 8);
        c.keep_visible(s, 5);
        assert_eq!(c.visible_slice(s, 5), "分析");
    }
}
