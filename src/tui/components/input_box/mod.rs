//! # InputBox Component
//!
//! Single-line question field.
//!
//! ## Responsibilities
//!
//! - Capture text input and editing keys (backspace, delete, word motions, paste)
//! - Report edits and Enter upward as `InputEvent`s
//! - Show a placeholder while empty, and a dimmed read-only state while a
//!   request is in flight
//!
//! ## State Management
//!
//! The core `App::input` is the source of truth. Every edit is reported as
//! `InputEvent::Changed`, the parent forwards it as `Action::InputChanged`,
//! and before each frame the parent calls [`InputBox::sync_from`] so
//! programmatic changes (suggestion picked, input cleared on submit) show up
//! here. Cursor position and horizontal scroll live in `CursorState`.

mod cursor;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use cursor::{CursorState, next_char_boundary, prev_char_boundary, word_start_before};

pub const PLACEHOLDER: &str = "Ask a question about your data...";
/// Border rows plus the text row.
pub const INPUT_HEIGHT: u16 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed. The parent decides whether anything is sent.
    Submit,
    /// Buffer text changed; carries the new text.
    Changed(String),
}

pub struct InputBox {
    buffer: String,
    /// Set while a request is in flight: edits are ignored and the box dims.
    pub disabled: bool,
    /// False while the message list has keyboard focus (cursor mode).
    pub focused: bool,
    cursor: CursorState,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            disabled: false,
            focused: true,
            cursor: CursorState::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Adopt `text` if it differs from the buffer. The cursor moves to the end.
    pub fn sync_from(&mut self, text: &str) {
        if self.buffer != text {
            self.buffer = text.to_string();
            self.cursor.move_to_end(&self.buffer);
        }
    }

    fn changed(&self) -> Option<InputEvent> {
        Some(InputEvent::Changed(self.buffer.clone()))
    }

    fn insert(&mut self, text: &str) -> Option<InputEvent> {
        if text.is_empty() {
            return None;
        }
        self.buffer.insert_str(self.cursor.pos, text);
        self.cursor.pos += text.len();
        self.changed()
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border_style = match (self.disabled, self.focused) {
            (true, _) => Style::default().fg(Color::DarkGray),
            (false, true) => Style::default().fg(Color::Green),
            (false, false) => Style::default().fg(Color::Green).add_modifier(Modifier::DIM),
        };
        let title = if self.disabled { " Waiting for answer… " } else { " Question " };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(title);
        let inner = block.inner(area);
        let visible = usize::from(inner.width);
        self.cursor.keep_visible(&self.buffer, visible);

        let content = if self.buffer.is_empty() {
            Span::styled(
                PLACEHOLDER,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )
        } else {
            let style = if self.disabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Green)
            };
            Span::styled(self.cursor.visible_slice(&self.buffer, visible).to_string(), style)
        };
        frame.render_widget(Paragraph::new(content).block(block), area);

        if self.focused && !self.disabled && !inner.is_empty() {
            let col = self.cursor.column(&self.buffer).saturating_sub(self.cursor.scroll_cols);
            let x = inner.x + u16::try_from(col).unwrap_or(inner.width).min(inner.width.saturating_sub(1));
            frame.set_cursor_position((x, inner.y));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.disabled {
            return None;
        }
        match event {
            TuiEvent::InputChar(c) => {
                let mut utf8 = [0; 4];
                self.insert(c.encode_utf8(&mut utf8))
            }
            TuiEvent::Paste(text) => {
                let flattened: String = text
                    .chars()
                    .filter(|c| *c != '\r')
                    .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
                    .collect();
                self.insert(&flattened)
            }
            TuiEvent::Backspace => {
                if self.cursor.pos == 0 {
                    return None;
                }
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                self.changed()
            }
            TuiEvent::Delete => {
                if self.cursor.pos >= self.buffer.len() {
                    return None;
                }
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                self.changed()
            }
            TuiEvent::DeleteWordBack => {
                let start = word_start_before(&self.buffer, self.cursor.pos);
                if start == self.cursor.pos {
                    return None;
                }
                self.buffer.drain(start..self.cursor.pos);
                self.cursor.pos = start;
                self.changed()
            }
            TuiEvent::CursorLeft => {
                self.cursor.left(&self.buffer);
                None
            }
            TuiEvent::CursorRight => {
                self.cursor.right(&self.buffer);
                None
            }
            TuiEvent::WordLeft => {
                self.cursor.word_left(&self.buffer);
                None
            }
            TuiEvent::WordRight => {
                self.cursor.word_right(&self.buffer);
                None
            }
            TuiEvent::CursorHome => {
                self.cursor.pos = 0;
                None
            }
            TuiEvent::CursorEnd => {
                self.cursor.move_to_end(&self.buffer);
                None
            }
            TuiEvent::Submit => Some(InputEvent::Submit),
            _ => None,
        }
    }
}
