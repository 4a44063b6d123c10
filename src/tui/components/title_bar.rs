//! # TitleBar Component
//!
//! One-line header: app name, current status, and a "↓ New" marker when the
//! message list is scrolled away from newer content. The right edge carries
//! the clear-chat and quit shortcuts.
//!
//! Purely presentational; all three values are props:
//! - `status_message` comes from core `App`
//! - `has_unseen_content` comes from `MessageListState`
//! - `is_loading` switches the status colour

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub const APP_TITLE: &str = "Data Analysis Assistant";
const SHORTCUTS: &str = "Ctrl+L clear  Ctrl+C quit ";

pub struct TitleBar {
    pub status_message: String,
    pub has_unseen_content: bool,
    pub is_loading: bool,
}

impl TitleBar {
    pub fn new(status_message: String, has_unseen_content: bool, is_loading: bool) -> Self {
        Self {
            status_message,
            has_unseen_content,
            is_loading,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let separator = Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![Span::styled(
            APP_TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        if !self.status_message.is_empty() {
            let color = if self.is_loading { Color::Yellow } else { Color::Gray };
            spans.push(separator.clone());
            spans.push(Span::styled(self.status_message.clone(), Style::default().fg(color)));
        }
        if self.has_unseen_content {
            spans.push(separator);
            spans.push(Span::styled(
                "↓ New",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
        }

        let hint_width = u16::try_from(SHORTCUTS.len()).unwrap_or(0);
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(hint_width)]).areas(area);
        frame.render_widget(Line::from(spans), left);
        frame.render_widget(
            Line::from(Span::styled(SHORTCUTS, Style::default().fg(Color::DarkGray))).right_aligned(),
            right,
        );
    }
}
