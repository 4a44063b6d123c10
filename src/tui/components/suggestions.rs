//! # Suggested Questions
//!
//! The starter questions shown under a fresh transcript. Tab / Shift+Tab move
//! the highlight and a click picks a row; either way the chosen question is
//! reported upward and ends up in the input box. Nothing is submitted.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, List, ListItem, ListState};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Borders plus the question rows.
pub fn panel_height(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX).saturating_add(2)
}

pub struct SuggestionsState {
    pub questions: Vec<String>,
    pub list_state: ListState,
    /// Screen rect from the last frame, for click hit-testing.
    last_area: Rect,
}

impl SuggestionsState {
    pub fn new(questions: &[&str]) -> Self {
        Self {
            questions: questions.iter().map(|q| q.to_string()).collect(),
            list_state: ListState::default(),
            last_area: Rect::default(),
        }
    }

    /// Drop the highlight, e.g. after the transcript is reset.
    pub fn clear_selection(&mut self) {
        self.list_state.select(None);
    }

    fn pick(&mut self, index: usize) -> Option<String> {
        let question = self.questions.get(index)?.clone();
        self.list_state.select(Some(index));
        Some(question)
    }

    fn step(&mut self, forward: bool) -> Option<String> {
        let count = self.questions.len();
        if count == 0 {
            return None;
        }
        let next = match (self.list_state.selected(), forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.pick(next)
    }

    /// Row under a click, if the click landed on a question.
    fn hit(&self, col: u16, row: u16) -> Option<usize> {
        let inner = Block::bordered().inner(self.last_area);
        if !inner.contains(Position::new(col, row)) {
            return None;
        }
        let index = usize::from(row - inner.y);
        (index < self.questions.len()).then_some(index)
    }
}

impl EventHandler for SuggestionsState {
    /// The selected question text.
    type Event = String;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::NextSuggestion => self.step(true),
            TuiEvent::PrevSuggestion => self.step(false),
            TuiEvent::MouseClick(col, row) => {
                let index = self.hit(*col, *row)?;
                self.pick(index)
            }
            _ => None,
        }
    }
}

pub struct Suggestions<'a> {
    pub state: &'a mut SuggestionsState,
}

impl Component for Suggestions<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.last_area = area;
        let items: Vec<ListItem> = self
            .state
            .questions
            .iter()
            .map(|q| {
                ListItem::new(Line::from(vec![
                    Span::styled("› ", Style::default().fg(Color::DarkGray)),
                    Span::raw(q.clone()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(" Try asking ")
                    .title_bottom(Line::from(" Tab next  Shift+Tab previous ").right_aligned()),
            )
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_stateful_widget(list, area, &mut self.state.list_state);
    }
}
