use ratatui::Frame;
use ratatui::layout::Rect;

use crate::tui::event::TuiEvent;

/// Something that draws itself into a region of the screen.
///
/// Data comes in as struct fields built per frame from `App` and `TuiState`.
/// `render` takes `&mut self` because the message list and input box update
/// their layout cache and scroll offset while drawing.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Turns raw `TuiEvent`s into a component-level event such as a picked
/// suggestion or an edited question.
pub trait EventHandler {
    type Event;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
