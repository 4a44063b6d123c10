use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::input_box::INPUT_HEIGHT;
use crate::tui::components::message_list::LayoutCache;
use crate::tui::components::suggestions::panel_height;
use crate::tui::components::{ImageOverlay, MessageList, Suggestions, TitleBar};

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub title: Rect,
    pub messages: Rect,
    pub suggestions: Option<Rect>,
    pub input: Rect,
}

pub fn screen_layout(area: Rect, suggestion_rows: Option<usize>) -> ScreenLayout {
    use Constraint::{Length, Min};
    match suggestion_rows {
        Some(rows) => {
            let [title, messages, suggestions, input] =
                Layout::vertical([Length(1), Min(0), Length(panel_height(rows)), Length(INPUT_HEIGHT)])
                    .areas(area);
            ScreenLayout {
                title,
                messages,
                suggestions: Some(suggestions),
                input,
            }
        }
        None => {
            let [title, messages, input] =
                Layout::vertical([Length(1), Min(0), Length(INPUT_HEIGHT)]).areas(area);
            ScreenLayout {
                title,
                messages,
                suggestions: None,
                input,
            }
        }
    }
}

/// Rows the suggestions panel needs this frame, or None when it is hidden.
pub fn suggestion_rows(app: &App, tui: &TuiState) -> Option<usize> {
    app.suggestions_visible()
        .then_some(tui.suggestions.questions.len())
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let layout = screen_layout(frame.area(), suggestion_rows(app, tui));

    MessageList {
        state: &mut tui.message_list,
        messages: app.transcript.messages(),
        revision: app.revision,
        spinner_frame,
        images: &tui.images,
        base_url: app.backend.base_url(),
    }
    .render(frame, layout.messages);

    TitleBar::new(
        app.status_message.clone(),
        tui.message_list.has_unseen_content,
        app.is_loading,
    )
    .render(frame, layout.title);

    if let Some(area) = layout.suggestions {
        Suggestions {
            state: &mut tui.suggestions,
        }
        .render(frame, area);
    }

    tui.input_box.render(frame, layout.input);

    if let Some(overlay) = &tui.overlay {
        ImageOverlay {
            state: overlay,
            slot: tui.images.get(&overlay.url),
        }
        .render(frame, frame.area());
    }
}

/// Hit test: which message (if any) is drawn at screen row `screen_y`.
pub fn hit_test_message(
    screen_y: u16,
    messages_area: Rect,
    scroll_offset_y: u16,
    layout: &LayoutCache,
) -> Option<usize> {
    if screen_y < messages_area.y || screen_y >= messages_area.bottom() {
        return None;
    }
    let content_y = (screen_y - messages_area.y).saturating_add(scroll_offset_y);
    layout.index_at(content_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::test_support::test_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &App, tui: &mut TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn fresh_screen_shows_greeting_suggestions_and_placeholder() {
        let app = test_app();
        let mut tui = TuiState::new();
        let text = draw(&app, &mut tui);

        assert!(text.contains("Data Analysis Assistant"));
        assert!(text.contains("Hello!"));
        assert!(text.contains("What are the top 5 most purchased items?"));
        assert!(text.contains("Ask a question about your data..."));
    }

    #[test]
    fn suggestions_disappear_after_submit() {
        let mut app = test_app();
        let mut tui = TuiState::new();
        update(&mut app, Action::InputChanged("hi".into()));
        update(&mut app, Action::Submit);

        let text = draw(&app, &mut tui);
        assert!(!text.contains("Try asking"));
        assert!(text.contains("Analyzing..."));
    }

    #[test]
    fn layout_reserves_suggestion_panel_only_when_visible() {
        let area = Rect::new(0, 0, 80, 30);
        let with = screen_layout(area, Some(5));
        let without = screen_layout(area, None);

        assert_eq!(with.suggestions.map(|r| r.height), Some(7));
        assert_eq!(without.suggestions, None);
        assert_eq!(with.input.height, INPUT_HEIGHT);
        assert_eq!(without.messages.height, 30 - 1 - INPUT_HEIGHT);
    }

    #[test]
    fn hit_test_accounts_for_scroll() {
        let mut layout = LayoutCache::new();
        layout.heights = vec![4, 3, 3];
        layout.rebuild_prefix_heights();
        let area = Rect::new(0, 1, 80, 20);

        assert_eq!(hit_test_message(0, area, 0, &layout), None, "title row");
        assert_eq!(hit_test_message(1, area, 0, &layout), Some(0));
        assert_eq!(hit_test_message(5, area, 0, &layout), Some(1));
        assert_eq!(hit_test_message(1, area, 4, &layout), Some(1));
        assert_eq!(hit_test_message(10, area, 0, &layout), Some(2));
        assert_eq!(hit_test_message(12, area, 0, &layout), None, "below content");
        assert_eq!(hit_test_message(21, area, 0, &layout), None, "input row");
    }
}
