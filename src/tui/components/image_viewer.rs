//! # Image Viewer
//!
//! Two views of the same chart:
//!
//! - `ImagePreview`: the inline section drawn inside an assistant message
//!   (fixed height, so message heights stay computable before drawing).
//! - `ImageOverlay`: the expanded view, 90% of the screen over a `Clear`ed
//!   area. Its persistent part is `ImageOverlayState`, held by `TuiState`
//!   and dropped on close or transcript reset.

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Widget};

use crate::tui::component::Component;
use crate::tui::event::TuiEvent;
use crate::tui::image::{ChartView, ImageSlot};

/// Cell rows used by the inline chart itself.
pub const IMAGE_PREVIEW_ROWS: u16 = 14;
/// Spacer + chart + key hint.
pub const IMAGE_SECTION_HEIGHT: u16 = 1 + IMAGE_PREVIEW_ROWS + 1;

const OVERLAY_PERCENT: u16 = 90;

fn status_line(slot: Option<&ImageSlot>) -> Option<Line<'static>> {
    match slot {
        None | Some(ImageSlot::Loading) => Some(Line::from(Span::styled(
            "loading chart…",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))),
        Some(ImageSlot::Failed) => Some(Line::from(Span::styled(
            "image unavailable",
            Style::default().fg(Color::Red).add_modifier(Modifier::DIM),
        ))),
        Some(ImageSlot::Ready(_)) => None,
    }
}

/// Inline chart section of a message.
pub struct ImagePreview<'a> {
    pub slot: Option<&'a ImageSlot>,
    /// Key hints are highlighted when the owning message is the target.
    pub is_selected: bool,
}

impl Widget for ImagePreview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [_, chart, hint] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(IMAGE_PREVIEW_ROWS),
            Constraint::Length(1),
        ])
        .areas(area);

        match (self.slot, status_line(self.slot)) {
            (Some(ImageSlot::Ready(image)), _) => ChartView { chart: image }.render(chart, buf),
            (_, Some(line)) => Paragraph::new(line).render(chart, buf),
            _ => {}
        }

        let key_style = if self.is_selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let label_style = Style::default().fg(Color::DarkGray);
        Paragraph::new(Line::from(vec![
            Span::styled("[d]", key_style),
            Span::styled(" download  ", label_style),
            Span::styled("[e]", key_style),
            Span::styled(" expand", label_style),
        ]))
        .render(hint, buf);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    Close,
    Download,
}

/// An expanded chart. Exists only while the overlay is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOverlayState {
    /// Resolved image URL; also the image cache key.
    pub url: String,
}

impl ImageOverlayState {
    pub fn new(url: String) -> Self {
        Self { url }
    }

    /// `screen` is the full frame, needed to tell clicks outside the overlay.
    pub fn handle_event(&self, event: &TuiEvent, screen: Rect) -> Option<OverlayEvent> {
        match event {
            TuiEvent::Escape | TuiEvent::InputChar('q' | 'x') => Some(OverlayEvent::Close),
            TuiEvent::InputChar('d') => Some(OverlayEvent::Download),
            TuiEvent::MouseClick(col, row)
                if !overlay_area(screen).contains(Position::new(*col, *row)) =>
            {
                Some(OverlayEvent::Close)
            }
            _ => None,
        }
    }
}

pub struct ImageOverlay<'a> {
    pub state: &'a ImageOverlayState,
    pub slot: Option<&'a ImageSlot>,
}

impl Component for ImageOverlay<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = overlay_area(area);
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Visualization ")
            .title_bottom(Line::from(" d Download  Esc/q/x Close ").alignment(Alignment::Center));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        match (self.slot, status_line(self.slot)) {
            (Some(ImageSlot::Ready(image)), _) => {
                frame.render_widget(ChartView { chart: image }, inner);
            }
            (_, Some(line)) => {
                frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), inner);
            }
            _ => {}
        }
    }
}

/// Where the expanded chart is drawn for a given screen.
pub fn overlay_area(screen: Rect) -> Rect {
    centered_rect(OVERLAY_PERCENT, OVERLAY_PERCENT, screen)
}

fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::image::{ChartImage, FALLBACK_FONT_SIZE};
    use image::{DynamicImage, Rgba, RgbaImage};
    use ratatui_image::picker::Picker;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn red_square() -> ImageSlot {
        ImageSlot::Ready(ChartImage::new(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([200, 0, 0, 255]))),
            Picker::from_fontsize(FALLBACK_FONT_SIZE),
        ))
    }

    #[test]
    fn preview_shows_loading_then_hint() {
        let area = Rect::new(0, 0, 40, IMAGE_SECTION_HEIGHT);
        let mut buf = Buffer::empty(area);
        ImagePreview { slot: None, is_selected: false }.render(area, &mut buf);

        let row = |y: u16| (0..40).map(|x| buf[(x, y)].symbol()).collect::<String>();
        assert!(row(1).contains("loading chart"));
        assert!(row(IMAGE_SECTION_HEIGHT - 1).contains("[d] download  [e] expand"));
    }

    #[test]
    fn preview_reports_failure() {
        let area = Rect::new(0, 0, 40, IMAGE_SECTION_HEIGHT);
        let mut buf = Buffer::empty(area);
        let slot = ImageSlot::Failed;
        ImagePreview { slot: Some(&slot), is_selected: false }.render(area, &mut buf);

        let row: String = (0..40).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(row.contains("image unavailable"));
    }

    #[test]
    fn preview_draws_ready_image() {
        let area = Rect::new(0, 0, 40, IMAGE_SECTION_HEIGHT);
        let mut buf = Buffer::empty(area);
        let slot = red_square();
        ImagePreview { slot: Some(&slot), is_selected: true }.render(area, &mut buf);

        let drawn = (1..=IMAGE_PREVIEW_ROWS)
            .flat_map(|y| (0..40).map(move |x| (x, y)))
            .any(|pos| buf[pos].bg != Color::Reset || buf[pos].fg != Color::Reset);
        assert!(drawn);
    }

    #[test]
    fn overlay_renders_title_and_controls() {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let state = ImageOverlayState::new("http://backend.test/static/chart.png".into());
        let slot = red_square();
        terminal
            .draw(|f| {
                ImageOverlay { state: &state, slot: Some(&slot) }.render(f, f.area());
            })
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Visualization"));
        assert!(text.contains("Esc/q/x Close"));
    }

    #[test]
    fn close_keys_and_outside_click_dismiss() {
        let state = ImageOverlayState::new("u".into());
        let screen = Rect::new(0, 0, 100, 50);

        assert_eq!(state.handle_event(&TuiEvent::Escape, screen), Some(OverlayEvent::Close));
        assert_eq!(state.handle_event(&TuiEvent::InputChar('q'), screen), Some(OverlayEvent::Close));
        assert_eq!(state.handle_event(&TuiEvent::InputChar('x'), screen), Some(OverlayEvent::Close));
        assert_eq!(
            state.handle_event(&TuiEvent::InputChar('d'), screen),
            Some(OverlayEvent::Download)
        );
        assert_eq!(state.handle_event(&TuiEvent::MouseClick(0, 0), screen), Some(OverlayEvent::Close));
        assert_eq!(state.handle_event(&TuiEvent::MouseClick(50, 25), screen), None);
        assert_eq!(state.handle_event(&TuiEvent::InputChar('z'), screen), None);
    }

    #[test]
    fn overlay_covers_ninety_percent() {
        let area = overlay_area(Rect::new(0, 0, 100, 50));
        assert_eq!(area.width, 90);
        assert!((44..=46).contains(&area.height), "height {}", area.height);
    }
}
