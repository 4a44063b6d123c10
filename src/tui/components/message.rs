use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::{Body, ERROR_NOTICE, Message, Role};
use crate::tui::components::image_viewer::{IMAGE_SECTION_HEIGHT, ImagePreview};
use crate::tui::image::ImageSlot;
use crate::tui::{markdown, table};

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Borders (1 left + 1 right) plus padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Top and bottom border.
const VERTICAL_OVERHEAD: u16 = 2;
/// Spinner frames each loading dot stays lit for.
const DOT_FRAMES: usize = 4;

/// One transcript entry.
///
/// Created fresh each frame by `MessageList` for the visible messages only.
/// What goes inside the border follows `Message::body()`:
///
/// - `Loading`: three pulsing dots
/// - `Error`: the fixed notice in red
/// - `TableMarkup`: the markup parsed into a box-drawn grid
/// - `FormattedText`: markdown for the assistant, plain wrapped text for the user
///
/// Settled assistant messages may add a chart section and an analysis callout.
/// [`calculate_height`](Self::calculate_height) predicts the full height from the
/// same pieces the renderer uses, so the list can lay out without drawing.
#[derive(Clone, Copy)]
pub struct ChatMessage<'a> {
    pub message: &'a Message,
    pub is_selected: bool,
    /// Drives the loading animation.
    pub spinner_frame: usize,
    /// Cached state of this message's image, if it has one.
    pub image: Option<&'a ImageSlot>,
}

impl<'a> ChatMessage<'a> {
    pub fn new(
        message: &'a Message,
        is_selected: bool,
        spinner_frame: usize,
        image: Option<&'a ImageSlot>,
    ) -> Self {
        Self {
            message,
            is_selected,
            spinner_frame,
            image,
        }
    }

    pub fn calculate_height(message: &Message, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        VERTICAL_OVERHEAD
            + body_height(message, content_width)
            + image_height(message)
            + analysis_height(message, content_width)
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Green),
        Role::Assistant => Style::default().fg(Color::Blue),
    }
}

/// Body content plus whether it should be word-wrapped. Tables never wrap.
fn body_text(message: &Message, width: u16) -> (Text<'static>, bool) {
    match message.body() {
        Body::Loading => (Text::from(loading_dots(0)), false),
        Body::Error => (
            Text::from(Span::styled(ERROR_NOTICE, Style::default().fg(Color::Red))),
            true,
        ),
        Body::TableMarkup => {
            let grid = table::parse_table_markup(&message.content);
            let lines = table::render_grid(&grid, width, Style::default().fg(Color::White));
            (Text::from(lines), false)
        }
        Body::FormattedText => match message.role {
            Role::User => (
                Text::styled(message.content.trim().to_string(), role_style(Role::User)),
                true,
            ),
            Role::Assistant => (
                markdown::render(message.content.trim(), Style::default().fg(Color::White), width),
                true,
            ),
        },
    }
}

fn body_height(message: &Message, width: u16) -> u16 {
    let (text, wrap) = body_text(message, width);
    let lines = if wrap {
        Paragraph::new(text).wrap(Wrap { trim: false }).line_count(width)
    } else {
        text.lines.len()
    };
    u16::try_from(lines).unwrap_or(u16::MAX).max(1)
}

fn image_height(message: &Message) -> u16 {
    if message.image_url().is_some() {
        IMAGE_SECTION_HEIGHT
    } else {
        0
    }
}

fn analysis_paragraph(note: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled(
            "Analysis: ",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Span::styled(note.to_string(), Style::default().fg(Color::White)),
    ]))
    .wrap(Wrap { trim: true })
}

/// Spacer row, callout borders, wrapped note.
fn analysis_height(message: &Message, width: u16) -> u16 {
    let Some(note) = message.analysis_note() else {
        return 0;
    };
    let inner = width.saturating_sub(HORIZONTAL_OVERHEAD).max(1);
    let lines = analysis_paragraph(note).line_count(inner);
    1 + VERTICAL_OVERHEAD + u16::try_from(lines).unwrap_or(u16::MAX).max(1)
}

/// Three dots, each lit in turn.
fn loading_dots(frame: usize) -> Line<'static> {
    let lit = (frame / DOT_FRAMES) % 3;
    let spans = (0..3).flat_map(|i| {
        let style = if i == lit {
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        };
        let dot = Span::styled("●", style);
        if i < 2 { vec![dot, Span::raw(" ")] } else { vec![dot] }
    });
    Line::from(spans.collect::<Vec<_>>())
}

impl Widget for ChatMessage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let message = self.message;
        let style = role_style(message.role);
        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let block = Block::bordered()
            .title(role_label(message.role))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.is_empty() {
            return;
        }

        let width = inner.width;
        let [body_area, image_area, analysis_area] = Layout::vertical([
            Constraint::Length(body_height(message, width)),
            Constraint::Length(image_height(message)),
            Constraint::Length(analysis_height(message, width)),
        ])
        .areas(inner);

        if message.loading {
            Paragraph::new(loading_dots(self.spinner_frame)).render(body_area, buf);
        } else {
            let (text, wrap) = body_text(message, width);
            let paragraph = Paragraph::new(text);
            if wrap {
                paragraph.wrap(Wrap { trim: false }).render(body_area, buf);
            } else {
                paragraph.render(body_area, buf);
            }
        }

        if message.image_url().is_some() {
            ImagePreview {
                slot: self.image,
                is_selected: self.is_selected,
            }
            .render(image_area, buf);
        }

        if let Some(note) = message.analysis_note() {
            let [_, callout] =
                Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(analysis_area);
            let block = Block::bordered()
                .border_type(BorderType::Plain)
                .border_style(Style::default().fg(Color::Blue))
                .padding(Padding::horizontal(CONTENT_PAD_H));
            analysis_paragraph(note).block(block).render(callout, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::QueryResponse;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn answer(table: bool, result: &str, image: Option<&str>, analysis: Option<&str>) -> Message {
        Message::placeholder().resolved(&QueryResponse {
            table_output_verified: table,
            execution_result: result.to_string(),
            image_url: image.map(str::to_string),
            analysis: analysis.map(str::to_string),
        })
    }

    fn draw(message: &Message, width: u16) -> String {
        let height = ChatMessage::calculate_height(message, width);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| f.render_widget(ChatMessage::new(message, false, 0, None), f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn short_user_message_is_one_line() {
        let message = Message::user("Hello".into());
        assert_eq!(ChatMessage::calculate_height(&message, 80), 1 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn narrow_width_returns_minimum() {
        let message = Message::user("Hello world".into());
        assert_eq!(ChatMessage::calculate_height(&message, HORIZONTAL_OVERHEAD), 1);
    }

    #[test]
    fn user_text_wraps() {
        let message = Message::user("abcdefghij".into());
        // content width 4: "abcd" | "efgh" | "ij"
        assert_eq!(ChatMessage::calculate_height(&message, 8), 3 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn loading_placeholder_shows_dots() {
        let message = Message::placeholder();
        assert_eq!(ChatMessage::calculate_height(&message, 40), 1 + VERTICAL_OVERHEAD);
        let screen = draw(&message, 40);
        assert_eq!(screen.matches('●').count(), 3);
        assert!(screen.contains("assistant"));
    }

    #[test]
    fn dots_take_turns() {
        let lit = |frame| {
            loading_dots(frame)
                .spans
                .iter()
                .position(|s| s.style.add_modifier.contains(Modifier::BOLD))
        };
        assert_eq!(lit(0), Some(0));
        assert_eq!(lit(DOT_FRAMES), Some(2));
        assert_eq!(lit(DOT_FRAMES * 2), Some(4));
    }

    #[test]
    fn failed_message_shows_notice() {
        let message = Message::placeholder().failed();
        let screen = draw(&message, 100);
        assert!(screen.contains(ERROR_NOTICE));
    }

    #[test]
    fn verified_table_renders_grid() {
        let message = answer(true, "<table><tr><td>1</td></tr></table>", None, None);
        assert_eq!(ChatMessage::calculate_height(&message, 40), 3 + VERTICAL_OVERHEAD);
        let screen = draw(&message, 40);
        assert!(screen.contains("┌───┐"));
        assert!(screen.contains("│ 1 │"));
    }

    #[test]
    fn verified_flag_with_prose_renders_text() {
        let message = answer(true, "plain text", None, None);
        let screen = draw(&message, 40);
        assert!(screen.contains("plain text"));
        assert!(!screen.contains('┌'));
    }

    #[test]
    fn unverified_table_markup_stays_literal() {
        let message = answer(false, "<table><tr><td>1</td></tr></table>", None, None);
        let screen = draw(&message, 60);
        assert!(screen.contains("<table>"));
    }

    #[test]
    fn analysis_callout_adds_height_and_text() {
        let plain = answer(false, "There are 5 items...", None, None);
        let noted = answer(false, "There are 5 items...", None, Some("Milk leads"));
        assert_eq!(
            ChatMessage::calculate_height(&noted, 60),
            ChatMessage::calculate_height(&plain, 60) + 1 + VERTICAL_OVERHEAD + 1
        );
        let screen = draw(&noted, 60);
        assert!(screen.contains("Analysis: Milk leads"));
    }

    #[test]
    fn image_reserves_preview_section() {
        let plain = answer(false, "chart below", None, None);
        let charted = answer(false, "chart below", Some("/static/c.png"), None);
        assert_eq!(
            ChatMessage::calculate_height(&charted, 60),
            ChatMessage::calculate_height(&plain, 60) + IMAGE_SECTION_HEIGHT
        );
        let screen = draw(&charted, 60);
        assert!(screen.contains("loading chart"));
        assert!(screen.contains("[d] download"));
    }

    #[test]
    fn greeting_renders_as_assistant() {
        let screen = draw(&Message::greeting(), 120);
        assert!(screen.contains("assistant"));
        assert!(screen.contains("data analysis assistant"));
    }
}
