//! # MessageList Component
//!
//! Scrollable view of the transcript.
//!
//! ## Responsibilities
//!
//! - Lay out messages using `ChatMessage::calculate_height` (cached)
//! - Draw only the messages near the viewport into a `ScrollView`
//! - Keep the newest message in view while pinned to the bottom
//! - Report whether content is hidden below the viewport ("↓ New")
//!
//! `MessageList` is created each frame around `&mut MessageListState`, so the
//! render pass can update the layout cache and scroll offset.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::api::resolve_asset_url;
use crate::core::message::Message;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::ChatMessage;
use crate::tui::event::TuiEvent;
use crate::tui::image::ImageCache;

/// Layout and scroll state for the message list. Lives in `TuiState`.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// Follow new content as it arrives.
    pub stick_to_bottom: bool,
    /// Message targeted by cursor mode or the last click.
    pub selected_index: Option<usize>,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Set during render: something is below the visible area.
    pub has_unseen_content: bool,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            selected_index: None,
            viewport_height: 0,
            has_unseen_content: false,
        }
    }

    fn max_scroll(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Keep the offset inside the content.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Scroll so the selected message is visible; tall messages align to their top.
    pub fn scroll_to_selected(&mut self) {
        let Some(idx) = self.selected_index else {
            return;
        };
        let Some(&item_bottom) = self.layout.prefix_heights.get(idx) else {
            return;
        };
        let item_top = self.layout.top_of(idx);
        let offset_y = self.scroll_state.offset().y;

        if item_top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: item_top });
            self.stick_to_bottom = false;
        } else if item_bottom > offset_y + self.viewport_height {
            let new_y = item_bottom
                .saturating_sub(self.viewport_height)
                .min(item_top);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
            self.stick_to_bottom = new_y >= self.max_scroll();
        }
    }

    /// Re-engage auto-scroll once the user scrolls back to the end.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Select the message above the current one, or the newest if none.
    pub fn select_previous(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let idx = self
            .selected_index
            .map(|i| i.saturating_sub(1))
            .unwrap_or(count - 1);
        self.selected_index = Some(idx);
        self.scroll_to_selected();
    }

    pub fn select_next(&mut self, count: usize) {
        if let Some(idx) = self.selected_index
            && idx + 1 < count
        {
            self.selected_index = Some(idx + 1);
            self.scroll_to_selected();
        }
    }
}

/// Scrollable conversation view, created fresh each frame.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [Message],
    pub revision: u64,
    pub spinner_frame: usize,
    pub images: &'a ImageCache,
    /// Backend base address; message image paths are resolved against it.
    pub base_url: &'a str,
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // scrollbar column

        // 1. Layout
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(self.messages.len(), content_width, self.revision);
        layout.heights.truncate(reusable);
        for message in self.messages.iter().skip(layout.heights.len()) {
            layout.heights.push(ChatMessage::calculate_height(message, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(self.messages, content_width, self.revision);

        let total_height = self.state.layout.total_height();

        // 2. Settle the offset first; the visible range depends on it
        self.state.viewport_height = area.height;
        if self.state.stick_to_bottom {
            let bottom = self.state.max_scroll();
            self.state.scroll_state.set_offset(Position { x: 0, y: bottom });
        } else {
            self.state.clamp_scroll();
        }
        let scroll_offset = self.state.scroll_state.offset().y;
        let visible = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Draw visible messages
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        for i in visible {
            let message = &self.messages[i];
            let height = self.state.layout.heights[i];
            let rect = Rect::new(0, self.state.layout.top_of(i), content_width, height);
            let image = message
                .image_url()
                .and_then(|path| self.images.get(&resolve_asset_url(self.base_url, path)));
            let is_selected = self.state.selected_index == Some(i);
            scroll_view.render_widget(
                ChatMessage::new(message, is_selected, self.spinner_frame, image),
                rect,
            );
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        // 4. "↓ New" indicator
        let offset = self.state.scroll_state.offset().y;
        self.state.has_unseen_content =
            !self.state.stick_to_bottom && offset < total_height.saturating_sub(area.height);
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached per-message heights for one content width.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    /// Running sum: `prefix_heights[i]` is the bottom edge of message `i`.
    pub prefix_heights: Vec<u16>,
    message_count: usize,
    content_width: u16,
    revision: u64,
    /// First message that was still loading when measured. It is the only
    /// one that can change in place.
    first_loading: Option<usize>,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_count: 0,
            content_width: 0,
            revision: 0,
            first_loading: None,
        }
    }

    /// How many cached heights are still valid for this frame.
    pub fn reusable_count(&self, message_count: usize, content_width: u16, revision: u64) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }
        if message_count < self.message_count {
            return 0;
        }
        let cached = self.heights.len().min(message_count);
        if revision == self.revision {
            return cached;
        }
        self.first_loading.map_or(cached, |i| i.min(cached))
    }

    pub fn update_metadata(&mut self, messages: &[Message], content_width: u16, revision: u64) {
        self.message_count = messages.len();
        self.content_width = content_width;
        self.revision = revision;
        self.first_loading = messages.iter().position(|m| m.loading);
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn top_of(&self, index: usize) -> u16 {
        match index {
            0 => 0,
            i => self.prefix_heights.get(i - 1).copied().unwrap_or(0),
        }
    }

    /// Messages overlapping the viewport, padded by half a screen each way.
    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self.prefix_heights.partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }

    /// Index of the message covering content row `y`.
    pub fn index_at(&self, y: u16) -> Option<usize> {
        let idx = self.prefix_heights.partition_point(|&end| end <= y);
        (idx < self.prefix_heights.len()).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::QueryResponse;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn cache_with(heights: Vec<u16>) -> LayoutCache {
        let mut cache = LayoutCache::new();
        cache.heights = heights;
        cache.rebuild_prefix_heights();
        cache
    }

    #[test]
    fn layout_cache_reuse_rules() {
        let messages = vec![Message::greeting(), Message::user("q".into())];
        let mut cache = cache_with(vec![4, 3]);
        cache.update_metadata(&messages, 80, 7);

        assert_eq!(cache.reusable_count(2, 80, 7), 2, "nothing changed");
        assert_eq!(cache.reusable_count(3, 80, 8), 2, "append keeps prior heights");
        assert_eq!(cache.reusable_count(2, 40, 7), 0, "width change");
        assert_eq!(cache.reusable_count(1, 80, 8), 0, "transcript shrank");
    }

    #[test]
    fn settled_placeholder_is_remeasured() {
        let placeholder = Message::placeholder();
        let messages = vec![Message::greeting(), Message::user("q".into()), placeholder.clone()];
        let mut cache = cache_with(vec![4, 3, 3]);
        cache.update_metadata(&messages, 80, 2);

        assert_eq!(cache.reusable_count(3, 80, 3), 2);

        let settled = vec![
            messages[0].clone(),
            messages[1].clone(),
            placeholder.resolved(&QueryResponse {
                table_output_verified: false,
                execution_result: "done".into(),
                image_url: None,
                analysis: None,
            }),
        ];
        cache.update_metadata(&settled, 80, 3);
        assert_eq!(cache.reusable_count(3, 80, 4), 3);
    }

    #[test]
    fn visible_range_and_hit_lookup() {
        let cache = cache_with(vec![5, 5, 5, 5, 5, 5]);
        assert_eq!(cache.visible_range(0, 4), 0..2);
        assert_eq!(cache.visible_range(20, 4), 3..6);
        assert_eq!(cache.index_at(0), Some(0));
        assert_eq!(cache.index_at(12), Some(2));
        assert_eq!(cache.index_at(30), None);
        assert_eq!(cache.top_of(3), 15);
    }

    #[test]
    fn scroll_up_unpins_and_scroll_to_end_repins() {
        let mut state = MessageListState::new();
        state.layout = cache_with(vec![10, 10]);
        state.viewport_height = 5;
        state.scroll_state.set_offset(Position { x: 0, y: 15 });

        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);

        state.scroll_state.set_offset(Position { x: 0, y: 15 });
        state.repin_if_at_bottom();
        assert!(state.stick_to_bottom);
    }

    #[test]
    fn selecting_scrolls_message_into_view() {
        let mut state = MessageListState::new();
        state.layout = cache_with(vec![10, 10, 10]);
        state.viewport_height = 5;
        state.scroll_state.set_offset(Position { x: 0, y: 25 });

        state.select_previous(3);
        assert_eq!(state.selected_index, Some(2));
        state.select_previous(3);
        assert_eq!(state.selected_index, Some(1));
        assert_eq!(state.scroll_state.offset().y, 10);
        assert!(!state.stick_to_bottom);

        state.select_next(3);
        state.select_next(3);
        assert_eq!(state.selected_index, Some(2));
    }

    #[test]
    fn renders_greeting_and_tracks_unseen_content() {
        let messages: Vec<Message> = std::iter::once(Message::greeting())
            .chain((0..10).map(|i| Message::user(format!("question {i}"))))
            .collect();
        let images = ImageCache::default();
        let mut state = MessageListState::new();
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();

        let draw = |state: &mut MessageListState, terminal: &mut Terminal<TestBackend>| {
            terminal
                .draw(|f| {
                    MessageList {
                        state: &mut *state,
                        messages: &messages,
                        revision: 1,
                        spinner_frame: 0,
                        images: &images,
                        base_url: "http://backend.test",
                    }
                    .render(f, f.area());
                })
                .unwrap();
        };

        draw(&mut state, &mut terminal);
        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("question 9"), "pinned view shows the newest message");
        assert!(!state.has_unseen_content);

        state.handle_event(&TuiEvent::ScrollPageUp);
        draw(&mut state, &mut terminal);
        assert!(state.has_unseen_content);
    }
}
