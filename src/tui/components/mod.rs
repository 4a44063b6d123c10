//! # TUI Components
//!
//! Every piece of the screen, each in its own file with its state, events,
//! rendering and tests.
//!
//! ## Two kinds of component
//!
//! **Props-only**, created per frame from borrowed data:
//! - `TitleBar`: app name, status, "↓ New"
//! - `ChatMessage`: one transcript entry (body, chart, analysis callout)
//! - `ImagePreview` / `ImageOverlay`: inline and expanded chart
//!
//! **Stateful**, with a persistent `*State` in `TuiState` plus a per-frame
//! wrapper that borrows it:
//! - `MessageList` / `MessageListState`: scrolling and layout cache
//! - `Suggestions` / `SuggestionsState`: starter questions
//! - `InputBox`: the question field (owns its cursor, mirrors `App::input`)
//!
//! Components never reach into `App`; the event loop passes what they need
//! as props and turns their events into core `Action`s.
//!
//! ```text
//! components/
//! ├── title_bar.rs
//! ├── message.rs        ChatMessage
//! ├── message_list.rs
//! ├── suggestions.rs
//! ├── image_viewer.rs   ImagePreview, ImageOverlay
//! └── input_box/        InputBox + cursor
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod image_viewer;
pub mod input_box;
pub mod message;
pub mod message_list;
pub mod suggestions;

pub use image_viewer::{ImageOverlay, ImageOverlayState, OverlayEvent};
pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use suggestions::{Suggestions, SuggestionsState};
