//! # Application State
//!
//! Core state for the conversation controller. Domain data only; presentation
//! state (scroll offsets, decoded images, overlays) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── backend: Arc<dyn QueryBackend>  // analysis service client
//! ├── transcript: Transcript          // greeting + exchanges
//! ├── input: String                   // pending input buffer
//! ├── is_loading: bool                // single-flight guard
//! ├── show_suggestions: bool          // starter questions enabled
//! ├── status_message: String          // title bar text
//! └── revision: u64                   // bumped on every transcript change
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::api::{QueryBackend, resolve_asset_url};
use crate::core::message::Transcript;

pub struct App {
    pub backend: Arc<dyn QueryBackend>,
    pub transcript: Transcript,
    pub input: String,
    pub is_loading: bool,
    pub show_suggestions: bool,
    pub status_message: String,
    /// Monotonic counter the adapter watches to scroll to the newest message.
    pub revision: u64,
}

impl App {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            backend,
            transcript: Transcript::new(),
            input: String::new(),
            is_loading: false,
            show_suggestions: true,
            status_message: String::new(),
            revision: 0,
        }
    }

    /// Starter questions are shown only before the first exchange.
    pub fn suggestions_visible(&self) -> bool {
        self.show_suggestions && self.transcript.is_pristine()
    }

    /// Absolute URL for an image path returned by the backend.
    pub fn asset_url(&self, path: &str) -> String {
        resolve_asset_url(self.backend.base_url(), path)
    }

    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
