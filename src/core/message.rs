//! # Messages and the Transcript
//!
//! A `Message` is one entry in the conversation. User messages are created
//! complete. Assistant answers start life as a *placeholder* (`loading`) and
//! are replaced exactly once, by id, when the backend call settles.
//!
//! ```text
//! placeholder ──QuerySucceeded──► terminal (content / table / image / analysis)
//!      │
//!      └──────QueryFailed───────► terminal (error)
//! ```

use crate::api::QueryResponse;

pub const GREETING: &str = "Hello! I'm your data analysis assistant. \
    Ask me questions about your dataset and I'll help you analyze it.";

pub const ERROR_NOTICE: &str =
    "An error occurred while processing your request. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// How a message body should be drawn. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    /// Waiting on the backend.
    Loading,
    /// The request failed; show the fixed notice.
    Error,
    /// Backend-verified table markup, trusted and drawn as a grid.
    TableMarkup,
    /// Everything else: markdown, raw HTML shown literally.
    FormattedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Unique, immutable. Only used to find a placeholder again.
    pub id: String,
    pub role: Role,
    pub content: String,
    pub loading: bool,
    pub error: bool,
    pub is_table_markup: bool,
    pub image_url: Option<String>,
    pub analysis_note: Option<String>,
}

pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// True when the trimmed text opens with a `<table` tag and closes with `</table>`.
pub fn looks_like_table(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.starts_with("<table") && trimmed.ends_with("</table>")
}

impl Message {
    fn blank(role: Role) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: String::new(),
            loading: false,
            error: false,
            is_table_markup: false,
            image_url: None,
            analysis_note: None,
        }
    }

    pub fn greeting() -> Self {
        Self {
            content: GREETING.to_string(),
            ..Self::blank(Role::Assistant)
        }
    }

    pub fn user(content: String) -> Self {
        Self {
            content,
            ..Self::blank(Role::User)
        }
    }

    pub fn placeholder() -> Self {
        Self {
            loading: true,
            ..Self::blank(Role::Assistant)
        }
    }

    /// Terminal form of a placeholder after a successful response.
    pub fn resolved(&self, response: &QueryResponse) -> Self {
        Self {
            id: self.id.clone(),
            role: self.role,
            content: response.execution_result.clone(),
            loading: false,
            error: false,
            is_table_markup: response.table_output_verified,
            image_url: response.image_url().map(str::to_string),
            analysis_note: response.analysis().map(str::to_string),
        }
    }

    /// Terminal form of a placeholder after a failed request. Content stays empty.
    pub fn failed(&self) -> Self {
        Self {
            loading: false,
            error: true,
            ..self.clone()
        }
    }

    /// Both the verified flag and the textual check must agree before the
    /// content is treated as markup.
    pub fn body(&self) -> Body {
        if self.loading {
            Body::Loading
        } else if self.error {
            Body::Error
        } else if self.is_table_markup && looks_like_table(&self.content) {
            Body::TableMarkup
        } else {
            Body::FormattedText
        }
    }

    /// Image and analysis are only shown alongside a settled, successful body.
    pub fn has_attachments(&self) -> bool {
        !self.loading && !self.error
    }

    pub fn image_url(&self) -> Option<&str> {
        self.has_attachments()
            .then_some(self.image_url.as_deref())
            .flatten()
    }

    pub fn analysis_note(&self) -> Option<&str> {
        self.has_attachments()
            .then_some(self.analysis_note.as_deref())
            .flatten()
    }
}

/// Ordered conversation. Insertion order is chronological; index 0 is always
/// the greeting.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

// Never empty: the greeting is always present.
#[allow(clippy::len_without_is_empty)]
impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::greeting()],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// No exchange has happened yet: only the greeting is present.
    pub fn is_pristine(&self) -> bool {
        self.messages.len() == 1
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Replace the message with `id` by `f(old)`. Returns false if no such message exists.
    pub fn replace(&mut self, id: &str, f: impl FnOnce(&Message) -> Message) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(slot) => {
                let next = f(slot);
                debug_assert_eq!(next.id, slot.id);
                *slot = next;
                true
            }
            None => false,
        }
    }
}
