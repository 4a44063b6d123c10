//! # Core Application Logic
//!
//! The conversation controller. It knows nothing about any specific UI
//! technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Message / Transcript │
//!                    │  • App (state)          │
//!                    │  • Action + update()    │
//!                    │                         │
//!                    │  No UI. I/O as Effects. │
//!                    └───────────┬─────────────┘
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           ┌────────────┐              ┌────────────┐
//!           │    TUI     │              │    API     │
//!           │  Adapter   │              │  (reqwest) │
//!           │ (ratatui)  │              │            │
//!           └────────────┘              └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: `Message`, `Transcript`, and display-mode selection
//! - [`state`]: The `App` struct, all controller state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`config`]: Layered configuration
//! - [`download`]: Saving chart images to disk
//! - [`suggestions`]: Starter questions

pub mod action;
pub mod config;
pub mod download;
pub mod message;
pub mod state;
pub mod suggestions;
