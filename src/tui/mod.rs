//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard and mouse events into core `Action` values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Background work
//!
//! Three kinds of work leave the event loop: the backend query, chart
//! fetch+decode for inline previews, and chart downloads. Each runs on a
//! tokio task and reports back over one `mpsc` channel as a [`TaskEvent`].
//! The loop is the only owner of `App` and `TuiState`.
//!
//! ## Redraw Strategy
//!
//! - **Loading**: draws every ~80ms so the dots animate.
//! - **Idle**: sleeps up to 500ms, only redraws on events, task results,
//!   or terminal resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

mod component;
mod components;
mod event;
pub mod image;
pub mod markdown;
pub mod table;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use ::image::DynamicImage;
use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui_image::picker::Picker;

use crate::api::{HttpBackend, QueryBackend};
use crate::core::action::{Action, Effect, perform_query, update};
use crate::core::config::ResolvedConfig;
use crate::core::download::save_visualization;
use crate::core::state::App;
use crate::core::suggestions::SUGGESTED_QUESTIONS;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    ImageOverlayState, InputBox, InputEvent, MessageListState, OverlayEvent, SuggestionsState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::image::{FALLBACK_FONT_SIZE, ImageCache, decode_image};

/// Modal input mode: determines how keyboard events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigate messages with arrow keys; `d`/`e` act on charts.
    /// Other typing auto-switches to Input.
    Cursor,
    /// Text editing in the input box. Esc switches to Cursor.
    Input,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub suggestions: SuggestionsState,
    pub input_mode: InputMode,
    /// Decoded charts keyed by resolved URL.
    pub images: ImageCache,
    /// Expanded chart (None = hidden)
    pub overlay: Option<ImageOverlayState>,
    /// Last `App::revision` the view reacted to.
    pub last_seen_revision: u64,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            suggestions: SuggestionsState::new(&SUGGESTED_QUESTIONS),
            input_mode: InputMode::Input, // User expects to type immediately
            images: ImageCache::default(),
            overlay: None,
            last_seen_revision: 0,
        }
    }

    /// Drop all view state tied to the old transcript.
    fn reset_view(&mut self) {
        self.message_list = MessageListState::new();
        self.overlay = None;
        self.images.clear();
        self.suggestions.clear_selection();
        self.input_mode = InputMode::Input;
    }
}

/// Results delivered to the event loop by background tasks.
#[derive(Debug)]
enum TaskEvent {
    /// A settled backend call, already expressed as a core action.
    Core(Action),
    ImageReady { url: String, image: DynamicImage },
    ImageFailed { url: String },
    Saved(PathBuf),
}

/// I/O the loop must start after handling an event.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Query { message_id: String, question: String },
    Download(String),
    Quit,
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // DISAMBIGUATE_ESCAPE_CODES makes a lone Esc arrive without delay.
        // Terminals without the protocol ignore it.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let backend = HttpBackend::new(config.backend_url.clone(), config.request_timeout)
        .map_err(|e| {
            warn!("Could not build backend client: {}", e);
            std::io::Error::other(e.to_string())
        })?;
    info!(
        "Backend {} (timeout {}s), downloads to {}",
        config.backend_url,
        config.request_timeout.as_secs(),
        config.download_dir.display()
    );
    let mut app = App::new(Arc::new(backend));
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Must run before the loop starts reading events
    let picker = Picker::from_query_stdio().unwrap_or_else(|e| {
        warn!("Terminal graphics query failed, using half-blocks: {:?}", e);
        Picker::from_fontsize(FALLBACK_FONT_SIZE)
    });
    info!("Chart protocol: {:?}", picker.protocol_type());
    tui.images = ImageCache::new(picker);

    let (tx, rx) = mpsc::channel::<TaskEvent>();

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame
    let mut should_quit = false;

    while !should_quit {
        sync_input(&app, &mut tui);
        follow_revision(&app, &mut tui);
        ensure_images(&app, &mut tui, &tx);

        let animating = app.is_loading;
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 4.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let screen = terminal.get_frame().area();
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match handle_event(&mut app, &mut tui, event, screen) {
                Some(Command::Quit) => {
                    should_quit = true;
                    break;
                }
                Some(command) => execute_command(&app, command, &config.download_dir, &tx),
                None => {}
            }
        }

        while let Ok(task_event) = rx.try_recv() {
            needs_redraw = true;
            match task_event {
                TaskEvent::Core(action) => {
                    debug!("Event loop received: {:?}", action);
                    if let Some(command) = dispatch(&mut app, action) {
                        execute_command(&app, command, &config.download_dir, &tx);
                    }
                }
                TaskEvent::ImageReady { url, image } => tui.images.finish(url, image),
                TaskEvent::ImageFailed { url } => tui.images.fail(url),
                TaskEvent::Saved(path) => {
                    app.status_message = format!("Saved {}", path.display());
                }
            }
        }
    }

    ratatui::restore();
    Ok(())
}

/// Apply an action and translate its effect into a command.
fn dispatch(app: &mut App, action: Action) -> Option<Command> {
    match update(app, action) {
        Effect::None => None,
        Effect::SpawnQuery {
            message_id,
            question,
        } => Some(Command::Query {
            message_id,
            question,
        }),
        Effect::Quit => Some(Command::Quit),
    }
}

fn execute_command(app: &App, command: Command, download_dir: &Path, tx: &mpsc::Sender<TaskEvent>) {
    match command {
        Command::Query {
            message_id,
            question,
        } => spawn_query(app.backend.clone(), message_id, question, tx.clone()),
        Command::Download(url) => spawn_download(
            app.backend.clone(),
            url,
            download_dir.to_path_buf(),
            tx.clone(),
        ),
        Command::Quit => {}
    }
}

/// Mirror core input state into the input box before it sees an event.
fn sync_input(app: &App, tui: &mut TuiState) {
    tui.input_box.sync_from(&app.input);
    tui.input_box.disabled = app.is_loading;
    tui.input_box.focused = tui.input_mode == InputMode::Input && tui.overlay.is_none();
}

/// Re-pin the message list to the newest message whenever the transcript changed.
fn follow_revision(app: &App, tui: &mut TuiState) {
    if app.revision != tui.last_seen_revision {
        tui.last_seen_revision = app.revision;
        tui.message_list.stick_to_bottom = true;
    }
}

/// Route one terminal event. Returns the I/O to start, if any.
fn handle_event(app: &mut App, tui: &mut TuiState, event: TuiEvent, screen: Rect) -> Option<Command> {
    sync_input(app, tui);

    match event {
        TuiEvent::Resize => return None,
        TuiEvent::ForceQuit => return dispatch(app, Action::Quit),
        TuiEvent::ClearChat => {
            tui.reset_view();
            return dispatch(app, Action::Reset);
        }
        _ => {}
    }

    // The overlay is modal
    if let Some(overlay) = &tui.overlay {
        return match overlay.handle_event(&event, screen) {
            Some(OverlayEvent::Close) => {
                tui.overlay = None;
                None
            }
            Some(OverlayEvent::Download) => Some(Command::Download(overlay.url.clone())),
            None => None,
        };
    }

    let layout = ui::screen_layout(screen, ui::suggestion_rows(app, tui));
    let scroll_offset = tui.message_list.scroll_state.offset().y;

    match event {
        TuiEvent::MouseMove(_, row) => {
            if let Some(idx) =
                ui::hit_test_message(row, layout.messages, scroll_offset, &tui.message_list.layout)
            {
                tui.message_list.selected_index = Some(idx);
            }
            return None;
        }
        TuiEvent::MouseClick(col, row) => {
            if app.suggestions_visible()
                && let Some(question) = tui.suggestions.handle_event(&event)
            {
                tui.input_mode = InputMode::Input;
                return dispatch(app, Action::SelectSuggestion(question));
            }
            if layout.input.contains((col, row).into()) {
                tui.input_mode = InputMode::Input;
                return None;
            }
            if let Some(idx) =
                ui::hit_test_message(row, layout.messages, scroll_offset, &tui.message_list.layout)
            {
                tui.message_list.selected_index = Some(idx);
                tui.input_mode = InputMode::Cursor;
            }
            return None;
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.message_list.handle_event(&event);
            return None;
        }
        TuiEvent::NextSuggestion | TuiEvent::PrevSuggestion => {
            if app.suggestions_visible()
                && let Some(question) = tui.suggestions.handle_event(&event)
            {
                tui.input_mode = InputMode::Input;
                return dispatch(app, Action::SelectSuggestion(question));
            }
            return None;
        }
        _ => {}
    }

    let count = app.transcript.len();
    match tui.input_mode {
        InputMode::Input => {
            if matches!(event, TuiEvent::Escape) {
                tui.input_mode = InputMode::Cursor;
                tui.message_list.selected_index = count.checked_sub(1);
                tui.message_list.scroll_to_selected();
                return None;
            }
            input_box_event(app, tui, &event)
        }
        InputMode::Cursor => match event {
            TuiEvent::Escape => None,
            TuiEvent::CursorUp => {
                tui.message_list.select_previous(count);
                None
            }
            TuiEvent::CursorDown => {
                tui.message_list.select_next(count);
                None
            }
            TuiEvent::InputChar('d') if target_image(app, tui).is_some() => {
                target_image(app, tui).map(Command::Download)
            }
            TuiEvent::InputChar('e' | ' ') if target_image(app, tui).is_some() => {
                tui.overlay = target_image(app, tui).map(ImageOverlayState::new);
                None
            }
            TuiEvent::Submit => {
                tui.input_mode = InputMode::Input;
                tui.message_list.selected_index = None;
                None
            }
            TuiEvent::InputChar(_) | TuiEvent::Paste(_) => {
                tui.input_mode = InputMode::Input;
                tui.message_list.selected_index = None;
                input_box_event(app, tui, &event)
            }
            _ => None,
        },
    }
}

fn input_box_event(app: &mut App, tui: &mut TuiState, event: &TuiEvent) -> Option<Command> {
    match tui.input_box.handle_event(event)? {
        InputEvent::Changed(text) => dispatch(app, Action::InputChanged(text)),
        InputEvent::Submit => dispatch(app, Action::Submit),
    }
}

/// Chart the `d`/`e` keys act on: the selected message's, else the newest.
fn target_image(app: &App, tui: &TuiState) -> Option<String> {
    let messages = app.transcript.messages();
    let path = match tui.message_list.selected_index {
        Some(idx) => messages.get(idx).and_then(|m| m.image_url()),
        None => messages.iter().rev().find_map(|m| m.image_url()),
    }?;
    Some(app.asset_url(path))
}

/// Start a fetch for every chart in the transcript that is not cached yet.
fn ensure_images(app: &App, tui: &mut TuiState, tx: &mpsc::Sender<TaskEvent>) {
    for message in app.transcript.messages() {
        if let Some(path) = message.image_url() {
            let url = app.asset_url(path);
            if tui.images.begin(&url) {
                spawn_image_fetch(app.backend.clone(), url, tx.clone());
            }
        }
    }
}

fn spawn_query(
    backend: Arc<dyn QueryBackend>,
    message_id: String,
    question: String,
    tx: mpsc::Sender<TaskEvent>,
) {
    info!("Spawning query for {}", message_id);
    tokio::spawn(async move {
        let action = perform_query(backend.as_ref(), message_id, question).await;
        if tx.send(TaskEvent::Core(action)).is_err() {
            warn!("Failed to deliver query result: receiver dropped");
        }
    });
}

fn spawn_image_fetch(backend: Arc<dyn QueryBackend>, url: String, tx: mpsc::Sender<TaskEvent>) {
    debug!("Fetching chart {}", url);
    tokio::spawn(async move {
        let decoded = match backend.fetch_asset(&url).await {
            Ok(bytes) => match tokio::task::spawn_blocking(move || decode_image(&bytes)).await {
                Ok(Ok(image)) => Some(image),
                Ok(Err(e)) => {
                    warn!("Chart {} did not decode: {}", url, e);
                    None
                }
                Err(e) => {
                    warn!("Chart decode task failed for {}: {}", url, e);
                    None
                }
            },
            Err(e) => {
                warn!("Chart {} could not be fetched: {}", url, e);
                None
            }
        };
        let event = match decoded {
            Some(image) => TaskEvent::ImageReady { url, image },
            None => TaskEvent::ImageFailed { url },
        };
        if tx.send(event).is_err() {
            warn!("Failed to deliver chart: receiver dropped");
        }
    });
}

/// Download failures are logged only; the user sees nothing.
fn spawn_download(
    backend: Arc<dyn QueryBackend>,
    url: String,
    dir: PathBuf,
    tx: mpsc::Sender<TaskEvent>,
) {
    info!("Downloading chart {}", url);
    tokio::spawn(async move {
        let bytes = match backend.fetch_asset(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Download of {} failed: {}", url, e);
                return;
            }
        };
        match tokio::task::spawn_blocking(move || save_visualization(&dir, &bytes)).await {
            Ok(Ok(path)) => {
                info!("Saved chart to {}", path.display());
                if tx.send(TaskEvent::Saved(path)).is_err() {
                    warn!("Failed to report saved chart: receiver dropped");
                }
            }
            Ok(Err(e)) => warn!("Could not save chart from {}: {}", url, e),
            Err(e) => warn!("Save task failed for {}: {}", url, e),
        }
    });
}
