//! # Actions
//!
//! Everything that can happen to the conversation becomes an `Action`.
//! User presses Enter? That's `Action::Submit`.
//! Backend answers? That's `Action::QuerySucceeded { .. }`.
//!
//! The `update()` function applies an action to the state and returns an
//! `Effect` describing any I/O the adapter must perform. No side effects here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! The single suspension point, the backend call, is `perform_query()`: the
//! adapter runs it on a task and feeds the resulting action back in.

use log::{debug, info, warn};

use crate::api::{QueryBackend, QueryResponse};
use crate::core::message::{Message, Transcript};
use crate::core::state::App;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The input widget's text changed.
    InputChanged(String),
    /// A starter question was picked. Fills the input, never submits.
    SelectSuggestion(String),
    /// Send the pending input.
    Submit,
    QuerySucceeded {
        message_id: String,
        response: QueryResponse,
    },
    QueryFailed {
        message_id: String,
        reason: String,
    },
    /// Clear Chat.
    Reset,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Issue exactly one backend request for `question`, settling `message_id`.
    SpawnQuery { message_id: String, question: String },
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::InputChanged(text) => {
            app.input = text;
            Effect::None
        }
        Action::SelectSuggestion(text) => {
            debug!("Suggestion selected: {}", text);
            app.input = text;
            Effect::None
        }
        Action::Submit => submit(app),
        Action::QuerySucceeded {
            message_id,
            response,
        } => {
            let found = app
                .transcript
                .replace(&message_id, |placeholder| placeholder.resolved(&response));
            settle(app, &message_id, found);
            if found {
                app.status_message.clear();
            }
            Effect::None
        }
        Action::QueryFailed { message_id, reason } => {
            warn!("Query {} failed: {}", message_id, reason);
            let found = app
                .transcript
                .replace(&message_id, |placeholder| placeholder.failed());
            settle(app, &message_id, found);
            if found {
                app.status_message = "Request failed".to_string();
            }
            Effect::None
        }
        Action::Reset => {
            info!("Clearing chat ({} messages)", app.transcript.len());
            app.transcript = Transcript::new();
            app.show_suggestions = true;
            app.status_message.clear();
            app.touch();
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

fn submit(app: &mut App) -> Effect {
    if app.input.trim().is_empty() {
        return Effect::None;
    }
    if app.is_loading {
        debug!("Submit ignored: request already in flight");
        return Effect::None;
    }

    let question = std::mem::take(&mut app.input);
    let placeholder = Message::placeholder();
    let message_id = placeholder.id.clone();

    app.show_suggestions = false;
    app.transcript.push(Message::user(question.clone()));
    app.transcript.push(placeholder);
    app.is_loading = true;
    app.status_message = "Analyzing...".to_string();
    app.touch();

    info!("Submitting question (placeholder {})", message_id);
    Effect::SpawnQuery {
        message_id,
        question,
    }
}

/// The in-flight flag drops whenever a call settles, even if the placeholder
/// was discarded by a reset in the meantime.
fn settle(app: &mut App, message_id: &str, found: bool) {
    app.is_loading = false;
    if found {
        app.touch();
    } else {
        debug!("Dropping late result for {}: transcript was reset", message_id);
    }
}

/// Await one backend call and turn its outcome into the settling action.
pub async fn perform_query(
    backend: &dyn QueryBackend,
    message_id: String,
    question: String,
) -> Action {
    match backend.query(&question).await {
        Ok(response) => Action::QuerySucceeded {
            message_id,
            response,
        },
        Err(e) => Action::QueryFailed {
            message_id,
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BackendError;
    use crate::core::message::{Body, Role};
    use crate::core::suggestions::SUGGESTED_QUESTIONS;
    use crate::test_support::{ScriptedBackend, test_app};

    fn submit_text(app: &mut App, text: &str) -> Effect {
        update(app, Action::InputChanged(text.to_string()));
        update(app, Action::Submit)
    }

    fn spawned_id(effect: &Effect) -> String {
        match effect {
            Effect::SpawnQuery { message_id, .. } => message_id.clone(),
            other => panic!("expected SpawnQuery, got {:?}", other),
        }
    }

    #[test]
    fn submit_appends_user_and_placeholder() {
        let mut app = test_app();
        let effect = submit_text(&mut app, "How many rows?");

        assert_eq!(app.transcript.len(), 3);
        let user = &app.transcript.messages()[1];
        let placeholder = &app.transcript.messages()[2];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "How many rows?");
        assert_eq!(placeholder.role, Role::Assistant);
        assert!(placeholder.loading);
        assert!(app.is_loading);
        assert!(app.input.is_empty());
        assert_eq!(
            effect,
            Effect::SpawnQuery {
                message_id: placeholder.id.clone(),
                question: "How many rows?".to_string(),
            }
        );
    }

    #[test]
    fn blank_submit_is_ignored() {
        let mut app = test_app();
        for blank in ["", "   ", "\t\n"] {
            assert_eq!(submit_text(&mut app, blank), Effect::None);
        }
        assert_eq!(app.transcript.len(), 1);
        assert!(!app.is_loading);
        assert_eq!(app.revision, 0);
    }

    #[test]
    fn submit_while_loading_has_no_effect() {
        let mut app = test_app();
        submit_text(&mut app, "first");
        let len = app.transcript.len();
        let revision = app.revision;

        let effect = submit_text(&mut app, "second");

        assert_eq!(effect, Effect::None);
        assert_eq!(app.transcript.len(), len);
        assert_eq!(app.revision, revision);
        // The rejected text stays in the input buffer
        assert_eq!(app.input, "second");
    }

    #[test]
    fn success_replaces_placeholder_in_place() {
        let mut app = test_app();
        let id = spawned_id(&submit_text(&mut app, "What are the top 5 most purchased items?"));

        update(
            &mut app,
            Action::QuerySucceeded {
                message_id: id.clone(),
                response: QueryResponse {
                    table_output_verified: false,
                    execution_result: "There are 5 items...".into(),
                    image_url: None,
                    analysis: None,
                },
            },
        );

        let answer = app.transcript.get(&id).unwrap();
        assert_eq!(answer.content, "There are 5 items...");
        assert!(!answer.loading);
        assert!(!answer.error);
        assert_eq!(answer.image_url, None);
        assert_eq!(answer.analysis_note, None);
        assert_eq!(app.transcript.len(), 3);
        assert!(!app.is_loading);
    }

    #[test]
    fn failure_marks_placeholder_errored() {
        let mut app = test_app();
        let id = spawned_id(&submit_text(&mut app, "q"));

        update(
            &mut app,
            Action::QueryFailed {
                message_id: id.clone(),
                reason: "network error: refused".into(),
            },
        );

        let answer = app.transcript.get(&id).unwrap();
        assert!(answer.error);
        assert!(!answer.loading);
        assert_eq!(answer.content, "");
        assert_eq!(answer.body(), Body::Error);
        assert!(!app.is_loading);
    }

    #[test]
    fn settled_message_is_error_xor_content() {
        let mut app = test_app();
        let ok = spawned_id(&submit_text(&mut app, "a"));
        update(
            &mut app,
            Action::QuerySucceeded {
                message_id: ok.clone(),
                response: QueryResponse {
                    table_output_verified: false,
                    execution_result: "answer".into(),
                    image_url: None,
                    analysis: None,
                },
            },
        );
        let bad = spawned_id(&submit_text(&mut app, "b"));
        update(
            &mut app,
            Action::QueryFailed {
                message_id: bad.clone(),
                reason: "timeout".into(),
            },
        );

        for id in [ok, bad] {
            let m = app.transcript.get(&id).unwrap();
            assert!(!m.loading);
            assert!(m.error != !m.content.is_empty());
        }
    }

    #[test]
    fn reset_restores_single_greeting_and_suggestions() {
        let mut app = test_app();
        submit_text(&mut app, "q");
        assert!(!app.suggestions_visible());

        update(&mut app, Action::Reset);

        assert_eq!(app.transcript.len(), 1);
        let greeting = &app.transcript.messages()[0];
        assert!(!greeting.loading);
        assert!(!greeting.error);
        assert!(app.suggestions_visible());
    }

    #[test]
    fn late_result_after_reset_only_clears_loading() {
        let mut app = test_app();
        let id = spawned_id(&submit_text(&mut app, "q"));
        update(&mut app, Action::Reset);
        assert!(app.is_loading, "reset does not cancel the in-flight request");

        update(
            &mut app,
            Action::QueryFailed {
                message_id: id,
                reason: "late".into(),
            },
        );

        assert!(!app.is_loading);
        assert_eq!(app.transcript.len(), 1);
        assert!(!app.transcript.messages()[0].error);
    }

    #[test]
    fn select_suggestion_only_fills_input() {
        let mut app = test_app();
        let before = app.transcript.clone();

        let effect = update(
            &mut app,
            Action::SelectSuggestion(SUGGESTED_QUESTIONS[2].to_string()),
        );

        assert_eq!(effect, Effect::None);
        assert_eq!(app.input, SUGGESTED_QUESTIONS[2]);
        assert_eq!(app.transcript, before);
        assert!(!app.is_loading);
    }

    #[test]
    fn every_transcript_change_bumps_revision() {
        let mut app = test_app();
        let r0 = app.revision;
        let id = spawned_id(&submit_text(&mut app, "q"));
        let r1 = app.revision;
        assert!(r1 > r0);
        update(
            &mut app,
            Action::QueryFailed {
                message_id: id,
                reason: "x".into(),
            },
        );
        assert!(app.revision > r1);
        let r2 = app.revision;
        update(&mut app, Action::InputChanged("typing".into()));
        assert_eq!(app.revision, r2);
    }

    #[test]
    fn quit_returns_quit_effect() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }

    #[tokio::test]
    async fn perform_query_maps_success() {
        let backend = ScriptedBackend::answering(QueryResponse {
            table_output_verified: true,
            execution_result: "<table><tr><td>1</td></tr></table>".into(),
            image_url: None,
            analysis: None,
        });
        let action = perform_query(&backend, "m1".into(), "q".into()).await;
        match action {
            Action::QuerySucceeded { message_id, response } => {
                assert_eq!(message_id, "m1");
                assert!(response.table_output_verified);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(backend.questions(), vec!["q".to_string()]);
    }

    #[tokio::test]
    async fn perform_query_maps_failure() {
        let backend = ScriptedBackend::failing(BackendError::Network("refused".into()));
        let action = perform_query(&backend, "m1".into(), "q".into()).await;
        assert_eq!(
            action,
            Action::QueryFailed {
                message_id: "m1".into(),
                reason: "network error: refused".into(),
            }
        );
    }
}
