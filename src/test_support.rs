//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{BackendError, QueryBackend, QueryResponse};

/// A backend that returns one canned outcome and records every question.
pub struct ScriptedBackend {
    outcome: Result<QueryResponse, BackendError>,
    asset: Result<Vec<u8>, BackendError>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn answering(response: QueryResponse) -> Self {
        Self {
            outcome: Ok(response),
            asset: Ok(Vec::new()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            outcome: Err(error.clone()),
            asset: Err(error),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl QueryBackend for ScriptedBackend {
    fn base_url(&self) -> &str {
        "http://backend.test"
    }

    async fn query(&self, question: &str) -> Result<QueryResponse, BackendError> {
        if let Ok(mut q) = self.questions.lock() {
            q.push(question.to_string());
        }
        self.outcome.clone()
    }

    async fn fetch_asset(&self, _url: &str) -> Result<Vec<u8>, BackendError> {
        self.asset.clone()
    }
}

/// Creates a test App whose backend fails every call.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(ScriptedBackend::failing(
        BackendError::Network("test backend".to_string()),
    )))
}
