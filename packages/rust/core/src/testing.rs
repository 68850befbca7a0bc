//! Scripted in-memory gateway and temp-dir helpers for tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use contentagent_gateway::Gateway;
use contentagent_shared::{ContentAgentError, Result};
use contentagent_storage::ArtifactStore;

/// Replays canned responses in order and records every prompt it receives.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Gateway for ScriptedGateway {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ContentAgentError::gateway("script exhausted"))
    }
}

pub fn temp_store() -> (PathBuf, ArtifactStore) {
    let dir = std::env::temp_dir().join(format!(
        "contentagent-core-test-{}",
        uuid::Uuid::now_v7()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let store = ArtifactStore::new(&dir);
    (dir, store)
}
