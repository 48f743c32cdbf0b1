use std::sync::Arc;

use assistant::{AssistantConfig, ChatAssistant, ProviderChain};
use db::DBService;

pub mod error;
pub mod middleware;
pub mod routes;

/// Shared handler state: the one assistant instance every chat turn goes
/// through.
#[derive(Clone)]
pub struct AppState {
    assistant: Arc<ChatAssistant>,
}

impl AppState {
    pub fn new(db: DBService, chain: ProviderChain, config: AssistantConfig) -> Self {
        let assistant = ChatAssistant::new(db.pool, chain, config);
        Self {
            assistant: Arc::new(assistant),
        }
    }

    pub fn assistant(&self) -> &Arc<ChatAssistant> {
        &self.assistant
    }
}
