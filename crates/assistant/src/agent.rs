use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use db::models::chat_message::{ChatMessage, ChatRole};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    AssistantConfig, Result,
    brain::{CompletionConfig, ProviderChain},
    composer::{
        ChatReply, compose_answer, compose_clarification, compose_error, compose_result,
        compose_validation,
    },
    executor::ActionExecutor,
    language::{Language, classify},
    resolver::{IntentResolver, Resolution},
    session::SessionManager,
    store::{SqliteTaskStore, TaskStore},
};

/// Entry point for chat turns
pub struct ChatAssistant {
    config: AssistantConfig,
    session: SessionManager,
    resolver: IntentResolver,
    executor: ActionExecutor,
    owner_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ChatAssistant {
    pub fn new(pool: SqlitePool, chain: ProviderChain, config: AssistantConfig) -> Self {
        let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::new(pool.clone()));
        Self::with_store(pool, store, chain, config)
    }

    pub fn with_store(
        pool: SqlitePool,
        store: Arc<dyn TaskStore>,
        chain: ProviderChain,
        config: AssistantConfig,
    ) -> Self {
        tracing::info!(
            "[CHAT] Assistant ready: providers={:?}, window={}, per-owner serialization={}",
            chain.provider_names(),
            config.window_size,
            config.serialize_per_owner
        );

        let completion = CompletionConfig {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        Self {
            session: SessionManager::new(pool, config.max_message_chars),
            resolver: IntentResolver::new(
                chain,
                store.clone(),
                config.store_timeout(),
                completion,
                config.list_limit,
            ),
            executor: ActionExecutor::new(store, config.store_timeout()),
            owner_locks: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn has_configured_provider(&self) -> bool {
        self.resolver.chain().has_configured_provider()
    }

    async fn lock_owner(&self, owner: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.config.serialize_per_owner {
            return None;
        }
        let lock = self
            .owner_locks
            .entry(owner.to_string())
            .or_default()
            .clone();
        Some(lock.lock_owned().await)
    }

    fn release_owner(&self, owner: &str, guard: Option<OwnedMutexGuard<()>>) {
        if guard.is_some() {
            drop(guard);
            // Only the map still holds the lock: nobody is waiting on it
            self.owner_locks
                .remove_if(owner, |_, lock| Arc::strong_count(lock) == 1);
        }
    }

    /// One chat turn. Provider and task store failures come back as
    /// localized replies; only a failing chat log is an `Err`.
    pub async fn handle_message(
        &self,
        owner: &str,
        text: &str,
        language_hint: Option<Language>,
    ) -> Result<ChatReply> {
        let language = classify(text, language_hint);

        if let Err(invalid) = self.session.validate(text) {
            tracing::info!("[CHAT] Rejected message: {}", invalid);
            return Ok(compose_validation(&invalid, language));
        }

        let guard = self.lock_owner(owner).await;
        let result = self.run_turn(owner, text, language).await;
        self.release_owner(owner, guard);
        result
    }

    async fn run_turn(&self, owner: &str, text: &str, language: Language) -> Result<ChatReply> {
        let window = self
            .session
            .recent_window(owner, self.config.window_size)
            .await?;
        self.session.append(owner, ChatRole::User, text).await?;

        tracing::info!(
            "[CHAT] Turn started: language={}, history={}",
            language,
            window.len()
        );

        let reply = match self
            .resolver
            .resolve(owner, &window, text, language, Utc::now())
            .await
        {
            Ok(Resolution::Answer(answer)) => compose_answer(answer),
            Ok(Resolution::Clarify(clarification)) => {
                compose_clarification(&clarification, language)
            }
            Ok(Resolution::Action(request)) => {
                let result = self.executor.execute(owner, request).await;
                compose_result(&result, language)
            }
            Err(e) => {
                tracing::warn!("[CHAT] Turn failed: {}", e);
                compose_error(e.kind(), language)
            }
        };

        self.session.append_reply(owner, &reply.response).await?;
        tracing::info!(
            "[CHAT] Turn finished: action_performed={}",
            reply.action_performed
        );
        Ok(reply)
    }

    pub async fn get_history(&self, owner: &str) -> Result<Vec<ChatMessage>> {
        self.session.history(owner).await
    }

    pub async fn clear_history(&self, owner: &str) -> Result<u64> {
        let guard = self.lock_owner(owner).await;
        let result = self.session.clear(owner).await;
        self.release_owner(owner, guard);
        result
    }
}
