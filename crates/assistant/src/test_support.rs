//! Shared doubles for the assistant tests

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use db::{
    DBService,
    models::task::{CreateTask, Task, TaskError, TaskStatusFilter, UpdateTask},
};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    AssistantConfig, ChatAssistant, ProviderChain,
    brain::{Completion, CompletionProvider, CompletionRequest, ProviderError},
    store::TaskStore,
};

pub async fn setup_pool() -> SqlitePool {
    DBService::new_in_memory()
        .await
        .expect("failed to create in-memory database")
        .pool
}

/// One scripted provider reply
pub enum Step {
    Answer(&'static str),
    Action(&'static str, Value),
    Fail(fn() -> ProviderError),
    Hang,
}

/// Replays steps in order; an exhausted script fails like an outage.
pub struct ScriptedProvider {
    name: &'static str,
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name,
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Answer(text)) => Ok(Completion::Answer {
                text: text.to_string(),
            }),
            Some(Step::Action(name, arguments)) => Ok(Completion::Action {
                name: name.to_string(),
                arguments,
            }),
            Some(Step::Fail(error)) => Err(error()),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ProviderError::Timeout(30_000))
            }
            None => Err(ProviderError::NotAvailable("script exhausted".into())),
        }
    }
}

pub fn chain(providers: &[Arc<ScriptedProvider>], timeout: Duration) -> ProviderChain {
    ProviderChain::new(
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn CompletionProvider>)
            .collect(),
        timeout,
    )
}

pub fn test_config() -> AssistantConfig {
    AssistantConfig {
        provider_timeout_secs: 1,
        store_timeout_secs: 1,
        ..AssistantConfig::default()
    }
}

pub fn assistant(pool: &SqlitePool, providers: &[Arc<ScriptedProvider>]) -> ChatAssistant {
    let config = test_config();
    ChatAssistant::new(
        pool.clone(),
        chain(providers, config.provider_timeout()),
        config,
    )
}

/// Store whose every call fails with an I/O style error.
pub struct FailingStore {
    pub calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn fail<T>(&self) -> Result<T, TaskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TaskError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[async_trait]
impl TaskStore for FailingStore {
    async fn create_task(&self, _: &str, _: &CreateTask) -> Result<Task, TaskError> {
        self.fail()
    }

    async fn list_tasks(
        &self,
        _: &str,
        _: TaskStatusFilter,
        _: i64,
    ) -> Result<Vec<Task>, TaskError> {
        self.fail()
    }

    async fn find_by_title(&self, _: &str, _: &str) -> Result<Vec<Task>, TaskError> {
        self.fail()
    }

    async fn update_task(&self, _: &str, _: i64, _: &UpdateTask) -> Result<Task, TaskError> {
        self.fail()
    }

    async fn delete_task(&self, _: &str, _: i64) -> Result<Task, TaskError> {
        self.fail()
    }

    async fn toggle_complete(&self, _: &str, _: i64) -> Result<Task, TaskError> {
        self.fail()
    }
}

pub async fn add_task(pool: &SqlitePool, owner: &str, title: &str) -> Task {
    Task::create(
        pool,
        owner,
        &CreateTask {
            title: title.to_string(),
            description: None,
            priority: Default::default(),
            tags: Vec::new(),
            due_date: None,
        },
    )
    .await
    .expect("failed to create task")
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub listener");
    let addr = listener.local_addr().expect("stub listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}
