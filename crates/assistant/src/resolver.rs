//! Decides what a chat message asks for.
//!
//! The completion provider does the language understanding; this module owns
//! the protocol around it: the fixed framing, decoding the tool call, finding
//! the targeted task among the owner's tasks and refusing to guess.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use db::models::{
    chat_message::ChatMessage,
    task::{CreateTask, MAX_TITLE_CHARS, Task, TaskError, TaskStatusFilter, UpdateTask},
};

use crate::{
    AssistantError, Result,
    brain::{Completion, CompletionConfig, CompletionRequest, PromptMessage, ProviderChain},
    catalog::{
        ActionRequest, AddTaskArgs, ListTasksArgs, Operation, TaskTargetArgs, ToolCall,
        UpdateTaskArgs, catalog, has_title,
    },
    language::Language,
    priority::suggest_priority,
    schedule::{infer_due_date, parse_due_date},
    store::TaskStore,
};

const MAX_LIST_LIMIT: i64 = 100;
const MAX_CANDIDATES_SHOWN: usize = 5;

/// Why the resolver answered with a question instead of an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clarification {
    /// update/delete/complete without a task id or title
    MissingTarget(Operation),
    /// The title fragment matches several of the owner's tasks
    Ambiguous {
        operation: Operation,
        candidates: Vec<String>,
    },
    /// The title fragment matches none of the owner's tasks
    NoMatch { title: String },
    MissingTitle,
    TitleTooLong,
    NothingToUpdate,
    InvalidArguments(Operation),
}

#[derive(Debug, Clone)]
pub enum Resolution {
    /// Direct answer, no operation
    Answer(String),
    Clarify(Clarification),
    Action(ActionRequest),
}

pub fn system_prompt(language: Language, now: DateTime<Utc>) -> String {
    format!(
        r#"You are TodoEvolve, a task management assistant. You only help with the user's tasks: adding, listing, updating, deleting and completing them. Politely decline anything else.

Rules:
1. Reply in the same language as the user's latest message. The latest message is in {language}.
2. Use the available tools to act on tasks. Never claim an action happened without calling a tool.
3. Call at most one tool per message. If the user asks for several changes, do the first and say what remains.
4. Follow the user's explicit instructions over your own suggestions. Only set a priority when the user states one.
5. To act on an existing task, pass its task_id if you know it, otherwise its title. If you cannot tell which task is meant, ask.
6. Never show internal task ids to the user unless they ask for them.
7. If tools are unavailable, reply with just a JSON object: {{"tool": "tool_name", "arguments": {{...}}}}
8. Be brief.

Today's date is {today}."#,
        language = language.display_name(),
        today = now.format("%Y-%m-%d"),
    )
}

/// How a task reference in tool arguments was resolved.
enum Target {
    Id(i64),
    Clarify(Clarification),
}

#[derive(Clone)]
pub struct IntentResolver {
    chain: ProviderChain,
    store: Arc<dyn TaskStore>,
    store_timeout: Duration,
    completion: CompletionConfig,
    list_limit: i64,
}

impl IntentResolver {
    pub fn new(
        chain: ProviderChain,
        store: Arc<dyn TaskStore>,
        store_timeout: Duration,
        completion: CompletionConfig,
        list_limit: i64,
    ) -> Self {
        Self {
            chain,
            store,
            store_timeout,
            completion,
            list_limit,
        }
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    pub async fn resolve(
        &self,
        owner: &str,
        window: &[ChatMessage],
        message: &str,
        language: Language,
        now: DateTime<Utc>,
    ) -> Result<Resolution> {
        let request = CompletionRequest {
            system_prompt: system_prompt(language, now),
            history: window.iter().map(PromptMessage::from).collect(),
            message: message.to_string(),
            tools: catalog(),
            config: self.completion,
        };

        let completion = self.chain.complete(&request).await?;

        let (name, arguments) = match completion {
            Completion::Answer { text } => {
                tracing::debug!("[RESOLVER] Direct answer ({} chars)", text.chars().count());
                return Ok(Resolution::Answer(text));
            }
            Completion::Action { name, arguments } => (name, arguments),
        };

        tracing::info!("[RESOLVER] Provider chose {}", name);

        let titled = has_title(&arguments);
        let call = match ToolCall::decode(&name, arguments) {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!("[RESOLVER] Could not decode {} arguments: {}", name, e);
                let operation = name.parse().unwrap_or(Operation::None);
                let clarification = if operation == Operation::AddTask && !titled {
                    Clarification::MissingTitle
                } else {
                    Clarification::InvalidArguments(operation)
                };
                return Ok(Resolution::Clarify(clarification));
            }
        };

        self.to_request(owner, call, message, now).await
    }

    async fn to_request(
        &self,
        owner: &str,
        call: ToolCall,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Resolution> {
        let resolution = match call {
            ToolCall::AddTask(args) => self.add_request(args, message, now),
            ToolCall::ListTasks(args) => self.list_request(args),
            ToolCall::UpdateTask(args) => self.update_request(owner, args).await?,
            ToolCall::DeleteTask(args) => {
                match self.target(owner, Operation::DeleteTask, &args).await? {
                    Target::Id(task_id) => Resolution::Action(ActionRequest::DeleteTask { task_id }),
                    Target::Clarify(c) => Resolution::Clarify(c),
                }
            }
            ToolCall::CompleteTask(args) => {
                match self.target(owner, Operation::CompleteTask, &args).await? {
                    Target::Id(task_id) => {
                        Resolution::Action(ActionRequest::CompleteTask { task_id })
                    }
                    Target::Clarify(c) => Resolution::Clarify(c),
                }
            }
        };

        if let Resolution::Clarify(c) = &resolution {
            tracing::info!("[RESOLVER] Asking for clarification: {:?}", c);
        }
        Ok(resolution)
    }

    fn add_request(&self, args: AddTaskArgs, message: &str, now: DateTime<Utc>) -> Resolution {
        let title = args.title.trim().to_string();
        if title.is_empty() {
            return Resolution::Clarify(Clarification::MissingTitle);
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Resolution::Clarify(Clarification::TitleTooLong);
        }

        let description = args
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Explicit priority from the user wins over the keyword heuristic
        let priority = args.priority.unwrap_or_else(|| {
            let context = match &description {
                Some(d) => format!("{} {}", d, message),
                None => message.to_string(),
            };
            suggest_priority(&title, Some(&context))
        });

        let due_date = args
            .due_date
            .as_deref()
            .and_then(parse_due_date)
            .or_else(|| infer_due_date(message, now));

        Resolution::Action(ActionRequest::AddTask(CreateTask {
            title,
            description,
            priority,
            tags: clean_tags(args.tags),
            due_date,
        }))
    }

    fn list_request(&self, args: ListTasksArgs) -> Resolution {
        let limit = args
            .limit
            .unwrap_or(self.list_limit)
            .clamp(1, MAX_LIST_LIMIT);

        Resolution::Action(ActionRequest::ListTasks {
            status: args.status.unwrap_or(TaskStatusFilter::All),
            limit,
        })
    }

    async fn update_request(&self, owner: &str, args: UpdateTaskArgs) -> Result<Resolution> {
        let target = TaskTargetArgs {
            task_id: args.task_id,
            title: args.match_title.clone(),
        };
        let task_id = match self.target(owner, Operation::UpdateTask, &target).await? {
            Target::Id(id) => id,
            Target::Clarify(c) => return Ok(Resolution::Clarify(c)),
        };

        let title = args
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if title
            .as_ref()
            .is_some_and(|t| t.chars().count() > MAX_TITLE_CHARS)
        {
            return Ok(Resolution::Clarify(Clarification::TitleTooLong));
        }

        let changes = UpdateTask {
            title,
            description: args.description.map(|d| d.trim().to_string()),
            priority: args.priority,
            tags: args.tags.map(clean_tags),
            due_date: args.due_date.as_deref().and_then(parse_due_date),
        };

        if changes.is_empty() {
            return Ok(Resolution::Clarify(Clarification::NothingToUpdate));
        }

        Ok(Resolution::Action(ActionRequest::UpdateTask { task_id, changes }))
    }

    /// An explicit id is passed through untouched; ownership is checked when
    /// the action runs. A title is matched among the owner's tasks only.
    async fn target(
        &self,
        owner: &str,
        operation: Operation,
        args: &TaskTargetArgs,
    ) -> Result<Target> {
        if let Some(id) = args.task_id {
            return Ok(Target::Id(id));
        }

        let fragment = match args.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(Target::Clarify(Clarification::MissingTarget(operation))),
        };

        let candidates = self.find_by_title(owner, fragment).await?;
        Ok(pick_target(operation, fragment, candidates))
    }

    async fn find_by_title(&self, owner: &str, fragment: &str) -> Result<Vec<Task>> {
        match tokio::time::timeout(self.store_timeout, self.store.find_by_title(owner, fragment))
            .await
        {
            Ok(Ok(tasks)) => Ok(tasks),
            Ok(Err(TaskError::NotFound)) => Ok(Vec::new()),
            Ok(Err(TaskError::Database(e))) => {
                tracing::error!("[RESOLVER] Title lookup failed: {}", e);
                Err(AssistantError::StoreFailure("title lookup failed".into()))
            }
            Err(_) => {
                tracing::error!("[RESOLVER] Title lookup timed out");
                Err(AssistantError::StoreFailure("title lookup timed out".into()))
            }
        }
    }
}

/// Exact (case-insensitive) title matches win; otherwise the fragment must
/// identify a single task.
fn pick_target(operation: Operation, fragment: &str, candidates: Vec<Task>) -> Target {
    let wanted = fragment.to_lowercase();
    let exact: Vec<&Task> = candidates
        .iter()
        .filter(|t| t.title.trim().to_lowercase() == wanted)
        .collect();

    if exact.len() == 1 {
        return Target::Id(exact[0].id);
    }

    match candidates.len() {
        0 => Target::Clarify(Clarification::NoMatch {
            title: fragment.to_string(),
        }),
        1 => Target::Id(candidates[0].id),
        _ => Target::Clarify(Clarification::Ambiguous {
            operation,
            candidates: candidates
                .into_iter()
                .take(MAX_CANDIDATES_SHOWN)
                .map(|t| t.title)
                .collect(),
        }),
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}
