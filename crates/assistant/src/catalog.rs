//! The closed set of task operations offered to completion providers.

use db::models::task::{CreateTask, Priority, TaskStatusFilter, UpdateTask};
use schemars::{JsonSchema, generate::SchemaSettings};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::brain::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AddTask,
    ListTasks,
    UpdateTask,
    DeleteTask,
    CompleteTask,
    None,
}

impl Operation {
    pub const TOOLS: [Operation; 5] = [
        Operation::AddTask,
        Operation::ListTasks,
        Operation::UpdateTask,
        Operation::DeleteTask,
        Operation::CompleteTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AddTask => "add_task",
            Operation::ListTasks => "list_tasks",
            Operation::UpdateTask => "update_task",
            Operation::DeleteTask => "delete_task",
            Operation::CompleteTask => "complete_task",
            Operation::None => "none",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::AddTask
                | Operation::UpdateTask
                | Operation::DeleteTask
                | Operation::CompleteTask
        )
    }

    fn description(&self) -> &'static str {
        match self {
            Operation::AddTask => {
                "Create a new task. Only set priority when the user states one explicitly."
            }
            Operation::ListTasks => "List the user's tasks, optionally filtered by status.",
            Operation::UpdateTask => {
                "Change a task's title, description, priority, tags or due date. Identify the task by task_id or by its current title in match_title."
            }
            Operation::DeleteTask => "Permanently delete one task, identified by task_id or title.",
            Operation::CompleteTask => {
                "Toggle one task between completed and pending, identified by task_id or title."
            }
            Operation::None => "",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "add_task" => Ok(Operation::AddTask),
            "list_tasks" => Ok(Operation::ListTasks),
            "update_task" => Ok(Operation::UpdateTask),
            "delete_task" => Ok(Operation::DeleteTask),
            "complete_task" => Ok(Operation::CompleteTask),
            "none" => Ok(Operation::None),
            other => Err(format!("Unknown operation: {}", other)),
        }
    }
}

/// Models sometimes send ids as strings ("3", "#3").
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    })
}

/// Case and whitespace are ignored; a priority the store does not know is
/// dropped so the wording heuristic can decide instead.
fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// A single tag may arrive as a bare string instead of a list.
fn tag_list(value: Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(tag_list)
        .unwrap_or_default())
}

fn lenient_optional_tags<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.map(tag_list))
}

/// True when the raw `add_task` arguments carry a non-blank title, so a
/// decode failure is about some other field.
pub fn has_title(arguments: &Value) -> bool {
    fn titled(value: &Value) -> bool {
        value
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.trim().is_empty())
    }

    match arguments {
        Value::String(s) => serde_json::from_str::<Value>(s).is_ok_and(|v| titled(&v)),
        other => titled(other),
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AddTaskArgs {
    #[schemars(description = "Short task title, at most 200 characters")]
    pub title: String,

    #[schemars(description = "Optional longer description")]
    #[serde(default)]
    pub description: Option<String>,

    #[schemars(
        with = "Option<Priority>",
        description = "Only when the user explicitly asks for a priority"
    )]
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,

    #[schemars(with = "Vec<String>")]
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,

    #[schemars(description = "Due date as YYYY-MM-DD or an RFC 3339 timestamp")]
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTasksArgs {
    #[serde(default)]
    pub status: Option<TaskStatusFilter>,

    #[schemars(description = "Maximum number of tasks to return (default 20)")]
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UpdateTaskArgs {
    #[schemars(with = "Option<i64>", description = "ID of the task to update")]
    #[serde(default, deserialize_with = "lenient_id")]
    pub task_id: Option<i64>,

    #[schemars(description = "Current title of the task when the id is unknown")]
    #[serde(default)]
    pub match_title: Option<String>,

    #[schemars(description = "New title")]
    #[serde(default)]
    pub title: Option<String>,

    #[schemars(description = "New description")]
    #[serde(default)]
    pub description: Option<String>,

    #[schemars(with = "Option<Priority>")]
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,

    #[schemars(with = "Option<Vec<String>>")]
    #[serde(default, deserialize_with = "lenient_optional_tags")]
    pub tags: Option<Vec<String>>,

    #[schemars(description = "New due date as YYYY-MM-DD or an RFC 3339 timestamp")]
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Target of delete_task and complete_task
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct TaskTargetArgs {
    #[schemars(with = "Option<i64>", description = "ID of the task")]
    #[serde(default, deserialize_with = "lenient_id")]
    pub task_id: Option<i64>,

    #[schemars(description = "Title of the task (case-insensitive match)")]
    #[serde(default)]
    pub title: Option<String>,
}

/// Tool arguments as decoded from a provider, before targets are resolved.
#[derive(Debug, Clone)]
pub enum ToolCall {
    AddTask(AddTaskArgs),
    ListTasks(ListTasksArgs),
    UpdateTask(UpdateTaskArgs),
    DeleteTask(TaskTargetArgs),
    CompleteTask(TaskTargetArgs),
}

impl ToolCall {
    /// Decodes `arguments` for the tool called `name`. A JSON null or missing
    /// argument object is treated as `{}`.
    pub fn decode(name: &str, arguments: Value) -> Result<Self, String> {
        let operation: Operation = name.parse()?;
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            // Some models double-encode the argument object
            Value::String(s) => serde_json::from_str(&s).map_err(|e| e.to_string())?,
            other => other,
        };

        fn parse<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, String> {
            serde_json::from_value(value).map_err(|e| e.to_string())
        }

        match operation {
            Operation::AddTask => parse(arguments).map(ToolCall::AddTask),
            Operation::ListTasks => parse(arguments).map(ToolCall::ListTasks),
            Operation::UpdateTask => parse(arguments).map(ToolCall::UpdateTask),
            Operation::DeleteTask => parse(arguments).map(ToolCall::DeleteTask),
            Operation::CompleteTask => parse(arguments).map(ToolCall::CompleteTask),
            Operation::None => Err("none is not a callable tool".to_string()),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ToolCall::AddTask(_) => Operation::AddTask,
            ToolCall::ListTasks(_) => Operation::ListTasks,
            ToolCall::UpdateTask(_) => Operation::UpdateTask,
            ToolCall::DeleteTask(_) => Operation::DeleteTask,
            ToolCall::CompleteTask(_) => Operation::CompleteTask,
        }
    }
}

/// A fully resolved request: every target is a concrete id owned by the caller.
#[derive(Debug, Clone)]
pub enum ActionRequest {
    AddTask(CreateTask),
    ListTasks {
        status: TaskStatusFilter,
        limit: i64,
    },
    UpdateTask {
        task_id: i64,
        changes: UpdateTask,
    },
    DeleteTask {
        task_id: i64,
    },
    CompleteTask {
        task_id: i64,
    },
}

impl ActionRequest {
    pub fn operation(&self) -> Operation {
        match self {
            ActionRequest::AddTask(_) => Operation::AddTask,
            ActionRequest::ListTasks { .. } => Operation::ListTasks,
            ActionRequest::UpdateTask { .. } => Operation::UpdateTask,
            ActionRequest::DeleteTask { .. } => Operation::DeleteTask,
            ActionRequest::CompleteTask { .. } => Operation::CompleteTask,
        }
    }
}

fn parameters_for<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>();

    let mut value = schema.to_value();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.remove("description");
    }
    value
}

/// Tool definitions for every callable operation, in a stable order.
pub fn catalog() -> Vec<ToolDefinition> {
    Operation::TOOLS
        .iter()
        .map(|op| {
            let parameters = match op {
                Operation::AddTask => parameters_for::<AddTaskArgs>(),
                Operation::ListTasks => parameters_for::<ListTasksArgs>(),
                Operation::UpdateTask => parameters_for::<UpdateTaskArgs>(),
                Operation::DeleteTask | Operation::CompleteTask => {
                    parameters_for::<TaskTargetArgs>()
                }
                Operation::None => Value::Null,
            };
            ToolDefinition {
                name: op.as_str().to_string(),
                description: op.description().to_string(),
                parameters,
            }
        })
        .collect()
}

pub fn is_known_tool(name: &str) -> bool {
    name.parse::<Operation>()
        .map(|op| op != Operation::None)
        .unwrap_or(false)
}
