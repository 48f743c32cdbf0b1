//! Localized replies and the refresh flag for the chat widget.

use db::models::task::{Priority, Task};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    ValidationError,
    catalog::Operation,
    executor::{ActionPayload, ActionResult, ErrorKind},
    language::Language,
    resolver::Clarification,
};

const MAX_LISTED: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ChatReply {
    pub response: String,
    /// True when tasks changed and the task list should be refreshed
    pub action_performed: bool,
}

impl ChatReply {
    fn text(response: String) -> Self {
        Self {
            response,
            action_performed: false,
        }
    }
}

/// Provider answers pass through verbatim.
pub fn compose_answer(text: String) -> ChatReply {
    ChatReply::text(text)
}

pub fn compose_error(kind: ErrorKind, language: Language) -> ChatReply {
    let response = match (kind, language) {
        (ErrorKind::NotFound, Language::En) => "Sorry, I couldn't find that task.",
        (ErrorKind::NotFound, Language::Ur) => "معذرت، مجھے وہ کام نہیں ملا۔",
        (ErrorKind::ProviderUnavailable, Language::En) => {
            "Sorry, I'm having trouble right now. Please try again in a few minutes."
        }
        (ErrorKind::ProviderUnavailable, Language::Ur) => {
            "معذرت، اس وقت مجھے مشکل پیش آ رہی ہے۔ براہ کرم چند منٹ بعد دوبارہ کوشش کریں۔"
        }
        (ErrorKind::StoreFailure, Language::En) => {
            "Sorry, I couldn't update your tasks just now. Please try again."
        }
        (ErrorKind::StoreFailure, Language::Ur) => {
            "معذرت، ابھی آپ کے کاموں میں تبدیلی نہیں ہو سکی۔ براہ کرم دوبارہ کوشش کریں۔"
        }
        (ErrorKind::Validation, Language::En) => {
            "Sorry, I didn't quite get that. Could you say it another way?"
        }
        (ErrorKind::Validation, Language::Ur) => {
            "معذرت، میں یہ بات ٹھیک سے نہیں سمجھ سکا۔ کیا آپ دوسرے الفاظ میں بتا سکتے ہیں؟"
        }
    };
    ChatReply::text(response.to_string())
}

pub fn compose_validation(error: &ValidationError, language: Language) -> ChatReply {
    let response = match (error, language) {
        (ValidationError::EmptyMessage, Language::En) => {
            "What would you like me to do with your tasks?".to_string()
        }
        (ValidationError::EmptyMessage, Language::Ur) => {
            "میں آپ کے کاموں میں کیا مدد کر سکتا ہوں؟".to_string()
        }
        (ValidationError::MessageTooLong { max }, Language::En) => {
            format!("That message is too long. Please keep it under {} characters.", max)
        }
        (ValidationError::MessageTooLong { max }, Language::Ur) => {
            format!("یہ پیغام بہت لمبا ہے۔ براہ کرم اسے {} حروف سے کم رکھیں۔", max)
        }
    };
    ChatReply::text(response)
}

fn verb(operation: Operation, language: Language) -> &'static str {
    match (operation, language) {
        (Operation::DeleteTask, Language::En) => "delete",
        (Operation::CompleteTask, Language::En) => "mark as done",
        (_, Language::En) => "change",
        (Operation::DeleteTask, Language::Ur) => "حذف کرنا",
        (Operation::CompleteTask, Language::Ur) => "مکمل کرنا",
        (_, Language::Ur) => "تبدیل کرنا",
    }
}

fn quoted_list(titles: &[String], language: Language) -> String {
    let separator = match language {
        Language::En => ", ",
        Language::Ur => "، ",
    };
    titles
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn compose_clarification(clarification: &Clarification, language: Language) -> ChatReply {
    let response = match (clarification, language) {
        (Clarification::MissingTarget(op), Language::En) => format!(
            "Which task would you like me to {}? Please tell me its title.",
            verb(*op, language)
        ),
        (Clarification::MissingTarget(op), Language::Ur) => format!(
            "آپ کون سا کام {} چاہتے ہیں؟ براہ کرم اس کا عنوان بتائیں۔",
            verb(*op, language)
        ),
        (
            Clarification::Ambiguous {
                operation,
                candidates,
            },
            Language::En,
        ) => format!(
            "Several tasks match: {}. Which one should I {}?",
            quoted_list(candidates, language),
            verb(*operation, language)
        ),
        (
            Clarification::Ambiguous {
                operation,
                candidates,
            },
            Language::Ur,
        ) => format!(
            "کئی کام ملتے ہیں: {}۔ آپ کون سا {} چاہتے ہیں؟",
            quoted_list(candidates, language),
            verb(*operation, language)
        ),
        (Clarification::NoMatch { title }, Language::En) => format!(
            "I couldn't find a task called \"{}\". Which task did you mean?",
            title
        ),
        (Clarification::NoMatch { title }, Language::Ur) => format!(
            "مجھے \"{}\" نام کا کوئی کام نہیں ملا۔ آپ کس کام کی بات کر رہے ہیں؟",
            title
        ),
        (Clarification::MissingTitle, Language::En) => {
            "What should the new task be called?".to_string()
        }
        (Clarification::MissingTitle, Language::Ur) => {
            "نئے کام کا عنوان کیا ہونا چاہیے؟".to_string()
        }
        (Clarification::TitleTooLong, Language::En) => {
            "That title is too long. Please keep it under 200 characters.".to_string()
        }
        (Clarification::TitleTooLong, Language::Ur) => {
            "یہ عنوان بہت لمبا ہے۔ براہ کرم اسے 200 حروف سے کم رکھیں۔".to_string()
        }
        (Clarification::NothingToUpdate, Language::En) => {
            "What would you like to change about that task?".to_string()
        }
        (Clarification::NothingToUpdate, Language::Ur) => {
            "آپ اس کام میں کیا تبدیلی چاہتے ہیں؟".to_string()
        }
        (Clarification::InvalidArguments(_), _) => {
            return compose_error(ErrorKind::Validation, language);
        }
    };
    ChatReply::text(response)
}

fn priority_label(priority: Priority, language: Language) -> &'static str {
    match (priority, language) {
        (Priority::High, Language::En) => "high",
        (Priority::Medium, Language::En) => "medium",
        (Priority::Low, Language::En) => "low",
        (Priority::High, Language::Ur) => "زیادہ",
        (Priority::Medium, Language::Ur) => "درمیانی",
        (Priority::Low, Language::Ur) => "کم",
    }
}

fn list_line(task: &Task, language: Language) -> String {
    let done = match language {
        Language::En => " (done)",
        Language::Ur => " (مکمل)",
    };
    format!(
        "- {} [{}]{}",
        task.title,
        priority_label(task.priority, language),
        if task.completed { done } else { "" }
    )
}

fn compose_list(tasks: &[Task], language: Language) -> String {
    if tasks.is_empty() {
        return match language {
            Language::En => "You don't have any tasks here.".to_string(),
            Language::Ur => "آپ کی فہرست میں کوئی کام نہیں ہے۔".to_string(),
        };
    }

    let mut lines = vec![match (language, tasks.len()) {
        (Language::En, 1) => "You have 1 task:".to_string(),
        (Language::En, n) => format!("You have {} tasks:", n),
        (Language::Ur, n) => format!("آپ کے {} کام ہیں:", n),
    }];
    lines.extend(tasks.iter().take(MAX_LISTED).map(|t| list_line(t, language)));

    let hidden = tasks.len().saturating_sub(MAX_LISTED);
    if hidden > 0 {
        lines.push(match language {
            Language::En => format!("...and {} more.", hidden),
            Language::Ur => format!("...اور {} مزید۔", hidden),
        });
    }
    lines.join("\n")
}

/// Reads (list_tasks) do not request a refresh; every successful write does.
pub fn compose_result(result: &ActionResult, language: Language) -> ChatReply {
    if !result.succeeded {
        let kind = result.error_kind.unwrap_or(ErrorKind::StoreFailure);
        return compose_error(kind, language);
    }

    let Some(payload) = &result.payload else {
        return compose_error(ErrorKind::StoreFailure, language);
    };

    let response = match (result.operation, payload, language) {
        (Operation::AddTask, ActionPayload::Task(task), Language::En) => format!(
            "Added \"{}\" to your tasks ({} priority).",
            task.title,
            priority_label(task.priority, language)
        ),
        (Operation::AddTask, ActionPayload::Task(task), Language::Ur) => format!(
            "کام \"{}\" شامل کر دیا گیا ہے ({} ترجیح)۔",
            task.title,
            priority_label(task.priority, language)
        ),
        (_, ActionPayload::Task(task), Language::En) => {
            format!("Updated \"{}\".", task.title)
        }
        (_, ActionPayload::Task(task), Language::Ur) => {
            format!("کام \"{}\" اپ ڈیٹ کر دیا گیا ہے۔", task.title)
        }
        (_, ActionPayload::Tasks(tasks), _) => compose_list(tasks, language),
        (_, ActionPayload::Deleted { title }, Language::En) => {
            format!("Deleted \"{}\".", title)
        }
        (_, ActionPayload::Deleted { title }, Language::Ur) => {
            format!("کام \"{}\" حذف کر دیا گیا ہے۔", title)
        }
        (_, ActionPayload::Toggled { title, completed }, Language::En) => {
            if *completed {
                format!("Marked \"{}\" as completed.", title)
            } else {
                format!("Marked \"{}\" as pending again.", title)
            }
        }
        (_, ActionPayload::Toggled { title, completed }, Language::Ur) => {
            if *completed {
                format!("کام \"{}\" مکمل ہو گیا ہے۔", title)
            } else {
                format!("کام \"{}\" دوبارہ زیر التوا کر دیا گیا ہے۔", title)
            }
        }
    };

    ChatReply {
        response,
        action_performed: result.operation.is_mutation(),
    }
}
