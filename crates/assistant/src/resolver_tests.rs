//! Tests for intent resolution

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use db::models::{
        chat_message::{ChatMessage, ChatRole, CreateChatMessage},
        task::{Priority, TaskStatusFilter},
    };
    use serde_json::json;
    use sqlx::SqlitePool;

    use crate::{
        AssistantError,
        brain::{CompletionConfig, ProviderError},
        catalog::{ActionRequest, Operation},
        language::Language,
        resolver::{Clarification, IntentResolver, Resolution},
        store::{SqliteTaskStore, TaskStore},
        test_support::{FailingStore, ScriptedProvider, Step, add_task, chain, setup_pool},
    };

    fn resolver(pool: &SqlitePool, provider: &Arc<ScriptedProvider>) -> IntentResolver {
        let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::new(pool.clone()));
        IntentResolver::new(
            chain(&[provider.clone()], Duration::from_secs(1)),
            store,
            Duration::from_secs(1),
            CompletionConfig::default(),
            20,
        )
    }

    async fn resolve(
        pool: &SqlitePool,
        step: Step,
        owner: &str,
        message: &str,
    ) -> crate::Result<Resolution> {
        let provider = ScriptedProvider::new("scripted", vec![step]);
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        resolver(pool, &provider)
            .resolve(owner, &[], message, Language::En, now)
            .await
    }

    fn added(resolution: Resolution) -> db::models::task::CreateTask {
        match resolution {
            Resolution::Action(ActionRequest::AddTask(task)) => task,
            other => panic!("expected add_task, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_priority_is_inferred_only_when_missing() {
        let pool = setup_pool().await;

        let urgent = added(
            resolve(
                &pool,
                Step::Action("add_task", json!({"title": "urgent: renew passport"})),
                "alice",
                "add urgent: renew passport",
            )
            .await
            .unwrap(),
        );
        assert_eq!(urgent.priority, Priority::High);

        let later = added(
            resolve(
                &pool,
                Step::Action("add_task", json!({"title": "clean garage next week"})),
                "alice",
                "remind me to clean garage next week",
            )
            .await
            .unwrap(),
        );
        assert_eq!(later.priority, Priority::Low);

        let plain = added(
            resolve(
                &pool,
                Step::Action("add_task", json!({"title": "call mom"})),
                "alice",
                "Add a task to call mom",
            )
            .await
            .unwrap(),
        );
        assert_eq!(plain.priority, Priority::Medium);
        assert_eq!(plain.due_date, None);

        let explicit = added(
            resolve(
                &pool,
                Step::Action(
                    "add_task",
                    json!({"title": "urgent: renew passport", "priority": "low"}),
                ),
                "alice",
                "add urgent: renew passport with low priority",
            )
            .await
            .unwrap(),
        );
        assert_eq!(explicit.priority, Priority::Low);
    }

    #[tokio::test]
    async fn test_loose_argument_shapes_are_accepted() {
        let pool = setup_pool().await;

        let task = added(
            resolve(
                &pool,
                Step::Action(
                    "add_task",
                    json!({"title": "call mom", "priority": "High", "tags": "family"}),
                ),
                "alice",
                "add call mom, high priority, tag family",
            )
            .await
            .unwrap(),
        );
        assert_eq!(task.title, "call mom");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.tags, vec!["family".to_string()]);

        let unknown = added(
            resolve(
                &pool,
                Step::Action(
                    "add_task",
                    json!({"title": "urgent: renew passport", "priority": "extreme"}),
                ),
                "alice",
                "add urgent: renew passport",
            )
            .await
            .unwrap(),
        );
        assert_eq!(unknown.priority, Priority::High);

        let wrong_type = resolve(
            &pool,
            Step::Action("add_task", json!({"title": "call mom", "description": 5})),
            "alice",
            "add call mom",
        )
        .await
        .unwrap();
        assert!(matches!(
            wrong_type,
            Resolution::Clarify(Clarification::InvalidArguments(Operation::AddTask))
        ));
    }

    #[tokio::test]
    async fn test_due_date_from_arguments_or_message() {
        let pool = setup_pool().await;
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();

        let hinted = added(
            resolve(
                &pool,
                Step::Action("add_task", json!({"title": "buy milk"})),
                "alice",
                "buy milk tomorrow",
            )
            .await
            .unwrap(),
        );
        assert_eq!(hinted.due_date, Some(now + ChronoDuration::days(1)));

        let explicit = added(
            resolve(
                &pool,
                Step::Action("add_task", json!({"title": "file taxes", "due_date": "2025-07-31"})),
                "alice",
                "file taxes by end of july",
            )
            .await
            .unwrap(),
        );
        assert_eq!(
            explicit.due_date,
            Some(Utc.with_ymd_and_hms(2025, 7, 31, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_add_task_validation_becomes_clarification() {
        let pool = setup_pool().await;

        let missing = resolve(&pool, Step::Action("add_task", json!({})), "alice", "add")
            .await
            .unwrap();
        assert!(matches!(
            missing,
            Resolution::Clarify(Clarification::MissingTitle)
        ));

        let long = "x".repeat(250);
        let too_long = resolve(
            &pool,
            Step::Action("add_task", json!({"title": long})),
            "alice",
            "add a long one",
        )
        .await
        .unwrap();
        assert!(matches!(
            too_long,
            Resolution::Clarify(Clarification::TitleTooLong)
        ));
    }

    #[tokio::test]
    async fn test_target_without_detail_is_a_question() {
        let pool = setup_pool().await;
        add_task(&pool, "alice", "Buy milk").await;
        add_task(&pool, "alice", "Call mom").await;

        let resolution = resolve(
            &pool,
            Step::Action("delete_task", json!({})),
            "alice",
            "delete my task",
        )
        .await
        .unwrap();

        assert!(matches!(
            resolution,
            Resolution::Clarify(Clarification::MissingTarget(Operation::DeleteTask))
        ));
    }

    #[tokio::test]
    async fn test_title_targets_only_see_the_owners_tasks() {
        let pool = setup_pool().await;
        let milk = add_task(&pool, "alice", "Buy milk").await;
        add_task(&pool, "alice", "Buy bread").await;
        add_task(&pool, "bob", "Walk the dog").await;

        let unique = resolve(
            &pool,
            Step::Action("complete_task", json!({"title": "milk"})),
            "alice",
            "I bought the milk",
        )
        .await
        .unwrap();
        assert!(matches!(
            unique,
            Resolution::Action(ActionRequest::CompleteTask { task_id }) if task_id == milk.id
        ));

        let ambiguous = resolve(
            &pool,
            Step::Action("delete_task", json!({"title": "buy"})),
            "alice",
            "delete the buy task",
        )
        .await
        .unwrap();
        assert!(matches!(
            ambiguous,
            Resolution::Clarify(Clarification::Ambiguous { .. })
        ));

        let foreign = resolve(
            &pool,
            Step::Action("delete_task", json!({"title": "walk the dog"})),
            "alice",
            "delete walk the dog",
        )
        .await
        .unwrap();
        assert!(matches!(
            foreign,
            Resolution::Clarify(Clarification::NoMatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_needs_changes_and_keeps_target_separate() {
        let pool = setup_pool().await;
        let report = add_task(&pool, "alice", "draft report").await;

        let renamed = resolve(
            &pool,
            Step::Action(
                "update_task",
                json!({"match_title": "draft report", "title": "final report"}),
            ),
            "alice",
            "rename draft report to final report",
        )
        .await
        .unwrap();
        match renamed {
            Resolution::Action(ActionRequest::UpdateTask { task_id, changes }) => {
                assert_eq!(task_id, report.id);
                assert_eq!(changes.title.as_deref(), Some("final report"));
            }
            other => panic!("unexpected resolution: {:?}", other),
        }

        let nothing = resolve(
            &pool,
            Step::Action("update_task", json!({"task_id": report.id})),
            "alice",
            "update my report",
        )
        .await
        .unwrap();
        assert!(matches!(
            nothing,
            Resolution::Clarify(Clarification::NothingToUpdate)
        ));
    }

    #[tokio::test]
    async fn test_list_defaults_and_clamps() {
        let pool = setup_pool().await;

        let default = resolve(&pool, Step::Action("list_tasks", json!({})), "alice", "list")
            .await
            .unwrap();
        assert!(matches!(
            default,
            Resolution::Action(ActionRequest::ListTasks {
                status: TaskStatusFilter::All,
                limit: 20
            })
        ));

        let clamped = resolve(
            &pool,
            Step::Action("list_tasks", json!({"status": "pending", "limit": 5000})),
            "alice",
            "list everything pending",
        )
        .await
        .unwrap();
        assert!(matches!(
            clamped,
            Resolution::Action(ActionRequest::ListTasks {
                status: TaskStatusFilter::Pending,
                limit: 100
            })
        ));
    }

    #[tokio::test]
    async fn test_answers_and_provider_failure() {
        let pool = setup_pool().await;

        let answer = resolve(&pool, Step::Answer("Hello!"), "alice", "hi").await.unwrap();
        assert!(matches!(answer, Resolution::Answer(ref text) if text == "Hello!"));

        let failure = resolve(
            &pool,
            Step::Fail(|| ProviderError::ApiError {
                status: 500,
                message: "upstream exploded".into(),
            }),
            "alice",
            "hi",
        )
        .await;
        assert!(matches!(
            failure,
            Err(AssistantError::ProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_title_lookup_failure_is_a_store_failure() {
        let provider = ScriptedProvider::new(
            "scripted",
            vec![Step::Action("delete_task", json!({"title": "milk"}))],
        );
        let resolver = IntentResolver::new(
            chain(&[provider], Duration::from_secs(1)),
            FailingStore::new(),
            Duration::from_secs(1),
            CompletionConfig::default(),
            20,
        );

        let result = resolver
            .resolve("alice", &[], "delete milk", Language::En, Utc::now())
            .await;
        assert!(matches!(result, Err(AssistantError::StoreFailure(_))));
    }

    #[tokio::test]
    async fn test_window_is_sent_as_history() {
        let pool = setup_pool().await;
        let mut window = Vec::new();
        for (role, content) in [(ChatRole::User, "hi"), (ChatRole::Assistant, "hello")] {
            window.push(
                ChatMessage::create(
                    &pool,
                    CreateChatMessage {
                        owner: "alice".into(),
                        role,
                        content: content.into(),
                    },
                )
                .await
                .unwrap(),
            );
        }

        let provider = ScriptedProvider::new("scripted", vec![Step::Answer("ok")]);
        resolver(&pool, &provider)
            .resolve("alice", &window, "list my tasks", Language::En, Utc::now())
            .await
            .unwrap();

        let request = provider.last_request().expect("provider was not called");
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[1].content, "hello");
        assert_eq!(request.message, "list my tasks");
        assert_eq!(request.tools.len(), 5);
        assert!(request.system_prompt.contains("English"));
    }
}
