//! End-to-end turns over the in-memory adapters and a scripted capability.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use factotum::chat::adapters::memory::InMemoryChatStore;
use factotum::chat::domain::ConversationId;
use factotum::chat::error::ChatRepositoryError;
use factotum::chat::ports::{ChatRepositoryResult, TurnDelta, TurnWriter};
use factotum::chat::services::{ConversationDirectory, PageRequest, TranscriptLoader, TurnPersister};
use factotum::identity::UserId;
use factotum::orchestrator::adapters::ScriptedCapability;
use factotum::orchestrator::catalog::{OperationCall, TaskSelector};
use factotum::orchestrator::ports::{
    CapabilityAction, CapabilityError, LanguageCapability, TurnPrompt,
};
use factotum::orchestrator::turn::{TurnEngine, TurnError, TurnRequest};
use factotum::task::adapters::memory::InMemoryTaskRepository;
use factotum::task::domain::{StatusFilter, Task, TaskId};
use factotum::task::ports::{TaskRepository, TaskRepositoryResult};
use factotum::task::services::TaskStore;
use mockable::DefaultClock;
use rstest::rstest;

use super::helpers::{seed_task, world};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creating_a_task_confirms_from_the_store_result() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_invoke(OperationCall::AddTask {
            title: "Buy milk".to_owned(),
            description: None,
        })
        .then_reply("Added something, probably.");
    let world = world(script)?;
    let user = UserId::new();

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("I need to remember to buy milk"))
        .await?;

    assert_eq!(result.reply(), "Done! I've added 'Buy milk' to your list.");
    assert_eq!(result.operations().len(), 1);
    assert_eq!(
        result
            .operations()
            .first()
            .expect("one operation record")
            .name,
        "add_task"
    );

    let tasks = world.store.list(user, StatusFilter::All).await?;
    assert_eq!(tasks.len(), 1);
    let task = tasks.first().expect("one task");
    assert_eq!(task.title().as_str(), "Buy milk");
    assert!(!task.completed());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ambiguous_reference_asks_for_clarification_without_dispatching() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_invoke(OperationCall::CompleteTask {
        selector: TaskSelector::Phrase("mark the milk task done".to_owned()),
    });
    let world = world(script)?;
    let user = UserId::new();
    seed_task(&world, user, "Buy milk").await?;
    seed_task(&world, user, "Buy almond milk").await?;

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("mark the milk task done"))
        .await?;

    assert!(
        result
            .reply()
            .starts_with("I found multiple tasks that match. Which one did you mean?")
    );
    assert!(result.reply().contains("Buy milk"));
    assert!(result.reply().contains("Buy almond milk"));
    assert!(result.operations().is_empty());

    let tasks = world.store.list(user, StatusFilter::All).await?;
    assert!(tasks.iter().all(|task| !task.completed()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pending_listing_enumerates_only_incomplete_tasks() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_invoke(OperationCall::ListTasks {
            status: StatusFilter::Pending,
        })
        .then_reply("ignored paraphrase");
    let world = world(script)?;
    let user = UserId::new();
    seed_task(&world, user, "Buy milk").await?;
    let dentist = seed_task(&world, user, "Call the dentist").await?;
    world.store.complete(user, dentist.id()).await?;

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("what do I still need to do?"))
        .await?;

    assert_eq!(result.reply(), "Here's what you need to do:\n1. Buy milk");
    assert_eq!(result.operations().len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fully_completed_list_suggests_adding_more() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_invoke(OperationCall::ListTasks {
            status: StatusFilter::Pending,
        })
        .then_reply("ignored paraphrase");
    let world = world(script)?;
    let user = UserId::new();
    let task = seed_task(&world, user, "Buy milk").await?;
    world.store.complete(user, task.id()).await?;

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("anything left?"))
        .await?;

    assert_eq!(
        result.reply(),
        "Great! You've completed everything on your list. Want to add more tasks?"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unmatched_reference_reports_not_found_without_deleting() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_invoke(OperationCall::DeleteTask {
        selector: TaskSelector::Phrase("the laundry task".to_owned()),
    });
    let world = world(script)?;
    let user = UserId::new();
    seed_task(&world, user, "Buy milk").await?;

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("delete the laundry task"))
        .await?;

    assert_eq!(
        result.reply(),
        "I couldn't find a task with that description. Would you like to see your current tasks?"
    );
    assert!(result.operations().is_empty());

    let tasks = world.store.list(user, StatusFilter::All).await?;
    assert_eq!(tasks.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reply_without_any_dispatch_keeps_the_capability_text() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_reply("You have a tidy list!");
    let world = world(script)?;
    let user = UserId::new();

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("how does my list look?"))
        .await?;

    assert_eq!(result.reply(), "You have a tidy list!");
    assert!(result.operations().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn chained_operations_confirm_from_the_last_dispatch() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_invoke(OperationCall::AddTask {
            title: "Buy milk".to_owned(),
            description: None,
        })
        .then_invoke(OperationCall::ListTasks {
            status: StatusFilter::All,
        })
        .then_reply("ignored paraphrase");
    let world = world(script)?;
    let user = UserId::new();

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("add milk and show me the list"))
        .await?;

    assert_eq!(result.reply(), "Here's your full list:\n1. Buy milk");
    let names: Vec<&str> = result
        .operations()
        .iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(names, vec!["add_task", "list_tasks"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_twice_confirms_both_times() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_invoke(OperationCall::CompleteTask {
            selector: TaskSelector::Phrase("the milk task".to_owned()),
        })
        .then_reply("ignored paraphrase")
        .then_invoke(OperationCall::CompleteTask {
            selector: TaskSelector::Phrase("the milk task".to_owned()),
        })
        .then_reply("ignored paraphrase");
    let world = world(script)?;
    let user = UserId::new();
    let task = seed_task(&world, user, "Buy milk").await?;

    let first = world
        .engine
        .run_turn(user, TurnRequest::new("mark the milk task done"))
        .await?;
    let second = world
        .engine
        .run_turn(
            user,
            TurnRequest::new("mark the milk task done")
                .with_conversation(first.conversation_id()),
        )
        .await?;

    assert_eq!(first.reply(), "Great! I've marked 'Buy milk' as complete.");
    assert_eq!(second.reply(), first.reply());
    let stored = world.store.get(user, task.id()).await?;
    assert!(stored.completed());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn round_limit_ends_the_turn_with_an_apology() -> eyre::Result<()> {
    let mut script = ScriptedCapability::new();
    for _ in 0..4 {
        script = script.then_invoke(OperationCall::ListTasks {
            status: StatusFilter::All,
        });
    }
    let world = world(script)?;
    let user = UserId::new();

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("list my tasks forever"))
        .await?;

    assert_eq!(
        result.reply(),
        "Sorry, I ran into a problem handling that. Please try again."
    );
    assert_eq!(result.operations().len(), 4);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn capability_failure_still_persists_the_turn() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_fail("upstream offline");
    let world = world(script)?;
    let user = UserId::new();

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("add a task for me"))
        .await?;

    assert_eq!(
        result.reply(),
        "Sorry, I ran into a problem handling that. Please try again."
    );

    let detail = world.directory.detail(user, result.conversation_id()).await?;
    assert_eq!(detail.messages().len(), 2);
    Ok(())
}

/// A capability that never answers within the engine's patience.
struct StallingCapability;

#[async_trait]
impl LanguageCapability for StallingCapability {
    async fn next_action(
        &self,
        _prompt: TurnPrompt<'_>,
    ) -> Result<CapabilityAction, CapabilityError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(CapabilityAction::Reply("too late".to_owned()))
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stalled_capability_times_out_into_an_apology() -> eyre::Result<()> {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let chat = Arc::new(InMemoryChatStore::new());
    let clock = Arc::new(DefaultClock);
    let store = TaskStore::new(Arc::clone(&tasks), Arc::clone(&clock));
    let loader = TranscriptLoader::new(Arc::clone(&chat), Arc::clone(&chat));
    let persister = TurnPersister::new(Arc::clone(&chat), Arc::clone(&chat), Arc::clone(&clock));
    let directory = ConversationDirectory::new(Arc::clone(&chat), Arc::clone(&chat));
    let engine = TurnEngine::new(store, loader, persister, Arc::new(StallingCapability), clock)?;
    let user = UserId::new();

    let result = engine
        .run_turn(user, TurnRequest::new("add milk to my list"))
        .await?;

    assert_eq!(
        result.reply(),
        "Sorry, I ran into a problem handling that. Please try again."
    );
    assert!(result.operations().is_empty());

    let detail = directory.detail(user, result.conversation_id()).await?;
    assert_eq!(detail.messages().len(), 2);
    Ok(())
}

/// A repository whose writes hang long past the engine's dispatch budget.
struct StalledTaskRepository;

#[async_trait]
impl TaskRepository for StalledTaskRepository {
    async fn insert(&self, _task: &Task) -> TaskRepositoryResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn update(&self, _task: &Task) -> TaskRepositoryResult<()> {
        Ok(())
    }

    async fn delete(&self, _id: TaskId) -> TaskRepositoryResult<()> {
        Ok(())
    }

    async fn find_by_id(&self, _id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(None)
    }

    async fn list_for_user(
        &self,
        _user_id: UserId,
        _filter: StatusFilter,
    ) -> TaskRepositoryResult<Vec<Task>> {
        Ok(Vec::new())
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stalled_store_dispatch_times_out_into_an_apology() -> eyre::Result<()> {
    let tasks = Arc::new(StalledTaskRepository);
    let chat = Arc::new(InMemoryChatStore::new());
    let clock = Arc::new(DefaultClock);
    let store = TaskStore::new(Arc::clone(&tasks), Arc::clone(&clock));
    let loader = TranscriptLoader::new(Arc::clone(&chat), Arc::clone(&chat));
    let persister = TurnPersister::new(Arc::clone(&chat), Arc::clone(&chat), Arc::clone(&clock));
    let directory = ConversationDirectory::new(Arc::clone(&chat), Arc::clone(&chat));
    let script = ScriptedCapability::new().then_invoke(OperationCall::AddTask {
        title: "Buy milk".to_owned(),
        description: None,
    });
    let engine = TurnEngine::new(store, loader, persister, Arc::new(script), clock)?;
    let user = UserId::new();

    let result = engine
        .run_turn(user, TurnRequest::new("I need to remember to buy milk"))
        .await?;

    assert_eq!(
        result.reply(),
        "Sorry, I ran into a problem handling that. Please try again."
    );
    assert!(result.operations().is_empty());

    let detail = directory.detail(user, result.conversation_id()).await?;
    assert_eq!(detail.messages().len(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_utterance_is_rejected_before_anything_runs() -> eyre::Result<()> {
    let world = world(ScriptedCapability::new())?;
    let user = UserId::new();

    let error = world
        .engine
        .run_turn(user, TurnRequest::new("   "))
        .await
        .expect_err("blank utterance should be rejected");

    assert!(matches!(error, TurnError::EmptyUtterance));
    let page = world.directory.list(user, PageRequest::default()).await?;
    assert_eq!(page.total(), 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_conversation_is_rejected() -> eyre::Result<()> {
    let world = world(ScriptedCapability::new())?;
    let user = UserId::new();
    let missing = ConversationId::new();

    let error = world
        .engine
        .run_turn(
            user,
            TurnRequest::new("hello again").with_conversation(missing),
        )
        .await
        .expect_err("unknown conversation should be rejected");

    assert!(matches!(
        error,
        TurnError::ConversationNotFound(id) if id == missing
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_conversation_is_reported_as_not_found() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_reply("Hi there!");
    let world = world(script)?;
    let alice = UserId::new();
    let bob = UserId::new();

    let result = world.engine.run_turn(alice, TurnRequest::new("hello")).await?;

    let error = world
        .engine
        .run_turn(
            bob,
            TurnRequest::new("hello").with_conversation(result.conversation_id()),
        )
        .await
        .expect_err("foreign conversation should be rejected");

    assert!(matches!(
        error,
        TurnError::ConversationNotFound(id) if id == result.conversation_id()
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creation_without_a_title_asks_what_to_add() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_invoke(OperationCall::AddTask {
        title: "   ".to_owned(),
        description: None,
    });
    let world = world(script)?;
    let user = UserId::new();

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("add something to my list"))
        .await?;

    assert_eq!(result.reply(), "What would you like to add to your list?");
    assert!(result.operations().is_empty());
    let tasks = world.store.list(user, StatusFilter::All).await?;
    assert!(tasks.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_without_fields_asks_what_to_change() -> eyre::Result<()> {
    let script = ScriptedCapability::new().then_invoke(OperationCall::UpdateTask {
        selector: TaskSelector::Phrase("the milk task".to_owned()),
        title: None,
        description: None,
    });
    let world = world(script)?;
    let user = UserId::new();
    seed_task(&world, user, "Buy milk").await?;

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("change the milk task"))
        .await?;

    assert_eq!(
        result.reply(),
        "What would you like to change about this task?"
    );
    assert!(result.operations().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updating_by_phrase_renames_the_task() -> eyre::Result<()> {
    let script = ScriptedCapability::new()
        .then_invoke(OperationCall::UpdateTask {
            selector: TaskSelector::Phrase("the milk task".to_owned()),
            title: Some("Buy oat milk".to_owned()),
            description: None,
        })
        .then_reply("ignored paraphrase");
    let world = world(script)?;
    let user = UserId::new();
    let task = seed_task(&world, user, "Buy milk").await?;

    let result = world
        .engine
        .run_turn(user, TurnRequest::new("rename the milk task to oat milk"))
        .await?;

    assert_eq!(result.reply(), "Got it! 'Buy oat milk' has been updated.");
    let updated = world.store.get(user, task.id()).await?;
    assert_eq!(updated.title().as_str(), "Buy oat milk");
    Ok(())
}

mockall::mock! {
    Writer {}

    #[async_trait]
    impl TurnWriter for Writer {
        async fn append_turn(&self, delta: &TurnDelta) -> ChatRepositoryResult<()>;
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn persistence_failure_surfaces_without_rolling_back_tasks() -> eyre::Result<()> {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let chat = Arc::new(InMemoryChatStore::new());
    let clock = Arc::new(DefaultClock);
    let store = TaskStore::new(Arc::clone(&tasks), Arc::clone(&clock));
    let loader = TranscriptLoader::new(Arc::clone(&chat), Arc::clone(&chat));

    let mut writer = MockWriter::new();
    writer
        .expect_append_turn()
        .returning(|_| Err(ChatRepositoryError::persistence(io::Error::other("disk full"))));
    let persister = TurnPersister::new(Arc::new(writer), Arc::clone(&chat), Arc::clone(&clock));

    let script = ScriptedCapability::new()
        .then_invoke(OperationCall::AddTask {
            title: "Buy milk".to_owned(),
            description: None,
        })
        .then_reply("ignored paraphrase");
    let engine = TurnEngine::new(store.clone(), loader, persister, Arc::new(script), clock)?;
    let user = UserId::new();

    let error = engine
        .run_turn(user, TurnRequest::new("I need to remember to buy milk"))
        .await
        .expect_err("turn persistence should fail");

    assert!(matches!(error, TurnError::Persistence(_)));
    let remaining = store.list(user, StatusFilter::All).await?;
    assert_eq!(remaining.len(), 1);
    Ok(())
}
