//! Cross-user isolation of every task operation.
//!
//! A task belonging to someone else must be indistinguishable from a task
//! that does not exist, for reads and writes alike.

use std::sync::Arc;

use factotum::chat::adapters::memory::InMemoryChatStore;
use factotum::chat::services::{TranscriptLoader, TurnPersister};
use factotum::identity::UserId;
use factotum::orchestrator::adapters::ScriptedCapability;
use factotum::orchestrator::catalog::{OperationCall, TaskSelector};
use factotum::orchestrator::turn::{TurnEngine, TurnRequest};
use factotum::task::adapters::memory::InMemoryTaskRepository;
use factotum::task::domain::StatusFilter;
use factotum::task::services::{CreateTaskRequest, TaskStore, TaskStoreError, UpdateTaskRequest};
use mockable::DefaultClock;
use rstest::rstest;

use super::helpers::{seed_task, world};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_tasks_are_invisible_to_reads() -> eyre::Result<()> {
    let world = world(ScriptedCapability::new())?;
    let alice = UserId::new();
    let bob = UserId::new();
    let task = seed_task(&world, alice, "Buy milk").await?;

    let listed = world.store.list(bob, StatusFilter::All).await?;
    assert!(listed.is_empty());

    let error = world
        .store
        .get(bob, task.id())
        .await
        .expect_err("foreign task should be hidden");
    assert!(matches!(error, TaskStoreError::NotFound(id) if id == task.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_tasks_cannot_be_completed() -> eyre::Result<()> {
    let world = world(ScriptedCapability::new())?;
    let alice = UserId::new();
    let bob = UserId::new();
    let task = seed_task(&world, alice, "Buy milk").await?;

    let error = world
        .store
        .complete(bob, task.id())
        .await
        .expect_err("foreign task should be hidden");
    assert!(matches!(error, TaskStoreError::NotFound(_)));

    let stored = world.store.get(alice, task.id()).await?;
    assert!(!stored.completed());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_tasks_cannot_be_deleted() -> eyre::Result<()> {
    let world = world(ScriptedCapability::new())?;
    let alice = UserId::new();
    let bob = UserId::new();
    let task = seed_task(&world, alice, "Buy milk").await?;

    let error = world
        .store
        .delete(bob, task.id())
        .await
        .expect_err("foreign task should be hidden");
    assert!(matches!(error, TaskStoreError::NotFound(_)));

    let remaining = world.store.list(alice, StatusFilter::All).await?;
    assert_eq!(remaining.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_tasks_cannot_be_updated() -> eyre::Result<()> {
    let world = world(ScriptedCapability::new())?;
    let alice = UserId::new();
    let bob = UserId::new();
    let task = seed_task(&world, alice, "Buy milk").await?;

    let error = world
        .store
        .update(
            bob,
            task.id(),
            UpdateTaskRequest::new().with_title("Hijacked"),
        )
        .await
        .expect_err("foreign task should be hidden");
    assert!(matches!(error, TaskStoreError::NotFound(_)));

    let stored = world.store.get(alice, task.id()).await?;
    assert_eq!(stored.title().as_str(), "Buy milk");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_task_identifier_in_a_turn_reads_as_not_found() -> eyre::Result<()> {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let chat = Arc::new(InMemoryChatStore::new());
    let clock = Arc::new(DefaultClock);
    let store = TaskStore::new(Arc::clone(&tasks), Arc::clone(&clock));
    let alice = UserId::new();
    let bob = UserId::new();
    let task = store.create(alice, CreateTaskRequest::new("Buy milk")).await?;

    let script = ScriptedCapability::new().then_invoke(OperationCall::CompleteTask {
        selector: TaskSelector::Id(task.id()),
    });
    let loader = TranscriptLoader::new(Arc::clone(&chat), Arc::clone(&chat));
    let persister = TurnPersister::new(Arc::clone(&chat), Arc::clone(&chat), Arc::clone(&clock));
    let engine = TurnEngine::new(store.clone(), loader, persister, Arc::new(script), clock)?;

    let result = engine
        .run_turn(bob, TurnRequest::new("complete that milk task"))
        .await?;

    assert_eq!(
        result.reply(),
        "I couldn't find a task with that description. Would you like to see your current tasks?"
    );
    assert!(result.operations().is_empty());

    let stored = store.get(alice, task.id()).await?;
    assert!(!stored.completed());
    Ok(())
}
