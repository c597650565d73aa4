//! Shared helpers for in-memory integration tests.

use std::sync::Arc;

use eyre::WrapErr;
use factotum::chat::adapters::memory::InMemoryChatStore;
use factotum::chat::services::{ConversationDirectory, TranscriptLoader, TurnPersister};
use factotum::identity::UserId;
use factotum::orchestrator::adapters::ScriptedCapability;
use factotum::orchestrator::turn::TurnEngine;
use factotum::task::adapters::memory::InMemoryTaskRepository;
use factotum::task::domain::Task;
use factotum::task::services::{CreateTaskRequest, TaskStore};
use mockable::DefaultClock;

/// Turn engine wired to the in-memory adapters and a scripted capability.
pub type TestEngine = TurnEngine<
    InMemoryTaskRepository,
    InMemoryChatStore,
    InMemoryChatStore,
    InMemoryChatStore,
    ScriptedCapability,
    DefaultClock,
>;

/// One engine under test together with direct handles onto its stores.
pub struct World {
    /// The engine under test.
    pub engine: TestEngine,
    /// Task store sharing the engine's repository, for seeding and checks.
    pub store: TaskStore<InMemoryTaskRepository, DefaultClock>,
    /// Directory reads over the engine's chat store.
    pub directory: ConversationDirectory<InMemoryChatStore, InMemoryChatStore>,
}

/// Builds a world around the given capability script.
///
/// # Errors
///
/// Returns an error if the engine's instruction template fails to render.
pub fn world(script: ScriptedCapability) -> Result<World, eyre::Report> {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let chat = Arc::new(InMemoryChatStore::new());
    let clock = Arc::new(DefaultClock);

    let store = TaskStore::new(Arc::clone(&tasks), Arc::clone(&clock));
    let loader = TranscriptLoader::new(Arc::clone(&chat), Arc::clone(&chat));
    let persister = TurnPersister::new(Arc::clone(&chat), Arc::clone(&chat), Arc::clone(&clock));
    let directory = ConversationDirectory::new(Arc::clone(&chat), Arc::clone(&chat));
    let engine = TurnEngine::new(store.clone(), loader, persister, Arc::new(script), clock)
        .wrap_err("construct turn engine")?;

    Ok(World {
        engine,
        store,
        directory,
    })
}

/// Seeds one task for the given user and returns it.
///
/// # Errors
///
/// Returns an error if the store rejects the seed task.
pub async fn seed_task(world: &World, user: UserId, title: &str) -> Result<Task, eyre::Report> {
    world
        .store
        .create(user, CreateTaskRequest::new(title))
        .await
        .wrap_err_with(|| format!("seed task '{title}'"))
}
