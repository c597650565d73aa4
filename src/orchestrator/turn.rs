//! The turn state machine driving one conversational exchange.
//!
//! Each turn is an iterative bounded loop, not recursion: the capability is
//! asked for an action, a requested operation is resolved and dispatched,
//! its result is fed back as tool output, and control returns to the
//! capability until it replies or the round budget runs out. All state is
//! carried in explicit arguments and the durable store; nothing survives
//! the turn in process memory.

use crate::chat::domain::{ConversationId, Message, Role};
use crate::chat::error::ChatRepositoryError;
use crate::chat::ports::repository::{ConversationRepository, MessageRepository, TurnWriter};
use crate::chat::services::{PersistTurnError, TranscriptError, TranscriptLoader, TurnPersister};
use crate::identity::UserId;
use crate::orchestrator::catalog::{
    OperationCall, OperationRecord, TaskSelector, ToolDefinition, operation_catalog,
};
use crate::orchestrator::ports::{
    CapabilityAction, LanguageCapability, TranscriptEntry, TurnPrompt,
};
use crate::orchestrator::prompt::{PromptError, render_instructions};
use crate::orchestrator::reply;
use crate::orchestrator::resolver::{Resolution, resolve_reference};
use crate::task::domain::{StatusFilter, Task, TaskDescription, TaskId};
use crate::task::ports::TaskRepository;
use crate::task::services::{CreateTaskRequest, TaskStore, TaskStoreError, UpdateTaskRequest};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Maximum capability/dispatch rounds within one turn.
pub const MAX_TOOL_ROUNDS: usize = 4;

/// Timeout for one language-capability round trip.
pub const CAPABILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for one task-store dispatch.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One inbound turn request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    utterance: String,
    conversation_id: Option<ConversationId>,
}

impl TurnRequest {
    /// Creates a request starting a new conversation.
    #[must_use]
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            conversation_id: None,
        }
    }

    /// Continues an existing conversation.
    #[must_use]
    pub const fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

/// The completed turn handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    conversation_id: ConversationId,
    reply: String,
    operations: Vec<OperationRecord>,
    responded_at: DateTime<Utc>,
}

impl TurnResult {
    /// Returns the conversation the turn was appended to.
    #[must_use]
    pub const fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Returns the final assistant reply.
    #[must_use]
    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// Returns the operations dispatched during the turn, in order.
    #[must_use]
    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    /// Returns the response timestamp.
    #[must_use]
    pub const fn responded_at(&self) -> DateTime<Utc> {
        self.responded_at
    }
}

/// Request-level turn failures.
///
/// Everything here rejects the request outright; recoverable conversational
/// outcomes (ambiguity, missing tasks, validation) become chat replies and
/// the turn completes normally.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The utterance was empty after trimming.
    #[error("utterance must not be empty")]
    EmptyUtterance,

    /// The conversation does not exist for this user. Also covers
    /// conversations owned by someone else.
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    /// A chat store read failed before the turn ran.
    #[error(transparent)]
    Chat(#[from] ChatRepositoryError),

    /// Persisting the finished turn failed. Task mutations dispatched
    /// earlier in the turn are not rolled back.
    #[error(transparent)]
    Persistence(#[from] PersistTurnError),
}

/// Outcome of one dispatch attempt.
enum DispatchFlow {
    /// The operation ran; feed the result back and continue resolving.
    Continue {
        record: OperationRecord,
        confirmation: String,
    },
    /// The turn short-circuits with this reply text.
    Finish(String),
}

/// A call whose task reference has been resolved to an identifier.
struct ResolvedCall {
    name: &'static str,
    arguments: Value,
    action: ResolvedAction,
}

enum ResolvedAction {
    Create(CreateTaskRequest),
    List(StatusFilter),
    Complete(TaskId),
    Delete(TaskId),
    Update(TaskId, UpdateTaskRequest),
}

/// Stateless engine running one conversational turn end to end.
pub struct TurnEngine<R, CV, MS, W, L, C>
where
    R: TaskRepository,
    CV: ConversationRepository,
    MS: MessageRepository,
    W: TurnWriter,
    L: LanguageCapability,
    C: Clock + Send + Sync,
{
    tasks: TaskStore<R, C>,
    loader: TranscriptLoader<CV, MS>,
    persister: TurnPersister<W, MS, C>,
    capability: Arc<L>,
    clock: Arc<C>,
    instructions: String,
    catalog: Vec<ToolDefinition>,
}

impl<R, CV, MS, W, L, C> TurnEngine<R, CV, MS, W, L, C>
where
    R: TaskRepository,
    CV: ConversationRepository,
    MS: MessageRepository,
    W: TurnWriter,
    L: LanguageCapability,
    C: Clock + Send + Sync,
{
    /// Creates an engine over the given collaborators.
    ///
    /// The instruction prompt is rendered once here from the operation
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError`] when the instruction template cannot be
    /// rendered.
    pub fn new(
        tasks: TaskStore<R, C>,
        loader: TranscriptLoader<CV, MS>,
        persister: TurnPersister<W, MS, C>,
        capability: Arc<L>,
        clock: Arc<C>,
    ) -> Result<Self, PromptError> {
        let catalog = operation_catalog();
        let instructions = render_instructions(&catalog)?;
        Ok(Self {
            tasks,
            loader,
            persister,
            capability,
            clock,
            instructions,
            catalog,
        })
    }

    /// Runs one turn: context load, bounded intent resolution, dispatch,
    /// finalisation, and atomic persistence.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::EmptyUtterance`] for a blank utterance,
    /// [`TurnError::ConversationNotFound`] when the conversation is absent
    /// or foreign, [`TurnError::Chat`] on a failed context read, and
    /// [`TurnError::Persistence`] when the finished turn cannot be written.
    /// Recoverable conversational failures never surface here; they become
    /// the reply text of a successful turn.
    pub async fn run_turn(
        &self,
        user_id: UserId,
        request: TurnRequest,
    ) -> Result<TurnResult, TurnError> {
        let utterance = request.utterance.trim().to_owned();
        if utterance.is_empty() {
            return Err(TurnError::EmptyUtterance);
        }

        let transcript = self
            .loader
            .load(user_id, request.conversation_id)
            .await
            .map_err(|err| match err {
                TranscriptError::NotFound(id) | TranscriptError::NotOwned(id) => {
                    TurnError::ConversationNotFound(id)
                }
                TranscriptError::Repository(repository_err) => TurnError::Chat(repository_err),
            })?;
        let (conversation, messages) = transcript.into_parts();

        let mut entries: Vec<TranscriptEntry> =
            messages.iter().map(entry_from_message).collect();
        entries.push(TranscriptEntry::User(utterance.clone()));

        let mut operations = Vec::new();
        let reply_text = self
            .resolve_reply(user_id, &mut entries, &mut operations)
            .await;

        let persisted = self
            .persister
            .persist(user_id, conversation, &utterance, &reply_text)
            .await?;

        Ok(TurnResult {
            conversation_id: persisted.id(),
            reply: reply_text,
            operations,
            responded_at: self.clock.utc(),
        })
    }

    /// The RESOLVING/DISPATCHING loop, bounded by [`MAX_TOOL_ROUNDS`].
    async fn resolve_reply(
        &self,
        user_id: UserId,
        entries: &mut Vec<TranscriptEntry>,
        operations: &mut Vec<OperationRecord>,
    ) -> String {
        let mut last_confirmation: Option<String> = None;

        for round in 0..MAX_TOOL_ROUNDS {
            let action = match self.next_action(entries).await {
                Ok(action) => action,
                Err(reason) => {
                    error!(%user_id, round, reason, "language capability unavailable");
                    return reply::apology();
                }
            };

            match action {
                CapabilityAction::Reply(text) => {
                    // Mutations are confirmed from the store's own result,
                    // never from capability paraphrase.
                    return last_confirmation.unwrap_or(text);
                }
                CapabilityAction::Invoke(call) => {
                    debug!(%user_id, operation = call.name(), round, "dispatching operation");
                    match self.dispatch(user_id, call).await {
                        DispatchFlow::Continue {
                            record,
                            confirmation,
                        } => {
                            entries.push(TranscriptEntry::ToolCall {
                                name: record.name.clone(),
                                arguments: record.arguments.clone(),
                            });
                            entries.push(TranscriptEntry::ToolResult {
                                name: record.name.clone(),
                                payload: record.result.clone(),
                            });
                            operations.push(record);
                            last_confirmation = Some(confirmation);
                        }
                        DispatchFlow::Finish(text) => return text,
                    }
                }
            }
        }

        warn!(%user_id, limit = MAX_TOOL_ROUNDS, "tool round limit exceeded");
        reply::apology()
    }

    async fn next_action(&self, entries: &[TranscriptEntry]) -> Result<CapabilityAction, String> {
        let prompt = TurnPrompt {
            instructions: &self.instructions,
            transcript: entries,
            catalog: &self.catalog,
        };
        match timeout(CAPABILITY_TIMEOUT, self.capability.next_action(prompt)).await {
            Ok(Ok(action)) => Ok(action),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err("timed out".to_owned()),
        }
    }

    /// DISPATCHING: resolve the task reference, then run the store call
    /// under its timeout.
    async fn dispatch(&self, user_id: UserId, call: OperationCall) -> DispatchFlow {
        let resolved = match self.resolve_call(user_id, call).await {
            Ok(resolved) => resolved,
            Err(text) => return DispatchFlow::Finish(text),
        };
        let name = resolved.name;
        let arguments = resolved.arguments.clone();

        match timeout(DISPATCH_TIMEOUT, self.execute(user_id, resolved.action)).await {
            Ok(Ok((result, confirmation))) => DispatchFlow::Continue {
                record: OperationRecord {
                    name: name.to_owned(),
                    arguments,
                    result,
                },
                confirmation,
            },
            Ok(Err(err)) => DispatchFlow::Finish(dispatch_error(user_id, name, &err)),
            Err(_) => {
                error!(%user_id, operation = name, "task operation timed out");
                DispatchFlow::Finish(reply::apology())
            }
        }
    }

    /// Turns a requested call into a dispatchable one, applying the
    /// missing-argument policy and resolving phrase references. An `Err`
    /// carries the reply text that finalises the turn without any store
    /// call.
    async fn resolve_call(
        &self,
        user_id: UserId,
        call: OperationCall,
    ) -> Result<ResolvedCall, String> {
        match call {
            OperationCall::AddTask { title, description } => {
                if title.trim().is_empty() {
                    return Err(reply::clarify_missing_title());
                }
                let details = description.filter(|text| !text.trim().is_empty());
                let mut request = CreateTaskRequest::new(title.clone());
                if let Some(ref text) = details {
                    request = request.with_description(text.clone());
                }
                Ok(ResolvedCall {
                    name: "add_task",
                    arguments: json!({ "title": title, "description": details }),
                    action: ResolvedAction::Create(request),
                })
            }
            OperationCall::ListTasks { status } => Ok(ResolvedCall {
                name: "list_tasks",
                arguments: json!({ "status": status.as_str() }),
                action: ResolvedAction::List(status),
            }),
            OperationCall::CompleteTask { selector } => {
                let task_id = self.resolve_selector(user_id, selector).await?;
                Ok(ResolvedCall {
                    name: "complete_task",
                    arguments: json!({ "task_id": task_id }),
                    action: ResolvedAction::Complete(task_id),
                })
            }
            OperationCall::DeleteTask { selector } => {
                let task_id = self.resolve_selector(user_id, selector).await?;
                Ok(ResolvedCall {
                    name: "delete_task",
                    arguments: json!({ "task_id": task_id }),
                    action: ResolvedAction::Delete(task_id),
                })
            }
            OperationCall::UpdateTask {
                selector,
                title,
                description,
            } => {
                let new_title = title.filter(|text| !text.trim().is_empty());
                let new_description = description.filter(|text| !text.trim().is_empty());
                if new_title.is_none() && new_description.is_none() {
                    return Err(reply::clarify_update());
                }
                let task_id = self.resolve_selector(user_id, selector).await?;
                let mut request = UpdateTaskRequest::new();
                if let Some(ref text) = new_title {
                    request = request.with_title(text.clone());
                }
                if let Some(ref text) = new_description {
                    request = request.with_description(text.clone());
                }
                Ok(ResolvedCall {
                    name: "update_task",
                    arguments: json!({
                        "task_id": task_id,
                        "title": new_title,
                        "description": new_description,
                    }),
                    action: ResolvedAction::Update(task_id, request),
                })
            }
        }
    }

    /// Resolves a selector to a task identifier, short-circuiting with a
    /// disambiguation or not-found reply when the reference is unusable.
    async fn resolve_selector(
        &self,
        user_id: UserId,
        selector: TaskSelector,
    ) -> Result<TaskId, String> {
        let phrase = match selector {
            TaskSelector::Id(task_id) => return Ok(task_id),
            TaskSelector::Phrase(phrase) => phrase,
        };

        let tasks = match self.tasks.list(user_id, StatusFilter::All).await {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(%user_id, error = %err, "task listing for reference resolution failed");
                return Err(reply::apology());
            }
        };

        match resolve_reference(&phrase, &tasks) {
            Resolution::Match(task) => Ok(task.id()),
            Resolution::Ambiguous(candidates) => Err(reply::disambiguation(&candidates)),
            Resolution::NotFound => Err(reply::reference_not_found()),
        }
    }

    async fn execute(
        &self,
        user_id: UserId,
        action: ResolvedAction,
    ) -> Result<(Value, String), TaskStoreError> {
        match action {
            ResolvedAction::Create(request) => {
                let task = self.tasks.create(user_id, request).await?;
                Ok((task_payload(&task), reply::created(&task)))
            }
            ResolvedAction::List(filter) => {
                let tasks = self.tasks.list(user_id, filter).await?;
                let payload = json!({
                    "tasks": tasks.iter().map(task_payload).collect::<Vec<_>>(),
                    "total": tasks.len(),
                    "status_filter": filter.as_str(),
                });
                Ok((payload, reply::listed(&tasks, filter)))
            }
            ResolvedAction::Complete(task_id) => {
                let task = self.tasks.complete(user_id, task_id).await?;
                Ok((task_payload(&task), reply::completed(&task)))
            }
            ResolvedAction::Delete(task_id) => {
                let task = self.tasks.delete(user_id, task_id).await?;
                Ok((
                    json!({ "task_id": task_id, "deleted": true }),
                    reply::deleted(&task),
                ))
            }
            ResolvedAction::Update(task_id, request) => {
                let task = self.tasks.update(user_id, task_id, request).await?;
                Ok((task_payload(&task), reply::updated(&task)))
            }
        }
    }
}

fn dispatch_error(user_id: UserId, name: &str, err: &TaskStoreError) -> String {
    match err {
        TaskStoreError::NotFound(_) => reply::reference_not_found(),
        TaskStoreError::Validation(domain_err) => reply::invalid_input(domain_err),
        TaskStoreError::Repository(repository_err) => {
            error!(%user_id, operation = name, error = %repository_err, "task operation failed");
            reply::apology()
        }
    }
}

fn entry_from_message(message: &Message) -> TranscriptEntry {
    match message.role() {
        Role::User => TranscriptEntry::User(message.content().to_owned()),
        Role::Assistant => TranscriptEntry::Assistant(message.content().to_owned()),
    }
}

fn task_payload(task: &Task) -> Value {
    json!({
        "task_id": task.id(),
        "title": task.title().as_str(),
        "description": task.description().map(TaskDescription::as_str),
        "completed": task.completed(),
        "created_at": task.created_at(),
        "updated_at": task.updated_at(),
    })
}
