//! Reference resolution from natural-language phrases to task records.
//!
//! The resolver never guesses among ties: a phrase matching two or more
//! tasks yields [`Resolution::Ambiguous`] so the turn can ask the user to
//! pick one. Silent wrong-task mutation is the failure mode this module
//! exists to prevent.

use crate::task::domain::{Task, TaskId};
use std::collections::BTreeSet;

/// Conversational filler stripped before matching. Imperative verbs and
/// list vocabulary carry no information about which task is meant.
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "my", "i", "me", "to", "of", "off", "it", "this", "that", "one", "please",
    "task", "tasks", "todo", "todos", "item", "list", "mark", "as", "done", "complete",
    "completed", "finish", "finished", "delete", "remove", "update", "change", "rename", "set",
    "make", "from", "on", "for", "about", "need", "want",
];

/// A matching task offered for disambiguation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCandidate {
    /// Identifier of the candidate task.
    pub id: TaskId,
    /// Title of the candidate task.
    pub title: String,
}

/// Outcome of resolving a phrase against the user's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one task matched.
    Match(Task),
    /// Two or more tasks matched; the caller must ask the user to pick.
    Ambiguous(Vec<TaskCandidate>),
    /// No task matched.
    NotFound,
}

/// Resolves a natural-language task reference against the given tasks.
///
/// Matching is purely lexical: the phrase and each task's title plus
/// description are lowered to filler-stripped token sets, and a task
/// qualifies when the token overlap clears an integer-ratio threshold or
/// when one normalised string contains the other.
#[must_use]
pub fn resolve_reference(phrase: &str, tasks: &[Task]) -> Resolution {
    let phrase_tokens = significant_tokens(phrase);
    let phrase_text = phrase_tokens.iter().cloned().collect::<Vec<_>>().join(" ");

    let mut candidates: Vec<&Task> = tasks
        .iter()
        .filter(|task| {
            let task_text = searchable_text(task);
            let task_tokens = significant_tokens(&task_text);
            qualifies(&phrase_tokens, &phrase_text, &task_tokens)
        })
        .collect();

    match candidates.len() {
        0 => Resolution::NotFound,
        1 => candidates
            .pop()
            .map_or(Resolution::NotFound, |task| Resolution::Match(task.clone())),
        _ => Resolution::Ambiguous(
            candidates
                .into_iter()
                .map(|task| TaskCandidate {
                    id: task.id(),
                    title: task.title().as_str().to_owned(),
                })
                .collect(),
        ),
    }
}

fn searchable_text(task: &Task) -> String {
    task.description().map_or_else(
        || task.title().as_str().to_owned(),
        |description| format!("{} {}", task.title().as_str(), description.as_str()),
    )
}

fn significant_tokens(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty() && !FILLER_WORDS.contains(token))
        .map(str::to_owned)
        .collect()
}

/// Qualification test over token sets, in integer arithmetic: a task is a
/// candidate when at least one significant token is shared and the overlap
/// ratio `|intersection| / |union|` is at least one quarter, or when one
/// filler-stripped string contains the other.
fn qualifies(
    phrase_tokens: &BTreeSet<String>,
    phrase_text: &str,
    task_tokens: &BTreeSet<String>,
) -> bool {
    if phrase_tokens.is_empty() || task_tokens.is_empty() {
        return false;
    }

    let intersection = phrase_tokens.intersection(task_tokens).count();
    let union = phrase_tokens.union(task_tokens).count();
    if intersection >= 1 && intersection.saturating_mul(4) >= union {
        return true;
    }

    let task_text = task_tokens.iter().cloned().collect::<Vec<_>>().join(" ");
    !phrase_text.is_empty() && (task_text.contains(phrase_text) || phrase_text.contains(&task_text))
}
