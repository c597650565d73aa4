//! Deterministic user-facing reply text.
//!
//! Confirmations, clarifications, and error replies are rendered here, per
//! operation kind, so a dispatched mutation is always acknowledged with
//! text derived from the store's actual result rather than capability
//! paraphrase. No internal error detail ever reaches these strings.

use crate::orchestrator::resolver::TaskCandidate;
use crate::task::domain::{StatusFilter, Task, TaskDomainError};

/// Confirmation for a created task.
#[must_use]
pub fn created(task: &Task) -> String {
    format!("Done! I've added '{}' to your list.", task.title())
}

/// Confirmation for a completed task.
#[must_use]
pub fn completed(task: &Task) -> String {
    format!("Great! I've marked '{}' as complete.", task.title())
}

/// Confirmation for a deleted task.
#[must_use]
pub fn deleted(task: &Task) -> String {
    format!("I've removed '{}' from your list.", task.title())
}

/// Confirmation for an updated task.
#[must_use]
pub fn updated(task: &Task) -> String {
    format!("Got it! '{}' has been updated.", task.title())
}

/// Rendering of a task listing, including the per-filter empty states.
#[must_use]
pub fn listed(tasks: &[Task], filter: StatusFilter) -> String {
    if tasks.is_empty() {
        return match filter {
            StatusFilter::All => {
                "Your list is empty. Would you like to add something?".to_owned()
            }
            StatusFilter::Pending => {
                "Great! You've completed everything on your list. Want to add more tasks?"
                    .to_owned()
            }
            StatusFilter::Completed => {
                "You haven't completed any tasks yet. Keep going!".to_owned()
            }
        };
    }

    let mut text = match filter {
        StatusFilter::All => "Here's your full list:".to_owned(),
        StatusFilter::Pending => "Here's what you need to do:".to_owned(),
        StatusFilter::Completed => "You've completed:".to_owned(),
    };
    for (index, task) in tasks.iter().enumerate() {
        let marker = if matches!(filter, StatusFilter::All) && task.completed() {
            " (done)"
        } else {
            ""
        };
        text.push_str(&format!(
            "\n{}. {}{marker}",
            index.saturating_add(1),
            task.title()
        ));
    }
    text
}

/// Disambiguation question listing every matching candidate.
#[must_use]
pub fn disambiguation(candidates: &[TaskCandidate]) -> String {
    let mut text = "I found multiple tasks that match. Which one did you mean?".to_owned();
    for (index, candidate) in candidates.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {}",
            index.saturating_add(1),
            candidate.title
        ));
    }
    text
}

/// Reply when a task reference matched nothing.
#[must_use]
pub fn reference_not_found() -> String {
    "I couldn't find a task with that description. Would you like to see your current tasks?"
        .to_owned()
}

/// Clarifying question for a creation request with no usable title.
#[must_use]
pub fn clarify_missing_title() -> String {
    "What would you like to add to your list?".to_owned()
}

/// Clarifying question for an update request with no fields.
#[must_use]
pub fn clarify_update() -> String {
    "What would you like to change about this task?".to_owned()
}

/// Friendly rendering of an input-validation failure.
#[must_use]
pub fn invalid_input(error: &TaskDomainError) -> String {
    match error {
        TaskDomainError::EmptyTitle => clarify_missing_title(),
        TaskDomainError::TitleTooLong(_) => {
            "That title is a bit long for me. Could you shorten it to 200 characters or fewer?"
                .to_owned()
        }
        TaskDomainError::DescriptionTooLong(_) => {
            "Those details are a bit long for me. Could you keep the description under 2000 characters?"
                .to_owned()
        }
        TaskDomainError::NoFieldsToUpdate => clarify_update(),
    }
}

/// Generic apology for capability or store failures and round exhaustion.
#[must_use]
pub fn apology() -> String {
    "Sorry, I ran into a problem handling that. Please try again.".to_owned()
}
