//! Scripted language capability for tests.

use crate::orchestrator::catalog::OperationCall;
use crate::orchestrator::ports::{CapabilityAction, CapabilityError, LanguageCapability, TurnPrompt};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Capability stand-in replaying a fixed sequence of actions.
///
/// Each call to [`LanguageCapability::next_action`] pops the next scripted
/// outcome; an exhausted script reports a capability failure, which keeps a
/// misbehaving test from looping.
#[derive(Debug, Default)]
pub struct ScriptedCapability {
    script: Mutex<VecDeque<Result<CapabilityAction, CapabilityError>>>,
}

impl ScriptedCapability {
    /// Creates a capability with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a final reply to the script.
    #[must_use]
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(CapabilityAction::Reply(text.into())));
        self
    }

    /// Appends an operation request to the script.
    #[must_use]
    pub fn then_invoke(self, call: OperationCall) -> Self {
        self.push(Ok(CapabilityAction::Invoke(call)));
        self
    }

    /// Appends a capability failure to the script.
    #[must_use]
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(CapabilityError(reason.into())));
        self
    }

    fn push(&self, entry: Result<CapabilityAction, CapabilityError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }
}

#[async_trait]
impl LanguageCapability for ScriptedCapability {
    async fn next_action(
        &self,
        _prompt: TurnPrompt<'_>,
    ) -> Result<CapabilityAction, CapabilityError> {
        let mut script = self
            .script
            .lock()
            .map_err(|err| CapabilityError(err.to_string()))?;
        script
            .pop_front()
            .unwrap_or_else(|| Err(CapabilityError("script exhausted".to_owned())))
    }
}
