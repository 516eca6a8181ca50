use tracing::{debug, info};

/// AI-suggested command awaiting a human decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProposal {
    pub command: String,
    pub working_directory: String,
}

impl CommandProposal {
    pub fn new(command: impl Into<String>, working_directory: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_directory: working_directory.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateState {
    #[default]
    NoPending,
    Pending(CommandProposal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    Propose(CommandProposal),
    Approve,
    Cancel,
}

/// Pure gate transition.
///
/// The second element is the proposal released for execution; only `Approve`
/// from `Pending` ever yields one.
pub fn transition(state: GateState, event: GateEvent) -> (GateState, Option<CommandProposal>) {
    match (state, event) {
        (_, GateEvent::Propose(proposal)) => (GateState::Pending(proposal), None),
        (GateState::Pending(proposal), GateEvent::Approve) => (GateState::NoPending, Some(proposal)),
        (GateState::NoPending, GateEvent::Approve) => (GateState::NoPending, None),
        (_, GateEvent::Cancel) => (GateState::NoPending, None),
    }
}

/// Holds at most one pending proposal and releases it at most once.
#[derive(Debug, Clone, Default)]
pub struct CommandApprovalGate {
    state: GateState,
}

impl CommandApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn pending(&self) -> Option<&CommandProposal> {
        match &self.state {
            GateState::Pending(proposal) => Some(proposal),
            GateState::NoPending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// Make `proposal` the only actionable suggestion.
    ///
    /// Returns the proposal it replaced, which can no longer be executed.
    pub fn propose(&mut self, proposal: CommandProposal) -> Option<CommandProposal> {
        let replaced = self.pending().cloned();
        if let Some(previous) = &replaced {
            debug!(command = %previous.command, "discarding superseded proposal");
        }
        self.step(GateEvent::Propose(proposal));
        replaced
    }

    /// Release the pending proposal for execution. No-op without one.
    pub fn approve(&mut self) -> Option<CommandProposal> {
        let released = self.step(GateEvent::Approve);
        if let Some(proposal) = &released {
            info!(command = %proposal.command, "proposal approved");
        }
        released
    }

    /// Approve and hand the proposal straight to `execute`.
    pub fn approve_with<R>(&mut self, execute: impl FnOnce(CommandProposal) -> R) -> Option<R> {
        self.approve().map(execute)
    }

    /// Drop the pending proposal without running it.
    pub fn cancel(&mut self) -> Option<CommandProposal> {
        let discarded = self.pending().cloned();
        self.step(GateEvent::Cancel);
        discarded
    }

    fn step(&mut self, event: GateEvent) -> Option<CommandProposal> {
        let (next, released) = transition(std::mem::take(&mut self.state), event);
        self.state = next;
        released
    }
}
