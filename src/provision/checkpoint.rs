use crate::authority::{CertificateHandle, ValidationChallenge};
use serde::{Deserialize, Serialize};

/// The phase a suspended attempt stopped in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointPhase {
    Requested,
    RecordPublished,
    Polling,
}

/// Progress carried from one invocation of a logical attempt to the next, embedded in the
/// re-invocation event. `attempt` is the number of the invocation that will consume it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Checkpoint {
    pub certificate_handle: CertificateHandle,
    pub attempt: u32,
    pub phase: CheckpointPhase,
}

/// What a single invocation produced. Everything but `InProgress` is terminal and reported
/// to the orchestrator.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "Outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningOutcome {
    Success { certificate_handle: CertificateHandle },
    Acknowledged,
    Failed { reason: String },
    InProgress { checkpoint: Checkpoint },
}

impl ProvisioningOutcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProvisioningOutcome::InProgress { .. })
    }
}

/// Where the state machine is within one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    Starting,
    Requested {
        handle: CertificateHandle,
        // Not checkpointed; a resumed attempt reads it from the authority again.
        challenge: Option<ValidationChallenge>,
    },
    RecordPublished {
        handle: CertificateHandle,
    },
    Polling {
        handle: CertificateHandle,
    },
}

impl Phase {
    pub(crate) fn resume(checkpoint: &Checkpoint) -> Self {
        let handle = checkpoint.certificate_handle.clone();
        match checkpoint.phase {
            CheckpointPhase::Requested => Phase::Requested {
                handle,
                challenge: None,
            },
            CheckpointPhase::RecordPublished => Phase::RecordPublished { handle },
            CheckpointPhase::Polling => Phase::Polling { handle },
        }
    }

    /// The checkpoint to resume this phase in invocation `next_attempt`. `None` before a
    /// certificate has been requested.
    pub(crate) fn checkpoint(&self, next_attempt: u32) -> Option<Checkpoint> {
        let (handle, phase) = match self {
            Phase::Starting => return None,
            Phase::Requested { handle, .. } => (handle, CheckpointPhase::Requested),
            Phase::RecordPublished { handle } => (handle, CheckpointPhase::RecordPublished),
            Phase::Polling { handle } => (handle, CheckpointPhase::Polling),
        };
        Some(Checkpoint {
            certificate_handle: handle.clone(),
            attempt: next_attempt,
            phase,
        })
    }
}
