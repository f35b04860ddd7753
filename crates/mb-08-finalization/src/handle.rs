//! Cloneable handle onto a running orchestrator.

use std::sync::Arc;

use mb_07_submission::{SubmissionAuditLog, SubmissionRecord};
use tokio::sync::{mpsc, oneshot, watch};

use crate::domain::BridgeStatus;
use crate::error::{FinalizationError, FinalizationResult};

/// Requests served inside the orchestrator loop.
#[derive(Debug)]
pub enum OrchestratorCommand {
    /// Leave `Halted`; replies whether a halt was cleared.
    ClearHalt(oneshot::Sender<bool>),
    /// Fresh status snapshot.
    Status(oneshot::Sender<BridgeStatus>),
}

/// Read access to status and the operator controls.
#[derive(Clone)]
pub struct FinalizationHandle {
    status: watch::Receiver<BridgeStatus>,
    commands: mpsc::Sender<OrchestratorCommand>,
    audit: Arc<SubmissionAuditLog>,
}

impl FinalizationHandle {
    pub(crate) fn new(
        status: watch::Receiver<BridgeStatus>,
        commands: mpsc::Sender<OrchestratorCommand>,
        audit: Arc<SubmissionAuditLog>,
    ) -> Self {
        Self {
            status,
            commands,
            audit,
        }
    }

    /// Last published status. Never blocks.
    pub fn status(&self) -> BridgeStatus {
        self.status.borrow().clone()
    }

    /// Status as of now, served by the loop.
    pub async fn refresh_status(&self) -> FinalizationResult<BridgeStatus> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(OrchestratorCommand::Status(tx))
            .await
            .map_err(|_| FinalizationError::ChannelClosed)?;
        rx.await.map_err(|_| FinalizationError::ChannelClosed)
    }

    /// Watch status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<BridgeStatus> {
        self.status.clone()
    }

    /// Ask the loop to clear an emergency halt.
    pub async fn clear_halt(&self) -> FinalizationResult<bool> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(OrchestratorCommand::ClearHalt(tx))
            .await
            .map_err(|_| FinalizationError::ChannelClosed)?;
        rx.await.map_err(|_| FinalizationError::ChannelClosed)
    }

    /// Submission audit records, oldest first.
    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.audit.all()
    }

    /// Audit record for one parent height.
    pub fn submission_for(&self, parent_height: u64) -> Option<SubmissionRecord> {
        self.audit.for_parent(parent_height)
    }
}
