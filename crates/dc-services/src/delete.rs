//! Confirmation before a delete

use std::future::Future;

use dc_core::{DcResult, EntityId};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_MESSAGE: &str = "Are you sure you want to delete it?";
pub const PROJECT_MESSAGE: &str =
    "Are you sure you want to delete this project? This will also delete all associated documents.";
pub const PROFESSIONAL_MESSAGE: &str = "Are you sure you want to delete this professional?";
pub const MUNICIPALITY_MESSAGE: &str =
    "Are you sure you want to delete this municipality? This will also delete all associated templates.";
pub const TEMPLATE_MESSAGE: &str = "Are you sure you want to delete this template?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteState {
    Idle,
    Confirming,
    Deleting,
}

/// Request, then confirm or cancel. Only a confirmed request runs the
/// delete, and it runs once.
#[derive(Debug, Clone)]
pub struct DeleteFlow {
    state: DeleteState,
    target: Option<EntityId>,
    message: String,
}

impl Default for DeleteFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl DeleteFlow {
    pub fn new() -> Self {
        Self {
            state: DeleteState::Idle,
            target: None,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }

    pub fn state(&self) -> DeleteState {
        self.state
    }

    pub fn target(&self) -> Option<&EntityId> {
        self.target.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Ask for confirmation to delete `id`. Ignored while a delete runs.
    pub fn request(&mut self, id: EntityId, message: Option<&str>) -> &str {
        if self.state != DeleteState::Deleting {
            self.message = message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_MESSAGE)
                .to_string();
            self.target = Some(id);
            self.state = DeleteState::Confirming;
        }
        &self.message
    }

    pub fn cancel(&mut self) {
        if self.state == DeleteState::Confirming {
            self.state = DeleteState::Idle;
            self.target = None;
        }
    }

    /// Run `delete` for the pending target.
    ///
    /// Returns `Ok(false)` without calling it when nothing awaits
    /// confirmation. Either outcome closes the flow.
    pub async fn confirm<F, Fut>(&mut self, delete: F) -> DcResult<bool>
    where
        F: FnOnce(EntityId) -> Fut,
        Fut: Future<Output = DcResult<()>>,
    {
        if self.state != DeleteState::Confirming {
            debug!(state = ?self.state, "Confirm ignored");
            return Ok(false);
        }
        let Some(id) = self.target.take() else {
            self.state = DeleteState::Idle;
            return Ok(false);
        };

        self.state = DeleteState::Deleting;
        let result = delete(id).await;
        self.state = DeleteState::Idle;
        result.map(|()| true)
    }
}
