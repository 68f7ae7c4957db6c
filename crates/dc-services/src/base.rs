//! Shared plumbing for contracted flows

use std::sync::Arc;

use dc_contracts::Contract;
use dc_core::{DcError, DcResult};
use tracing::warn;

use crate::errors::describe_error;
use crate::notify::{Notifier, NotifierExt};

/// What every flow needs besides its backend
#[derive(Clone)]
pub struct ServiceContext {
    notifier: Arc<dyn Notifier>,
}

impl ServiceContext {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notifier.success(message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notifier.info(message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notifier.error(message);
    }

    /// Run `contract` over `entity`. A failure is reported with the first
    /// message, as a form would show it, and nothing else happens.
    pub fn validate<T, C>(&self, contract: &C, entity: &T) -> DcResult<()>
    where
        C: Contract<T>,
    {
        contract.validate(entity).map_err(|errors| {
            if let Some(message) = errors.first_message() {
                self.notifier.error(message);
            }
            DcError::Validation(errors)
        })
    }

    /// Report `err` and hand it back
    pub fn fail(&self, err: DcError, fallback: &str) -> DcError {
        warn!(error = %err, "{fallback}");
        self.notifier.error(describe_error(&err, fallback));
        err
    }

    /// Report the error in `result`, if any
    pub fn report<T>(&self, result: DcResult<T>, fallback: &str) -> DcResult<T> {
        result.map_err(|err| self.fail(err, fallback))
    }
}
