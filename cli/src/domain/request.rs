//! Per-node provisioning request tracked through a batch.

use nodefleet_common::{NameError, Node, instance_name_from_host_name, validate_instance_name};
use thiserror::Error;

use crate::domain::operation::Operation;

/// Progress of a single request. Transitions only move forward:
/// `Pending → Submitted → {Success, Error}`, or `Pending → Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Submitted,
    Success,
    Error,
}

impl RequestStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// Rejected status transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid request transition {from:?} -> {to:?} for instance [{instance}]")]
pub struct InvalidTransition {
    pub instance: String,
    pub from: RequestStatus,
    pub to: RequestStatus,
}

/// One node being provisioned in a batch.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    node: Node,
    instance_name: String,
    status: RequestStatus,
    message: Option<String>,
    operation: Option<Operation>,
    result: Option<Operation>,
    instance_deleted: bool,
}

impl ProvisionRequest {
    /// Creates a pending request for `node`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node's host name is not a valid instance name.
    pub fn new(node: Node) -> Result<Self, NameError> {
        let instance_name = instance_name_from_host_name(&node.name).to_string();
        validate_instance_name(&instance_name)?;
        Ok(Self {
            node,
            instance_name,
            status: RequestStatus::Pending,
            message: None,
            operation: None,
            result: None,
            instance_deleted: false,
        })
    }

    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    #[must_use]
    pub fn into_node(self) -> Node {
        self.node
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    #[must_use]
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Operation handle returned by the create call.
    #[must_use]
    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    /// Terminal operation, once polled to completion.
    #[must_use]
    pub fn result(&self) -> Option<&Operation> {
        self.result.as_ref()
    }

    /// Whether a create call was accepted, so an instance may exist.
    #[must_use]
    pub fn has_instance(&self) -> bool {
        self.operation.is_some() && !self.instance_deleted
    }

    /// `Pending → Submitted`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] from any other state.
    pub fn submit(&mut self, operation: Operation) -> Result<(), InvalidTransition> {
        self.transition(RequestStatus::Pending, RequestStatus::Submitted)?;
        self.operation = Some(operation);
        Ok(())
    }

    /// Stores the terminal operation without changing status.
    pub fn record_result(&mut self, operation: Operation) {
        self.result = Some(operation);
    }

    /// `Submitted → Success`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] from any other state.
    pub fn succeed(&mut self) -> Result<(), InvalidTransition> {
        self.transition(RequestStatus::Submitted, RequestStatus::Success)
    }

    /// Moves a non-terminal request to `Error`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] if the request is already terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        if self.status.is_terminal() {
            return Err(self.invalid(RequestStatus::Error));
        }
        self.status = RequestStatus::Error;
        self.message = Some(message.into());
        Ok(())
    }

    pub fn mark_instance_deleted(&mut self) {
        self.instance_deleted = true;
    }

    fn transition(
        &mut self,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<(), InvalidTransition> {
        if self.status != from {
            return Err(self.invalid(to));
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, to: RequestStatus) -> InvalidTransition {
        InvalidTransition {
            instance: self.instance_name.clone(),
            from: self.status,
            to,
        }
    }
}
