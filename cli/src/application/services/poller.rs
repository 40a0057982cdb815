//! Polls long-running backend operations to completion.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use crate::application::ports::ComputeGateway;
use crate::domain::backoff::BackoffState;
use crate::domain::error::GatewayError;
use crate::domain::operation::Operation;

/// Polls `operation` until it is done.
///
/// An operation that is already done is returned without any gateway call.
/// Otherwise it is fetched right away, and the backoff sleep only runs
/// between fetches that still report it unfinished. Zonal operations are
/// fetched through their zone, others globally.
///
/// # Errors
///
/// Gateway errors propagate unchanged.
pub async fn await_operation(
    gateway: &impl ComputeGateway,
    project: &str,
    operation: Operation,
    polling_interval: Duration,
) -> Result<Operation, GatewayError> {
    if operation.is_done() {
        return Ok(operation);
    }

    let mut backoff = BackoffState::new(polling_interval);
    let mut current = fetch(gateway, project, &operation).await?;

    while !current.is_done() {
        let delay = backoff.next_delay(&mut rand::rng());
        tracing::debug!(
            operation = %current.name,
            attempt = backoff.attempt(),
            delay_ms = delay.as_millis(),
            "operation not done, sleeping"
        );
        tokio::time::sleep(delay).await;
        current = fetch(gateway, project, &current).await?;
    }

    Ok(current)
}

async fn fetch(
    gateway: &impl ComputeGateway,
    project: &str,
    operation: &Operation,
) -> Result<Operation, GatewayError> {
    gateway
        .get_operation(project, &operation.name, operation.zone_name())
        .await
}
