//! Property-based tests for batch reconciliation.
//!
//! Uses `proptest` to verify that whatever subset of a batch fails, exactly
//! the healthy nodes survive.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use nodefleet_cli::application::{AddNodesRequest, ResourceAdapter};

use crate::fakes::{FakeGateway, Harness, InstanceBehaviour};

fn run_batch(failures: &[bool]) -> (Harness, bool) {
    let mut gateway = FakeGateway::default();
    for (i, failed) in failures.iter().enumerate() {
        if *failed {
            gateway = gateway.with_behaviour(
                &format!("compute-{:02}", i + 1),
                InstanceBehaviour::OperationError("boom".to_string()),
            );
        }
    }
    let h = Harness {
        gateway,
        ..Harness::default()
    };
    let request = AddNodesRequest {
        count: failures.len(),
        hardware_profile: "compute".to_string(),
        software_profile: Some("centos".to_string()),
        ..AddNodesRequest::default()
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime");
    let ok = runtime.block_on(h.adapter().start(&request)).is_ok();
    (h, ok)
}

proptest! {
    /// Committed nodes are exactly the healthy ones; failed ones leave nothing behind.
    #[test]
    fn prop_only_healthy_nodes_survive(failures in prop::collection::vec(any::<bool>(), 1..6)) {
        let (h, ok) = run_batch(&failures);

        let healthy: Vec<String> = failures
            .iter()
            .enumerate()
            .filter(|(_, failed)| !**failed)
            .map(|(i, _)| format!("compute-{:02}", i + 1))
            .collect();

        prop_assert_eq!(ok, !healthy.is_empty());
        prop_assert_eq!(h.repo.committed_names(), healthy.clone());
        prop_assert_eq!(h.registrar.provisioned.borrow().clone(), healthy);
        prop_assert_eq!(
            h.gateway.calls_to("delete_instance").len(),
            failures.iter().filter(|f| **f).count()
        );
        for (i, failed) in failures.iter().enumerate() {
            let name = format!("compute-{:02}", i + 1);
            let expected = if *failed { 0 } else { 3 };
            prop_assert_eq!(h.repo.drive_count(&name), expected, "drives of {}", name);
        }
    }
}
