//! Persistent disk provisioning and catalogue release.

#![allow(clippy::unwrap_used)]

use nodefleet_cli::application::services::disks;
use nodefleet_cli::application::{AddNodesRequest, ResourceAdapter};
use nodefleet_cli::domain::config::ResolvedConfig;
use nodefleet_common::Node;

use crate::fakes::{FakeGateway, FakeRepo, Harness, InstanceBehaviour, adapter_config};

fn config() -> ResolvedConfig {
    adapter_config().validate("default").unwrap()
}

#[tokio::test]
async fn test_data_disks_created_in_ascending_order_without_boot_disk() {
    let gateway = FakeGateway::default();
    let repo = FakeRepo::default();
    let node = Node::new("compute-01", "compute", "centos");

    let specs = disks::provision(&gateway, &repo, &config(), &node, "compute-01")
        .await
        .unwrap();

    assert_eq!(
        gateway.calls_to("create_disk"),
        vec!["compute-01-disk-02", "compute-01-disk-03"]
    );
    let names: Vec<_> = specs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["compute-01-disk-01", "compute-01-disk-02", "compute-01-disk-03"]);
    assert_eq!(specs[0].size_gb, 30);
    assert!(specs[0].source_link.is_none());
    assert_eq!(specs[1].size_gb, 50);
    assert!(specs[1].source_link.as_deref().unwrap().ends_with("/disks/compute-01-disk-02"));
    assert_eq!(specs[2].size_gb, 100);
    // The non-default adapter disk is skipped entirely.
    assert_eq!(repo.drive_count("compute-01"), 3);
}

#[tokio::test]
async fn test_boot_disk_falls_back_to_configured_size() {
    let gateway = FakeGateway::default();
    let repo = FakeRepo::default();
    let node = Node::new("compute-01", "compute", "minimal");

    let specs = disks::provision(&gateway, &repo, &config(), &node, "compute-01")
        .await
        .unwrap();

    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].name, "compute-01-disk-01");
    assert_eq!(specs[0].size_gb, 10);
    assert!(gateway.calls_to("create_disk").is_empty());
}

#[tokio::test]
async fn test_disk_operation_error_aborts() {
    let gateway = FakeGateway::default();
    gateway.disk_error.set(true);
    let repo = FakeRepo::default();
    let node = Node::new("compute-01", "compute", "centos");

    let err = disks::provision(&gateway, &repo, &config(), &node, "compute-01")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Error creating persistent disk [compute-01-disk-02]"));
    assert_eq!(gateway.calls_to("create_disk").len(), 1);
    assert!(gateway.calls_to("delete_disk").is_empty());
}

#[tokio::test]
async fn test_failed_disk_deletes_the_disks_created_before_it() {
    let gateway = FakeGateway::default();
    gateway
        .failing_disks
        .borrow_mut()
        .insert("compute-01-disk-03".to_string());
    let repo = FakeRepo::default();
    let node = Node::new("compute-01", "compute", "centos");

    let err = disks::provision(&gateway, &repo, &config(), &node, "compute-01")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("[compute-01-disk-03]"));
    assert_eq!(gateway.calls_to("delete_disk"), vec!["compute-01-disk-02"]);
}

#[tokio::test]
async fn test_cleanup_delete_failure_keeps_original_error() {
    let gateway = FakeGateway::default();
    gateway
        .failing_disks
        .borrow_mut()
        .insert("compute-01-disk-03".to_string());
    gateway.delete_error.set(true);
    let repo = FakeRepo::default();
    let node = Node::new("compute-01", "compute", "centos");

    let err = disks::provision(&gateway, &repo, &config(), &node, "compute-01")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Error creating persistent disk [compute-01-disk-03]"));
    assert_eq!(gateway.calls_to("delete_disk").len(), 1);
}

#[tokio::test]
async fn test_release_removes_only_default_adapter_disks() {
    let gateway = FakeGateway::default();
    let repo = FakeRepo::default();
    let node = Node::new("compute-01", "compute", "centos");
    disks::provision(&gateway, &repo, &config(), &node, "compute-01")
        .await
        .unwrap();

    disks::release(&repo, &node).await.unwrap();

    assert_eq!(repo.drive_count("compute-01"), 0);
    assert_eq!(repo.released.borrow().len(), 3);
}

#[tokio::test]
async fn test_batch_attaches_created_disks_to_the_instance() {
    let h = Harness::default();
    let request = AddNodesRequest {
        count: 1,
        hardware_profile: "compute".to_string(),
        software_profile: Some("centos".to_string()),
        ..AddNodesRequest::default()
    };

    h.adapter().start(&request).await.unwrap();

    let (_, spec) = h.gateway.launched.borrow()[0].clone();
    assert_eq!(spec.boot_disk().unwrap().size_gb, 30);
    assert_eq!(spec.data_disks().len(), 2);
    assert_eq!(h.repo.drive_count("compute-01"), 3);
}

#[tokio::test]
async fn test_rolled_back_node_releases_its_disks() {
    let h = Harness {
        gateway: FakeGateway::default()
            .with_behaviour("compute-01", InstanceBehaviour::OperationError("boom".into())),
        ..Harness::default()
    };
    let request = AddNodesRequest {
        count: 2,
        hardware_profile: "compute".to_string(),
        software_profile: Some("centos".to_string()),
        ..AddNodesRequest::default()
    };

    h.adapter().start(&request).await.unwrap();

    assert_eq!(h.repo.drive_count("compute-01"), 0);
    assert_eq!(h.repo.drive_count("compute-02"), 3);
}

#[tokio::test]
async fn test_rejected_instance_deletes_its_unattached_disks() {
    let h = Harness {
        gateway: FakeGateway::default()
            .with_behaviour("compute-02", InstanceBehaviour::RejectCreate),
        ..Harness::default()
    };
    let request = AddNodesRequest {
        count: 2,
        hardware_profile: "compute".to_string(),
        software_profile: Some("centos".to_string()),
        ..AddNodesRequest::default()
    };

    h.adapter().start(&request).await.unwrap_err();

    // compute-01's disks go with its instance; only compute-02's were never attached.
    assert_eq!(
        h.gateway.calls_to("delete_disk"),
        vec!["compute-02-disk-02", "compute-02-disk-03"]
    );
    assert_eq!(h.gateway.calls_to("delete_instance").len(), 1);
    assert!(h.repo.committed_names().is_empty());
}
