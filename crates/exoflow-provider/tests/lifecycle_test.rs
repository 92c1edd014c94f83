mod common;

use common::{FakeConnector, FakeDriver, FakeTransfer, NODE_IP, TestKeys, test_config};
use exoflow_cloud::{NodeState, ProviderContext};
use exoflow_provider::{
    KeypairOverride, KeypairOverrides, ProviderError, ProviderManager, SessionConfig,
    ValidationErrors,
};
use std::sync::Arc;

fn manager(
    keys: &TestKeys,
    driver: Arc<FakeDriver>,
    transfer: Arc<FakeTransfer>,
) -> ProviderManager {
    ProviderManager::with_collaborators(
        test_config(keys.dir.path()),
        Arc::new(FakeConnector { driver }),
        transfer,
    )
}

#[tokio::test]
async fn test_provision_end_to_end() {
    let keys = TestKeys::new();
    let driver = Arc::new(FakeDriver::new());
    let transfer = Arc::new(FakeTransfer::default());
    let manager = manager(&keys, driver.clone(), transfer.clone());

    let output = manager.provision().await.unwrap();

    assert_eq!(output.public_ip, NODE_IP);
    assert_eq!(output.private_ip, NODE_IP);
    assert_eq!(output.private_key_path, keys.path("mgmt-kp.pem"));
    assert_eq!(output.ssh_user, "ubuntu");
    assert_eq!(output.context, ProviderContext::new(NODE_IP));

    // groups first, then keypairs, then the node
    assert_eq!(
        driver.calls(),
        vec![
            "create_security_group:mgmt-sg",
            "authorize:mgmt-sg:TCP:22-22:0.0.0.0/0",
            "create_security_group:agents-sg",
            "authorize:agents-sg:TCP:22-22:0.0.0.0/0",
            "create_key_pair:mgmt-kp",
            "create_key_pair:agents-kp",
            "create_node:exoflow-management-server:img-1:small:mgmt-kp:mgmt-sg",
        ]
    );
    assert_eq!(driver.security_group("mgmt-sg").unwrap().ingress_rules.len(), 1);
    assert!(keys.path("mgmt-kp.pem").exists());
    assert!(keys.path("agents-kp.pem").exists());

    let uploads = transfer.uploads();
    assert_eq!(uploads.len(), 1);
    let (request, session) = &uploads[0];
    assert_eq!(request.host, NODE_IP);
    assert_eq!(request.user, "ubuntu");
    assert_eq!(request.identity_file, keys.path("mgmt-kp.pem"));
    assert_eq!(request.local_path, keys.path("agents-kp.pem"));
    assert_eq!(request.remote_dir, "/home/ubuntu/.ssh");
    assert_eq!(*session, SessionConfig::default());
}

#[tokio::test]
async fn test_provision_reuses_existing_resources() {
    let keys = TestKeys::new();
    let driver = Arc::new(
        FakeDriver::new()
            .with_security_group("mgmt-sg")
            .with_security_group("agents-sg")
            .with_keypair("mgmt-kp")
            .with_keypair("agents-kp"),
    );
    let transfer = Arc::new(FakeTransfer::default());
    let manager = manager(&keys, driver.clone(), transfer.clone());

    manager.provision().await.unwrap();

    assert_eq!(
        driver.calls(),
        vec!["create_node:exoflow-management-server:img-1:small:mgmt-kp:mgmt-sg"]
    );
    assert!(!keys.path("mgmt-kp.pem").exists());
}

#[tokio::test]
async fn test_provision_with_keypair_overrides() {
    let keys = TestKeys::new();
    let driver = Arc::new(FakeDriver::new());
    let transfer = Arc::new(FakeTransfer::default());
    let overrides = KeypairOverrides {
        management: KeypairOverride {
            name: Some("ci-kp".to_string()),
            private_key_target_path: Some(keys.path("ci/ci-kp.pem")),
            ..Default::default()
        },
        ..Default::default()
    };
    let manager = manager(&keys, driver.clone(), transfer.clone()).with_keypair_overrides(overrides);

    let output = manager.provision().await.unwrap();

    assert_eq!(output.private_key_path, keys.path("ci/ci-kp.pem"));
    assert_eq!(
        driver.calls_to("create_node"),
        vec!["create_node:exoflow-management-server:img-1:small:ci-kp:mgmt-sg"]
    );
    assert_eq!(transfer.uploads()[0].0.identity_file, keys.path("ci/ci-kp.pem"));
}

#[tokio::test]
async fn test_provision_uploads_agents_key_from_override_path() {
    let keys = TestKeys::new();
    let driver = Arc::new(FakeDriver::new());
    let transfer = Arc::new(FakeTransfer::default());
    let overrides = KeypairOverrides {
        agents: KeypairOverride {
            private_key_target_path: Some(keys.path("ci/agents-ci.pem")),
            ..Default::default()
        },
        ..Default::default()
    };
    let manager = manager(&keys, driver.clone(), transfer.clone()).with_keypair_overrides(overrides);

    manager.provision().await.unwrap();

    assert!(keys.path("ci/agents-ci.pem").exists());
    assert!(!keys.path("agents-kp.pem").exists());
    let uploads = transfer.uploads();
    assert_eq!(uploads[0].0.local_path, keys.path("ci/agents-ci.pem"));
    assert_eq!(uploads[0].0.identity_file, keys.path("mgmt-kp.pem"));
}

#[tokio::test]
async fn test_provision_rejected_credentials() {
    let keys = TestKeys::new();
    let driver = Arc::new(FakeDriver::new().unauthenticated());
    let transfer = Arc::new(FakeTransfer::default());
    let manager = manager(&keys, driver.clone(), transfer.clone());

    match manager.provision().await {
        Err(ProviderError::Authentication(message)) => assert_eq!(message, "invalid signature"),
        other => panic!("Expected Authentication, got {other:?}"),
    }
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn test_provision_transfer_failure_keeps_resources() {
    let keys = TestKeys::new();
    let driver = Arc::new(FakeDriver::new());
    let transfer = Arc::new(FakeTransfer::failing());
    let manager = manager(&keys, driver.clone(), transfer.clone());

    assert!(matches!(
        manager.provision().await,
        Err(ProviderError::Transfer(_))
    ));
    // created resources stay for the next run to reuse
    assert_eq!(driver.nodes().len(), 1);
    assert!(driver.has_keypair("mgmt-kp"));
}

#[tokio::test]
async fn test_validate_passes_errors_through() {
    let keys = TestKeys::new();
    let manager = manager(
        &keys,
        Arc::new(FakeDriver::new()),
        Arc::new(FakeTransfer::default()),
    );

    assert!(manager.validate(ValidationErrors::new()).is_empty());

    let mut errors = ValidationErrors::new();
    errors.insert("compute.management_server.instance.image".into(), "missing".into());
    assert_eq!(manager.validate(errors.clone()), errors);
}

#[tokio::test]
async fn test_teardown_removes_everything() {
    let keys = TestKeys::new();
    let driver = Arc::new(
        FakeDriver::new()
            .with_node("vm-9", NodeState::Running, "1.2.3.4")
            .with_security_group("mgmt-sg")
            .with_security_group("agents-sg")
            .with_keypair("mgmt-kp")
            .with_keypair("agents-kp"),
    );
    let manager = manager(&keys, driver.clone(), Arc::new(FakeTransfer::default()));

    manager
        .teardown(&ProviderContext::new("1.2.3.4"), false)
        .await
        .unwrap();

    assert_eq!(
        driver.calls(),
        vec![
            "destroy_node:vm-9",
            "delete_key_pair:mgmt-kp",
            "delete_key_pair:agents-kp",
            "delete_security_group:mgmt-sg",
            "delete_security_group:agents-sg",
        ]
    );
    assert!(!driver.nodes()[0].is_live());
}

#[tokio::test]
async fn test_teardown_unknown_ip_is_not_found() {
    let keys = TestKeys::new();
    let driver = Arc::new(FakeDriver::new().with_node("vm-9", NodeState::Running, "5.6.7.8"));
    let manager = manager(&keys, driver.clone(), Arc::new(FakeTransfer::default()));

    assert!(matches!(
        manager.teardown(&ProviderContext::new("1.2.3.4"), true).await,
        Err(ProviderError::NotFound(_))
    ));
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn test_teardown_security_group_failures_are_swallowed() {
    let keys = TestKeys::new();
    let driver = Arc::new(
        FakeDriver::new()
            .with_node("vm-9", NodeState::Running, "1.2.3.4")
            .failing_delete("mgmt-sg")
            .failing_delete("agents-sg"),
    );
    let manager = manager(&keys, driver.clone(), Arc::new(FakeTransfer::default()));

    manager
        .teardown(&ProviderContext::new("1.2.3.4"), false)
        .await
        .unwrap();
    assert_eq!(driver.calls_to("delete_security_group").len(), 2);
}

#[tokio::test]
async fn test_teardown_keypair_failure_is_fatal_by_default() {
    let keys = TestKeys::new();
    let driver = Arc::new(
        FakeDriver::new()
            .with_node("vm-9", NodeState::Running, "1.2.3.4")
            .failing_delete("mgmt-kp"),
    );
    let manager = manager(&keys, driver.clone(), Arc::new(FakeTransfer::default()));

    assert!(
        manager
            .teardown(&ProviderContext::new("1.2.3.4"), false)
            .await
            .is_err()
    );
    assert!(driver.calls_to("delete_security_group").is_empty());
}

#[tokio::test]
async fn test_teardown_best_effort_keypairs_from_config() {
    let keys = TestKeys::new();
    let driver = Arc::new(
        FakeDriver::new()
            .with_node("vm-9", NodeState::Running, "1.2.3.4")
            .failing_delete("mgmt-kp"),
    );
    let mut config = test_config(keys.dir.path());
    config.teardown.best_effort_keypairs = true;
    let manager = ProviderManager::with_collaborators(
        config,
        Arc::new(FakeConnector {
            driver: driver.clone(),
        }),
        Arc::new(FakeTransfer::default()),
    );

    manager
        .teardown(&ProviderContext::new("1.2.3.4"), false)
        .await
        .unwrap();
    assert_eq!(driver.calls_to("delete_key_pair").len(), 2);
    assert_eq!(driver.calls_to("delete_security_group").len(), 2);
}
