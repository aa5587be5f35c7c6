use dockship_engine::error::{ExecError, KubectlError};
use dockship_engine::executor::{CommandExecutor, CommandOutput};
use dockship_engine::{Deletion, Kubectl};
use mockall::mock;
use mockall::predicate::eq;
use std::path::Path;

mock! {
    Executor {}

    impl CommandExecutor for Executor {
        async fn run(&self, args: &[String]) -> Result<CommandOutput, ExecError>;
    }
}

fn strings(a: &[&str]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

#[tokio::test]
async fn create_configmap_passes_literals() {
    let mut mock = MockExecutor::new();
    mock.expect_run()
        .with(eq(strings(&[
            "create",
            "configmap",
            "orders-config",
            "--from-literal=db_host=db.internal",
            "--from-literal=replicas=3",
        ])))
        .times(1)
        .returning(|_| Ok(CommandOutput::ok("configmap/orders-config created\n")));

    let kubectl = Kubectl::with_executor(mock);
    kubectl
        .create_configmap(
            "orders-config",
            [("db_host", "db.internal"), ("replicas", "3")],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_configmap_not_found_is_success() {
    let mut mock = MockExecutor::new();
    mock.expect_run()
        .with(eq(strings(&["delete", "configmap", "orders-config"])))
        .returning(|_| {
            Ok(CommandOutput::failed(
                "Error from server (NotFound): configmaps \"orders-config\" not found\n",
            ))
        });

    let kubectl = Kubectl::with_executor(mock);
    assert_eq!(
        kubectl.delete_configmap("orders-config").await.unwrap(),
        Deletion::NotFound
    );
}

#[tokio::test]
async fn delete_deployment_other_failure_propagates() {
    let mut mock = MockExecutor::new();
    mock.expect_run().returning(|_| {
        Ok(CommandOutput::failed(
            "Error from server (Forbidden): deployments.apps \"orders\" is forbidden\n",
        ))
    });

    let kubectl = Kubectl::with_executor(mock);
    let err = kubectl.delete_deployment("orders").await.unwrap_err();
    assert!(matches!(err, KubectlError::CommandFailed { .. }));
}

#[tokio::test]
async fn delete_deployment_success_is_deleted() {
    let mut mock = MockExecutor::new();
    mock.expect_run()
        .with(eq(strings(&["delete", "deployment", "orders"])))
        .returning(|_| Ok(CommandOutput::ok("deployment.apps \"orders\" deleted\n")));

    let kubectl = Kubectl::with_executor(mock);
    assert_eq!(
        kubectl.delete_deployment("orders").await.unwrap(),
        Deletion::Deleted
    );
}

#[tokio::test]
async fn apply_failure_is_command_failed() {
    let mut mock = MockExecutor::new();
    mock.expect_run()
        .with(eq(strings(&["apply", "-f", "/stage/services/svc.yaml"])))
        .returning(|_| Ok(CommandOutput::failed("error: invalid manifest\n")));

    let kubectl = Kubectl::with_executor(mock);
    let err = kubectl
        .apply(Path::new("/stage/services/svc.yaml"))
        .await
        .unwrap_err();

    match err {
        KubectlError::CommandFailed { args, stderr } => {
            assert_eq!(args[0], "apply");
            assert!(stderr.contains("invalid manifest"));
        }
        other => panic!("expected CommandFailed, got: {other}"),
    }
}

#[tokio::test]
async fn create_from_manifest() {
    let mut mock = MockExecutor::new();
    mock.expect_run()
        .with(eq(strings(&["create", "-f", "/stage/deployments/web.yaml"])))
        .times(1)
        .returning(|_| Ok(CommandOutput::ok("deployment.apps/web created\n")));

    let kubectl = Kubectl::with_executor(mock);
    kubectl
        .create(Path::new("/stage/deployments/web.yaml"))
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_kubectl_is_exec_error() {
    let mut mock = MockExecutor::new();
    mock.expect_run().returning(|_| {
        Err(ExecError::NotFound {
            program: "kubectl".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    });

    let kubectl = Kubectl::with_executor(mock);
    assert!(matches!(
        kubectl.client_version().await,
        Err(KubectlError::Exec { .. })
    ));
}
