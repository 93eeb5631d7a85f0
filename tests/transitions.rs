// ABOUTME: Tests for launch state transitions.
// ABOUTME: Verifies transition methods exist and return correct state types.

use conducto::launch::{Active, Launch, Planned, Ready, Registered, Submitted};

/// Verifies the type signatures of all transition methods compile correctly,
/// so the state machine is wired up at compile time.
#[test]
fn transition_type_signatures_compile() {
    use conducto::api::{ControlPlane, TokenSource};
    use conducto::launch::LaunchError;
    use conducto::platform::DriveCache;
    use conducto::runtime::{ContainerOps, ImageOps, NetworkOps};

    // Never called; it only has to compile.
    #[allow(dead_code)]
    async fn check_signatures<A, T, R>(
        launch: Launch<Ready>,
        api: &A,
        tokens: &T,
        runtime: &R,
        drives: &DriveCache,
    ) where
        A: ControlPlane,
        T: TokenSource,
        R: ContainerOps + NetworkOps + ImageOps,
    {
        let planned: Result<Launch<Planned>, LaunchError> = launch.plan(drives).await;
        let registered: Result<Launch<Registered>, LaunchError> =
            planned.unwrap().register(tokens, api).await;
        let submitted: Result<Launch<Submitted>, LaunchError> = registered
            .unwrap()
            .deploy_local(api, runtime)
            .await;
        let active: Result<Launch<Active>, LaunchError> =
            submitted.unwrap().verify(api, runtime).await;
        let _id = active.unwrap().id().clone();
    }
}

/// The cloud path ends in the same terminal state without a container.
#[test]
fn cloud_path_signature_compiles() {
    use conducto::api::ControlPlane;
    use conducto::launch::LaunchError;

    #[allow(dead_code)]
    async fn check_cloud<A: ControlPlane>(
        registered: Launch<Registered>,
        api: &A,
    ) -> Result<Launch<Active>, LaunchError> {
        registered.deploy_cloud(api).await
    }
}
