// ABOUTME: Pre-flight rejection tests: bad roots and unavailable drives
// ABOUTME: abort the launch before any external resource is created.

mod support;

use conducto::config::LaunchConfig;
use conducto::launch::{Launch, LaunchError, LaunchErrorKind, LaunchRequest};
use conducto::pipeline::{ImageSource, ImageStore, Node, Program};
use conducto::platform::{DriveCache, HostPlatform};
use conducto::types::Drive;
use std::collections::{BTreeSet, HashMap};

fn config() -> LaunchConfig {
    LaunchConfig::from_parts(
        "/home/u/.conducto".into(),
        "/home/u/.conducto/logs".into(),
        HashMap::new(),
    )
}

fn windows_program(context: &str) -> Program {
    let mut images = ImageStore::new();
    let idx = images.insert(ImageSource {
        context: Some(context.to_string()),
        ..Default::default()
    });
    let mut root = Node::root();
    root.image = Some(idx);
    Program::new(root, images)
}

#[tokio::test]
async fn non_root_program_is_rejected() {
    let drives = DriveCache::new();
    drives.prime(BTreeSet::new());

    let program = Program::new(Node::named("not-root"), ImageStore::new());
    let launch = Launch::new(config(), HostPlatform::Unix, LaunchRequest::local(program));

    let err = launch.plan(&drives).await.unwrap_err();
    assert!(matches!(err, LaunchError::NotARoot { .. }));
    assert_eq!(err.kind(), LaunchErrorKind::Preflight);
}

#[tokio::test]
async fn unavailable_drive_aborts_before_registration() {
    let drives = DriveCache::new();
    let mut available = BTreeSet::new();
    available.insert(Drive::new('c').unwrap());
    drives.prime(available);

    let launch = Launch::new(
        config(),
        HostPlatform::Windows,
        LaunchRequest::local(windows_program("d:\\work\\repo")),
    );

    let err = launch.plan(&drives).await.unwrap_err();
    match &err {
        LaunchError::DriveUnavailable { drive } => assert_eq!(drive.letter(), 'd'),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), LaunchErrorKind::Preflight);
}

#[tokio::test]
async fn available_drive_passes_and_paths_are_translated() {
    let drives = DriveCache::new();
    let mut available = BTreeSet::new();
    available.insert(Drive::new('d').unwrap());
    drives.prime(available);

    let launch = Launch::new(
        config(),
        HostPlatform::Windows,
        LaunchRequest::local(windows_program("d:\\work\\repo")),
    );

    let planned = launch.plan(&drives).await.unwrap();
    let letters: Vec<char> = planned.required_drives().iter().map(|d| d.letter()).collect();
    assert_eq!(letters, vec!['d']);
    assert!(planned.serialization().contains("/d/work/repo"));
}

#[tokio::test]
async fn untranslatable_path_is_a_preflight_error() {
    let drives = DriveCache::new();
    drives.prime(BTreeSet::new());

    let launch = Launch::new(
        config(),
        HostPlatform::Windows,
        LaunchRequest::local(windows_program("relative\\path")),
    );

    let err = launch.plan(&drives).await.unwrap_err();
    assert!(matches!(err, LaunchError::Translate { .. }));
    assert_eq!(err.kind(), LaunchErrorKind::Preflight);
}
