//! End-to-end lifecycle scenarios for the emulator supervisor
//!
//! These tests drive real child processes (`/bin/sh` scripts standing in
//! for emulators) through the full start → ready → forward → stop path.

#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use portside_supervisor::{
    LaunchSpec, LifecycleState, MemorySink, Port, ReadinessProbe, StartError, Supervisor,
};

const BANNER: &str = "Server (1.2.3) started";

fn emulator_spec(key: u16, script: &str) -> LaunchSpec {
    LaunchSpec::new("/bin/sh", key)
        .args(["-c", script])
        .readiness(ReadinessProbe::contains(BANNER))
        .start_timeout(Duration::from_secs(10))
}

fn long_running_spec(key: u16) -> LaunchSpec {
    emulator_spec(
        key,
        "echo booting; echo loading; echo 'Server (1.2.3) started'; sleep 30",
    )
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn banner_scenario_resolves_ready_and_forwards_the_rest() {
    let sink = Arc::new(MemorySink::new());
    let supervisor = Supervisor::with_sink(sink.clone());

    let spec = emulator_spec(
        9324,
        "echo booting; echo loading; echo 'Server (1.2.3) started'; echo 'ready for traffic'; sleep 30",
    );
    let key = supervisor.start(spec).await.unwrap();
    assert_eq!(supervisor.state(key), LifecycleState::Ready);

    settle().await;
    let lines = sink.lines();

    // Startup lines were scanned and logged bare.
    assert!(lines.iter().any(|l| l == "booting"));
    assert!(lines.iter().any(|l| l == "loading"));
    // The line after the banner was forwarded by the post-ready reader,
    // not re-scanned: it carries the forwarding prefix.
    assert!(lines.iter().any(|l| l == "[9324] ready for traffic"));

    supervisor.stop(key).unwrap();
}

#[tokio::test]
async fn start_twice_on_one_key_replaces_the_first_instance() {
    let sink = Arc::new(MemorySink::new());
    let supervisor = Supervisor::with_sink(sink.clone());

    supervisor.start(long_running_spec(9324)).await.unwrap();
    let first_pid = supervisor
        .registry()
        .lookup(Port::new(9324))
        .unwrap()
        .pid();

    supervisor.start(long_running_spec(9324)).await.unwrap();
    let second_pid = supervisor
        .registry()
        .lookup(Port::new(9324))
        .unwrap()
        .pid();

    assert_ne!(first_pid, second_pid);
    assert_eq!(supervisor.registry().len(), 1);
    assert!(sink.contains("replacing instance on port 9324"));

    supervisor.stop(Port::new(9324)).unwrap();
}

#[tokio::test]
async fn independent_keys_run_and_stop_independently() {
    let supervisor = Supervisor::with_sink(Arc::new(MemorySink::new()));

    let (a, b) = tokio::join!(
        supervisor.start(long_running_spec(9324)),
        supervisor.start(long_running_spec(9001)),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert_eq!(supervisor.state(a), LifecycleState::Ready);
    assert_eq!(supervisor.state(b), LifecycleState::Ready);

    supervisor.stop(a).unwrap();
    assert_eq!(supervisor.state(a), LifecycleState::Idle);
    assert_eq!(supervisor.state(b), LifecycleState::Ready);

    supervisor.stop(b).unwrap();
}

#[tokio::test]
async fn startup_timeout_fires_on_schedule() {
    let supervisor = Supervisor::with_sink(Arc::new(MemorySink::new()));
    let spec = LaunchSpec::new("/bin/sh", 9324)
        .args(["-c", "echo still warming up; sleep 30"])
        .readiness(ReadinessProbe::contains(BANNER))
        .start_timeout(Duration::from_secs(2));

    let begun = Instant::now();
    let err = supervisor.start(spec).await.unwrap_err();
    let elapsed = begun.elapsed();

    match err {
        StartError::StartupTimeout {
            timeout,
            startup_log,
        } => {
            assert_eq!(timeout, Duration::from_secs(2));
            assert_eq!(startup_log, vec!["still warming up"]);
        }
        other => panic!("expected StartupTimeout, got {other:?}"),
    }

    // Neither early nor indefinitely later.
    assert!(elapsed >= Duration::from_millis(1900), "fired at {elapsed:?}");
    assert!(elapsed < Duration::from_secs(8), "fired at {elapsed:?}");
    assert_eq!(supervisor.state(Port::new(9324)), LifecycleState::Idle);
}

#[tokio::test]
async fn self_exit_after_ready_frees_the_key_and_reports_the_code() {
    let sink = Arc::new(MemorySink::new());
    let supervisor = Supervisor::with_sink(sink.clone());

    let spec = emulator_spec(9324, "echo 'Server (1.2.3) started'; sleep 0.2; exit 7");
    let key = supervisor.start(spec).await.unwrap();
    assert_eq!(supervisor.state(key), LifecycleState::Ready);

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(supervisor.state(key), LifecycleState::Idle);
    assert!(sink.contains("emulator on port 9324 exited with code 7"));

    // The key is free for a fresh start.
    supervisor.start(long_running_spec(9324)).await.unwrap();
    supervisor.stop(key).unwrap();
}

#[tokio::test]
async fn stderr_is_forwarded_too() {
    let sink = Arc::new(MemorySink::new());
    let supervisor = Supervisor::with_sink(sink.clone());

    let spec = emulator_spec(
        9324,
        "echo 'warning: low disk' >&2; echo 'Server (1.2.3) started'; sleep 30",
    );
    let key = supervisor.start(spec).await.unwrap();

    settle().await;
    assert!(sink.contains("[9324] warning: low disk"));

    supervisor.stop(key).unwrap();
}
