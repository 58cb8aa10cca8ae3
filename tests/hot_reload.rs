//! Hot reload of the configuration file.

use std::time::Duration;

use prom_scraper_config::config::load_config_from;
use prom_scraper_config::config::watcher::WatchState;

mod common;

const TIMEOUT: Duration = Duration::from_secs(10);

fn argv(path: &std::path::Path) -> [String; 3] {
    [
        "prom-scraper-config".to_string(),
        "--config_path".to_string(),
        path.display().to_string(),
    ]
}

#[tokio::test]
async fn test_reload_publishes_new_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_config(
        dir.path(),
        "config.yaml",
        "hot_load_config: true\nworker_threads: 4\n",
    );

    let loaded = load_config_from(argv(&path), common::env(&[])).unwrap();
    let watcher = loaded.watcher().expect("hot reload enabled");
    assert_eq!(watcher.state(), WatchState::Watching);
    assert_eq!(watcher.path(), path);

    let mut updates = loaded.live().subscribe();
    common::replace_atomically(&path, "hot_load_config: true\nworker_threads: 12\n");

    tokio::time::timeout(TIMEOUT, updates.changed())
        .await
        .expect("reload within timeout")
        .unwrap();
    let reloaded = common::wait_until(TIMEOUT, || loaded.snapshot().worker_threads == 12).await;
    assert!(reloaded);
    assert!(loaded.live().version() >= 1);

    // Derived values are recomputed on reload.
    assert_eq!(loaded.snapshot().emitters, ["telemetry"]);
}

#[tokio::test]
async fn test_invalid_reload_keeps_previous_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_config(
        dir.path(),
        "config.yaml",
        "hot_load_config: true\nworker_threads: 4\n",
    );

    let loaded = load_config_from(argv(&path), common::env(&[])).unwrap();
    let before = loaded.snapshot();

    common::replace_atomically(&path, "hot_load_config: true\nworker_threads: lots\n");
    let rejected = common::wait_until(TIMEOUT, || {
        loaded.watcher().unwrap().failed_reloads() > 0
    })
    .await;
    assert!(rejected, "the broken file should have been read");
    assert_eq!(loaded.live().version(), 0);
    assert_eq!(*loaded.snapshot(), *before);
    assert_eq!(loaded.watcher().unwrap().state(), WatchState::Watching);

    common::replace_atomically(&path, "hot_load_config: true\nworker_threads: 6\n");
    let recovered = common::wait_until(TIMEOUT, || loaded.snapshot().worker_threads == 6).await;
    assert!(recovered, "watching continues after a failed reload");
}

#[tokio::test]
async fn test_empty_document_does_not_publish_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_config(
        dir.path(),
        "config.yaml",
        "hot_load_config: true
emitters: [stdout]
",
    );

    let loaded = load_config_from(argv(&path), common::env(&[])).unwrap();
    let before = loaded.snapshot();

    common::replace_atomically(&path, "");
    let rejected = common::wait_until(TIMEOUT, || {
        loaded.watcher().unwrap().failed_reloads() > 0
    })
    .await;
    assert!(rejected, "the empty file should have been read");
    assert_eq!(loaded.live().version(), 0);
    assert_eq!(*loaded.snapshot(), *before);
    assert!(loaded.snapshot().hot_reload);
}

#[tokio::test]
async fn test_reload_keeps_env_and_host_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_config(
        dir.path(),
        "config.yaml",
        "hot_load_config: true\ncluster_name: a\n",
    );
    let mut args = argv(&path).to_vec();
    args.extend(["--nri_host_id".to_string(), "node-7".to_string()]);
    let env = common::env(&[("WORKER_THREADS", "3")]);

    let loaded = load_config_from(args, env).unwrap();
    common::replace_atomically(&path, "hot_load_config: true\ncluster_name: b\nworker_threads: 9\n");

    let reloaded = common::wait_until(TIMEOUT, || loaded.snapshot().cluster_name == "b").await;
    assert!(reloaded);
    let cfg = loaded.snapshot();
    assert_eq!(cfg.worker_threads, 3, "environment still overrides the file");
    assert_eq!(cfg.host_id, "node-7");
}
