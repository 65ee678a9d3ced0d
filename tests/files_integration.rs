use folder_slideshow::config::Configuration;
use folder_slideshow::events::InventoryEvent;
use folder_slideshow::tasks::files;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn next_event(rx: &mut mpsc::Receiver<InventoryEvent>) -> InventoryEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for inventory event")
        .expect("files task closed the channel")
}

async fn wait_for_added(rx: &mut mpsc::Receiver<InventoryEvent>, path: &Path) {
    loop {
        if let InventoryEvent::PhotoAdded(info) = next_event(rx).await {
            if info.path == path {
                return;
            }
        }
    }
}

async fn wait_for_removed(rx: &mut mpsc::Receiver<InventoryEvent>, path: &Path) {
    loop {
        if let InventoryEvent::PhotoRemoved(p) = next_event(rx).await {
            if p == path {
                return;
            }
        }
    }
}

fn config_for(folder: &Path) -> Configuration {
    Configuration {
        folder_path: folder.to_path_buf(),
        ..Configuration::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn startup_scan_emits_top_level_images_only() {
    let tmp = tempdir().unwrap();
    let folder = tmp.path().join("frames");
    fs::create_dir_all(folder.join("nested")).unwrap();

    fs::write(folder.join("a.jpg"), b"x").unwrap();
    fs::write(folder.join("b.PNG"), b"x").unwrap();
    fs::write(folder.join("nested").join("c.jpeg"), b"x").unwrap();
    fs::write(folder.join("notes.txt"), b"x").unwrap();

    let (inv_tx, mut inv_rx) = mpsc::channel::<InventoryEvent>(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(files::run(config_for(&folder), inv_tx, cancel.clone()));

    let mut added: Vec<PathBuf> = Vec::new();
    while added.len() < 2 {
        if let InventoryEvent::PhotoAdded(info) = next_event(&mut inv_rx).await {
            added.push(info.path);
        }
    }

    let mut names: Vec<String> = added
        .into_iter()
        .map(|p| p.strip_prefix(&folder).unwrap().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.jpg".to_string(), "b.PNG".to_string()]);

    // Nothing else should follow: the nested image and the text file are ignored.
    let extra = tokio::time::timeout(Duration::from_millis(300), inv_rx.recv()).await;
    assert!(extra.is_err(), "unexpected event: {extra:?}");

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn created_and_deleted_images_are_reported() {
    let tmp = tempdir().unwrap();
    let folder = tmp.path().to_path_buf();
    let seed = folder.join("seed.jpg");
    fs::write(&seed, b"x").unwrap();

    let (inv_tx, mut inv_rx) = mpsc::channel::<InventoryEvent>(16);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(files::run(config_for(&folder), inv_tx, cancel.clone()));

    // The watch is live before the startup scan reports anything.
    wait_for_added(&mut inv_rx, &seed).await;

    let fresh = folder.join("fresh.png");
    fs::write(&fresh, b"x").unwrap();
    wait_for_added(&mut inv_rx, &fresh).await;

    fs::remove_file(&fresh).unwrap();
    wait_for_removed(&mut inv_rx, &fresh).await;

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exits_when_receiver_is_dropped() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("a.jpg"), b"x").unwrap();

    let (inv_tx, inv_rx) = mpsc::channel::<InventoryEvent>(1);
    drop(inv_rx);
    let cancel = CancellationToken::new();

    let res = tokio::time::timeout(
        Duration::from_secs(5),
        files::run(config_for(tmp.path()), inv_tx, cancel),
    )
    .await
    .expect("files task did not stop");
    assert!(res.is_ok());
}
