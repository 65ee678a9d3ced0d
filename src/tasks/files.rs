use crate::config::Configuration;
use crate::events::InventoryEvent;
use crate::scan::{is_supported_image, photo_info, scan_folder};
use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher, recommended_watcher};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, Sender};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use tracing::{debug, error, info};

#[instrument(
    skip(to_slideshow, cancel),
    fields(folder = %cfg.folder_path.display())
)]
pub async fn run(
    cfg: Configuration,
    to_slideshow: Sender<InventoryEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    // 1) Bridge notify callback -> async channel. The watch is registered
    //    before the scan so files landing in between are not lost; the queue
    //    drops the resulting duplicates.
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Result<Event>>(128);
    let mut watcher = recommended_watcher(move |res| {
        let _ = watch_tx.blocking_send(res);
    })
    .context("failed to create folder watcher")?;
    watcher
        .watch(&cfg.folder_path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", cfg.folder_path.display()))?;
    match cfg.folder_path.canonicalize() {
        Ok(abs) => info!(watching = %abs.display(), "notify watcher initialized"),
        Err(_) => info!(watching = %cfg.folder_path.display(), "notify watcher initialized"),
    }

    // 2) Startup scan (non-recursive, oldest first)
    let initial = scan_folder(&cfg.folder_path);
    let discovered = initial.len();
    for info in initial {
        debug!(action = "startup_add", path = %info.path.display());
        if to_slideshow
            .send(InventoryEvent::PhotoAdded(info))
            .await
            .is_err()
        {
            return Ok(());
        }
    }
    info!(discovered, "startup scan complete");

    // 3) Event loop
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting files task");
                break;
            }

            Some(res) = watch_rx.recv() => match res {
                Ok(event) => {
                    debug!(kind = ?event.kind, paths = ?event.paths, "notify event");
                    let mut closed = false;
                    for inventory in translate(event) {
                        if to_slideshow.send(inventory).await.is_err() {
                            closed = true;
                            break;
                        }
                    }
                    if closed {
                        info!("slideshow gone; exiting files task");
                        break;
                    }
                }
                Err(err) => error!("watch error: {err}"),
            }
        }
    }

    // Unblock a callback stuck on a full channel, then stop the watcher thread.
    drop(watch_rx);
    drop(watcher);
    debug!("folder watcher stopped");
    Ok(())
}

/// Map a raw notify event onto inventory changes for image files.
///
/// Directories and non-image files never produce events.
pub fn translate(event: Event) -> Vec<InventoryEvent> {
    let images = event
        .paths
        .into_iter()
        .filter(|p| is_supported_image(p))
        .collect::<Vec<_>>();
    match event.kind {
        EventKind::Create(CreateKind::File | CreateKind::Any) => added(images),
        EventKind::Remove(RemoveKind::File | RemoveKind::Any) => removed(images),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => removed(images),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => added(images),
        EventKind::Modify(ModifyKind::Name(_)) => {
            // Both/Any/Other: decide per path by existence (macOS reports moves as Any).
            images
                .into_iter()
                .filter_map(|p| {
                    if p.is_file() {
                        Some(InventoryEvent::PhotoAdded(photo_info(&p)))
                    } else if p.exists() {
                        None
                    } else {
                        Some(InventoryEvent::PhotoRemoved(p))
                    }
                })
                .collect()
        }
        _ => {
            debug!(kind = ?event.kind, "fs: ignored");
            Vec::new()
        }
    }
}

fn added(paths: Vec<PathBuf>) -> Vec<InventoryEvent> {
    paths
        .into_iter()
        .filter(|p| p.is_file())
        .map(|p| {
            debug!(path = %p.display(), "fs: add");
            InventoryEvent::PhotoAdded(photo_info(&p))
        })
        .collect()
}

fn removed(paths: Vec<PathBuf>) -> Vec<InventoryEvent> {
    paths
        .into_iter()
        .map(|p| {
            debug!(path = %p.display(), "fs: remove");
            InventoryEvent::PhotoRemoved(p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn event(kind: EventKind, paths: Vec<PathBuf>) -> Event {
        let mut ev = Event::new(kind);
        ev.paths = paths;
        ev
    }

    #[test]
    fn create_of_image_file_is_added() {
        let tmp = tempdir().unwrap();
        let img = tmp.path().join("a.JPG");
        fs::write(&img, b"x").unwrap();
        let out = translate(event(EventKind::Create(CreateKind::File), vec![img.clone()]));
        assert!(matches!(out.as_slice(), [InventoryEvent::PhotoAdded(info)] if info.path == img));
    }

    #[test]
    fn non_images_and_directories_are_ignored() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("folder.png");
        fs::create_dir(&dir).unwrap();
        let txt = tmp.path().join("a.txt");
        fs::write(&txt, b"x").unwrap();

        assert!(translate(event(EventKind::Create(CreateKind::Any), vec![dir.clone()])).is_empty());
        assert!(translate(event(EventKind::Create(CreateKind::File), vec![txt.clone()])).is_empty());
        assert!(translate(event(EventKind::Remove(RemoveKind::File), vec![txt])).is_empty());
        assert!(translate(event(EventKind::Create(CreateKind::Folder), vec![dir])).is_empty());
    }

    #[test]
    fn remove_and_rename_from_are_removed() {
        let gone = PathBuf::from("/nowhere/b.png");
        let out = translate(event(EventKind::Remove(RemoveKind::File), vec![gone.clone()]));
        assert!(matches!(out.as_slice(), [InventoryEvent::PhotoRemoved(p)] if *p == gone));

        let out = translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            vec![gone.clone()],
        ));
        assert!(matches!(out.as_slice(), [InventoryEvent::PhotoRemoved(p)] if *p == gone));
    }

    #[test]
    fn rename_both_removes_old_and_adds_new() {
        let tmp = tempdir().unwrap();
        let old = tmp.path().join("old.png");
        let new = tmp.path().join("new.png");
        fs::write(&new, b"x").unwrap();
        let out = translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            vec![old.clone(), new.clone()],
        ));
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], InventoryEvent::PhotoRemoved(p) if *p == old));
        assert!(matches!(&out[1], InventoryEvent::PhotoAdded(info) if info.path == new));
    }
}
