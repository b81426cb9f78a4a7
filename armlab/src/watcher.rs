//! # Config Hot-Reloading
//!
//! [`ConfigWatcher`] watches the directory holding the scene config (editors
//! often replace a file rather than write it in place) and forwards events
//! that touch the config file over a channel. The frame loop drains the
//! channel between ticks through [`ConfigWatcher::changed`], so reloading
//! happens on the loop's thread.
//!
//! The watcher stops when the [`ConfigWatcher`] is dropped.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tracing::{debug, error, info};

pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<()>,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Starts watching `path`.
    ///
    /// # Errors
    ///
    /// If `path` has no file name or the watcher cannot be created or
    /// attached to its directory.
    pub fn start(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .with_context(|| format!("{} does not name a file", path.display()))?
            .to_owned();
        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, events) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            handle_event(result, &file_name, &tx);
        })
        .context("failed to create config watcher")?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", directory.display()))?;

        info!(path = %path.display(), "watching config for changes");
        Ok(Self {
            _watcher: watcher,
            events,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file changed since the last call. Drains every pending
    /// event, so a burst of writes yields one reload.
    #[must_use]
    pub fn changed(&self) -> bool {
        let pending = self.events.try_iter().count();
        if pending > 0 {
            debug!(pending, "config change detected");
        }
        pending > 0
    }
}

fn handle_event(result: notify::Result<Event>, file_name: &std::ffi::OsStr, tx: &Sender<()>) {
    let event = match result {
        Ok(event) => event,
        Err(err) => {
            error!("config watcher error: {err:?}");
            return;
        }
    };
    if !event.kind.is_modify() && !event.kind.is_create() {
        return;
    }
    if event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name))
    {
        // The receiver is gone only while the app shuts down.
        let _ = tx.send(());
    }
}
